//! Python bindings used by the bot process
//!
//! Structured results cross the boundary as JSON strings.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::db::SqliteStore;
use crate::error::Error;
use crate::extract::{DocumentFormat, ExtractedLine};
use crate::ingest::{ingest, ingest_document};
use crate::logging::init_tracing;
use crate::model::Level;
use crate::progress::{ResultFilter, ResultWindow};
use crate::quiz::{start_session_with, QuizSession, SessionOptions};

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        match &err {
            Error::UnsupportedFormat(_)
            | Error::CorruptFile(_)
            | Error::EmptyPool(_)
            | Error::InvalidLevel(_)
            | Error::InvalidDirection(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| Error::from(e).into())
}

/// Vocabulary store handle
#[pyclass(name = "Vocabulary")]
pub struct PyVocabulary {
    store: Arc<SqliteStore>,
    options: SessionOptions,
}

#[pymethods]
impl PyVocabulary {
    #[new]
    #[pyo3(signature = (db_path=None))]
    fn new(db_path: Option<&str>) -> PyResult<Self> {
        let settings = Settings::from_env()?;
        let path = db_path.map(PathBuf::from).unwrap_or_else(|| settings.db_path.clone());
        Ok(Self {
            store: Arc::new(SqliteStore::open(path)?),
            options: settings.session_options(),
        })
    }

    /// Ingest an uploaded document; the format comes from `file_name`
    #[pyo3(signature = (file_name, data, level, topic=None))]
    fn ingest_file(&self, file_name: &str, data: &[u8], level: &str, topic: Option<&str>) -> PyResult<String> {
        let format = DocumentFormat::detect(file_name)?;
        let report = ingest_document(self.store.as_ref(), data, format, level.parse()?, topic)?;
        to_json(&report)
    }

    #[pyo3(signature = (lines, level, topic=None))]
    fn ingest_lines(&self, lines: Vec<String>, level: &str, topic: Option<&str>) -> PyResult<String> {
        let report = ingest(self.store.as_ref(), ExtractedLine::numbered(lines), level.parse()?, topic)?;
        to_json(&report)
    }

    #[pyo3(signature = (level, direction, limit=None))]
    fn start_session(&self, level: &str, direction: &str, limit: Option<usize>) -> PyResult<PyQuizSession> {
        let mut options = self.options;
        if limit.is_some() {
            options.limit = limit;
        }
        let session = start_session_with(self.store.as_ref(), level.parse()?, direction.parse()?, options)?;
        Ok(PyQuizSession { inner: session })
    }

    fn level_counts(&self) -> PyResult<Vec<(String, i64)>> {
        Ok(self
            .store
            .level_counts()?
            .into_iter()
            .map(|c| (c.level.to_string(), c.word_count))
            .collect())
    }

    fn save_result(&self, learner_id: i64, session: PyRef<'_, PyQuizSession>) -> PyResult<i64> {
        Ok(self.store.save_result(learner_id, &session.inner)?)
    }

    #[pyo3(signature = (level=None, window="all", learner_id=None, limit=None))]
    fn list_results(
        &self,
        level: Option<&str>,
        window: &str,
        learner_id: Option<i64>,
        limit: Option<usize>,
    ) -> PyResult<String> {
        let filter = ResultFilter {
            level: level.map(str::parse::<Level>).transpose()?,
            learner_id,
            window: window.parse::<ResultWindow>()?,
            limit,
        };
        to_json(&self.store.list_results(&filter)?)
    }
}

/// One learner's quiz, owned by the bot's per-chat state
#[pyclass(name = "QuizSession")]
pub struct PyQuizSession {
    inner: QuizSession,
}

#[pymethods]
impl PyQuizSession {
    fn prompt(&self) -> Option<String> {
        self.inner.current_prompt()
    }

    fn submit_answer(&mut self, text: &str) -> PyResult<String> {
        to_json(&self.inner.submit_answer(text)?)
    }

    fn skip(&mut self) -> PyResult<String> {
        to_json(&self.inner.skip()?)
    }

    fn no_answer(&mut self) -> PyResult<String> {
        to_json(&self.inner.no_answer()?)
    }

    /// `(state, cursor, total)`
    fn state(&self) -> (&'static str, usize, usize) {
        let progress = self.inner.current_state();
        (progress.state.as_str(), progress.cursor, progress.total)
    }

    fn summary(&self) -> PyResult<String> {
        to_json(&self.inner.finish_summary()?)
    }

    fn __repr__(&self) -> String {
        let progress = self.inner.current_state();
        format!(
            "QuizSession(level='{}', direction='{}', {}/{})",
            self.inner.level(),
            self.inner.direction(),
            progress.cursor,
            progress.total
        )
    }
}

/// Kelime Core Python module
#[pymodule]
fn kelime_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let settings = Settings::from_env()?;
    init_tracing(&settings.log_level);

    m.add_class::<PyVocabulary>()?;
    m.add_class::<PyQuizSession>()?;
    Ok(())
}
