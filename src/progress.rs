//! Progress tracking - finished quiz results and statistics

use chrono::{DateTime, Duration, NaiveTime, SecondsFormat, Utc};
use rusqlite::{params_from_iter, types::Value};
use serde::Serialize;

use crate::db::SqliteStore;
use crate::error::{Error, Result};
use crate::model::{Direction, Level};
use crate::quiz::{OutcomeRecord, QuizSession};

/// Time window used when browsing results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultWindow {
    #[default]
    All,
    Today,
    Yesterday,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
}

impl ResultWindow {
    /// Inclusive lower / exclusive upper bound relative to `now`
    pub fn bounds(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        match self {
            ResultWindow::All => (None, None),
            ResultWindow::Today => (Some(midnight), None),
            ResultWindow::Yesterday => (Some(midnight - Duration::days(1)), Some(midnight)),
            ResultWindow::Week => (Some(midnight - Duration::days(7)), None),
            ResultWindow::Month => (Some(midnight - Duration::days(30)), None),
        }
    }
}

impl std::str::FromStr for ResultWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ResultWindow::All),
            "today" => Ok(ResultWindow::Today),
            "yesterday" => Ok(ResultWindow::Yesterday),
            "week" => Ok(ResultWindow::Week),
            "month" => Ok(ResultWindow::Month),
            other => Err(Error::Config(format!("unknown result window '{}'", other))),
        }
    }
}

/// Filter for browsing stored results
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    pub level: Option<Level>,
    pub learner_id: Option<i64>,
    pub window: ResultWindow,
    /// Defaults to 100 rows
    pub limit: Option<usize>,
}

/// A stored quiz result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResult {
    pub id: i64,
    pub learner_id: i64,
    pub level: Level,
    pub direction: Direction,
    pub total: usize,
    pub score: usize,
    pub skipped: usize,
    pub no_answer: usize,
    pub wrong: usize,
    pub outcomes: Vec<OutcomeRecord>,
    pub finished_at: DateTime<Utc>,
}

impl QuizResult {
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.score * 100 / self.total
        }
    }
}

/// Aggregate over a set of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultStats {
    pub sessions: i64,
    pub questions: i64,
    pub correct: i64,
    pub accuracy_percent: f64,
}

/// Build the WHERE clause shared by listing and stats
fn filter_clause(filter: &ResultFilter, now: DateTime<Utc>) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(level) = filter.level {
        conditions.push("level = ?");
        values.push(Value::Text(level.as_str().to_string()));
    }
    if let Some(learner_id) = filter.learner_id {
        conditions.push("learner_id = ?");
        values.push(Value::Integer(learner_id));
    }
    let (from, until) = filter.window.bounds(now);
    if let Some(from) = from {
        conditions.push("finished_at >= ?");
        values.push(Value::Text(timestamp(from)));
    }
    if let Some(until) = until {
        conditions.push("finished_at < ?");
        values.push(Value::Text(timestamp(until)));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    (clause, values)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl SqliteStore {
    /// Persist a finished session for `learner_id`, returning the row id
    pub fn save_result(&self, learner_id: i64, session: &QuizSession) -> Result<i64> {
        self.save_result_at(learner_id, session, Utc::now())
    }

    pub fn save_result_at(&self, learner_id: i64, session: &QuizSession, finished_at: DateTime<Utc>) -> Result<i64> {
        let summary = session.finish_summary()?;
        let outcomes = serde_json::to_string(&summary.outcomes)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO quiz_results (learner_id, level, direction, total, score, skipped, no_answer, wrong, outcomes, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                learner_id,
                summary.level.as_str(),
                summary.direction.as_str(),
                summary.total as i64,
                summary.score as i64,
                summary.skipped as i64,
                summary.no_answer as i64,
                summary.wrong as i64,
                outcomes,
                timestamp(finished_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Stored results matching `filter`, newest first
    pub fn list_results(&self, filter: &ResultFilter) -> Result<Vec<QuizResult>> {
        self.list_results_at(filter, Utc::now())
    }

    pub fn list_results_at(&self, filter: &ResultFilter, now: DateTime<Utc>) -> Result<Vec<QuizResult>> {
        let (clause, mut values) = filter_clause(filter, now);
        values.push(Value::Integer(filter.limit.unwrap_or(100) as i64));
        let query = format!(
            "SELECT id, learner_id, level, direction, total, score, skipped, no_answer, wrong, outcomes, finished_at
             FROM quiz_results{} ORDER BY finished_at DESC, id DESC LIMIT ?",
            clause
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    [
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                        row.get::<_, i64>(8)?,
                    ],
                    row.get::<_, String>(9)?,
                    row.get::<_, String>(10)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, learner_id, level, direction, counts, outcomes, finished_at)| -> Result<QuizResult> {
                let [total, score, skipped, no_answer, wrong] = counts.map(|n| n.max(0) as usize);
                Ok(QuizResult {
                    id,
                    learner_id,
                    level: level.parse()?,
                    direction: direction.parse()?,
                    total,
                    score,
                    skipped,
                    no_answer,
                    wrong,
                    outcomes: serde_json::from_str(&outcomes)?,
                    finished_at: DateTime::parse_from_rfc3339(&finished_at)
                        .map_err(|e| {
                            Error::CorruptRecord(format!("result {} has bad timestamp '{}': {}", id, finished_at, e))
                        })?
                        .with_timezone(&Utc),
                })
            })
            .collect()
    }

    /// Totals over results matching `filter` (the row limit is ignored)
    pub fn result_stats(&self, filter: &ResultFilter) -> Result<ResultStats> {
        let (clause, values) = filter_clause(filter, Utc::now());
        let query = format!(
            "SELECT COUNT(*), COALESCE(SUM(total), 0), COALESCE(SUM(score), 0) FROM quiz_results{}",
            clause
        );

        let conn = self.conn()?;
        let stats = conn.query_row(&query, params_from_iter(values), |row| {
            let sessions: i64 = row.get(0)?;
            let questions: i64 = row.get(1)?;
            let correct: i64 = row.get(2)?;
            let accuracy = if questions > 0 {
                (correct as f64 / questions as f64) * 100.0
            } else {
                0.0
            };
            Ok(ResultStats {
                sessions,
                questions,
                correct,
                accuracy_percent: accuracy,
            })
        })?;
        Ok(stats)
    }
}
