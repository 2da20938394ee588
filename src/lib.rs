//! Kelime Core - Turkish-Uzbek vocabulary ingestion and quiz engine
//!
//! Turns uploaded word lists into a deduplicated, level-partitioned SQLite
//! vocabulary and runs conversational quiz sessions over it. The messaging
//! bot drives everything through these functions (or the Python module built
//! with the `python` feature).

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fuzzy;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod parser;
pub mod progress;
pub mod quiz;
pub mod store;

#[cfg(feature = "python")]
mod python;

pub use config::Settings;
pub use db::{init_database, LevelCount, SqliteStore};
pub use error::{Error, MalformedLine, MalformedReason, Result};
pub use extract::{extract_file, extract_lines, DocumentFormat, ExtractedLine};
pub use fuzzy::{closest_match, NearMiss};
pub use ingest::{ingest, ingest_document, IngestReport};
pub use model::{normalize, Direction, Level, WordEntry};
pub use parser::{parse_line, WordPair};
pub use progress::{QuizResult, ResultFilter, ResultStats, ResultWindow};
pub use quiz::{
    start_session, start_session_with, OutcomeKind, OutcomeRecord, Progress, QuizSession, SessionOptions,
    SessionState, SessionSummary,
};
pub use store::{UpsertOutcome, VocabularyStore};
