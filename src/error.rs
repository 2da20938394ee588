//! Error types for the vocabulary core
//!
//! File-level and session-level failures share one enum; line-level parse
//! failures are collected in ingestion reports instead of aborting.

use serde::Serialize;
use thiserror::Error;

use crate::model::Level;

/// Main error type for kelime_core
#[derive(Error, Debug)]
pub enum Error {
    /// Declared upload format is not one we can extract
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Document container could not be opened or decoded
    #[error("Corrupt file: {0}")]
    CorruptFile(String),

    /// No vocabulary stored at the requested level
    #[error("No words available at level {0}")]
    EmptyPool(Level),

    /// Action attempted after the last question was answered
    #[error("Quiz session is already finished")]
    SessionFinished,

    /// Action attempted before the pool was built
    #[error("Quiz session has not been started")]
    SessionNotStarted,

    #[error("Quiz session has already been started")]
    SessionAlreadyStarted,

    /// Summary requested while questions remain
    #[error("Quiz session is still in progress")]
    SessionNotFinished,

    #[error("Invalid CEFR level: {0}")]
    InvalidLevel(String),

    #[error("Invalid quiz direction: {0}")]
    InvalidDirection(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A stored row could not be decoded
    #[error("Corrupt stored record: {0}")]
    CorruptRecord(String),

    #[error("Store lock poisoned: {0}")]
    Lock(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience Result type using kelime_core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Why a line could not be read as a word pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    NoSeparator,
    AmbiguousSeparator,
    EmptySource,
    EmptyTranslations,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            MalformedReason::NoSeparator => "no ' - ' separator found",
            MalformedReason::AmbiguousSeparator => "more than one ' - ' separator",
            MalformedReason::EmptySource => "source word is empty",
            MalformedReason::EmptyTranslations => "no translations after the separator",
        };
        f.write_str(text)
    }
}

/// A line rejected by the pair parser.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("line {line_number}: {reason} ({line:?})")]
pub struct MalformedLine {
    pub line_number: usize,
    pub line: String,
    pub reason: MalformedReason,
}
