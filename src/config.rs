//! Runtime settings from the environment (and an optional `.env` file)

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::fuzzy::DEFAULT_NEAR_MISS_THRESHOLD;
use crate::quiz::SessionOptions;

const DEFAULT_DB_PATH: &str = "./kelime.db";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_path: PathBuf,
    /// `tracing` filter directive
    pub log_level: String,
    pub near_miss_threshold: f64,
    pub default_question_limit: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: "info".to_string(),
            near_miss_threshold: DEFAULT_NEAR_MISS_THRESHOLD,
            default_question_limit: None,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self> {
        // A missing .env file is normal in production
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Settings::default();

        if let Some(path) = get("KELIME_DB_PATH") {
            settings.db_path = PathBuf::from(path);
        } else if let Some(url) = get("DB_URL") {
            settings.db_path = PathBuf::from(strip_sqlite_scheme(&url));
        }

        if let Some(level) = get("KELIME_LOG") {
            settings.log_level = level;
        }

        if let Some(raw) = get("KELIME_NEAR_MISS_THRESHOLD") {
            let threshold: f64 = raw
                .parse()
                .map_err(|_| Error::Config(format!("KELIME_NEAR_MISS_THRESHOLD is not a number: {}", raw)))?;
            if !(0.0..=1.0).contains(&threshold) {
                return Err(Error::Config(format!(
                    "KELIME_NEAR_MISS_THRESHOLD must be between 0 and 1, got {}",
                    threshold
                )));
            }
            settings.near_miss_threshold = threshold;
        }

        if let Some(raw) = get("KELIME_QUESTION_LIMIT") {
            let limit = raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::Config(format!("KELIME_QUESTION_LIMIT must be a positive integer, got {}", raw)))?;
            settings.default_question_limit = Some(limit);
        }

        Ok(settings)
    }

    /// Session options seeded from these settings
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            limit: self.default_question_limit,
            near_miss_threshold: self.near_miss_threshold,
        }
    }
}

/// `sqlite+aiosqlite:///./bot.db` -> `./bot.db`
fn strip_sqlite_scheme(url: &str) -> &str {
    match url.split_once(":///") {
        Some((scheme, path)) if scheme.starts_with("sqlite") => path,
        _ => url,
    }
}
