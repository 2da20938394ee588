//! Vocabulary model shared by ingestion and the quiz engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// CEFR proficiency tier partitioning the vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Level {
    pub const ALL: [Level; 6] = [Level::A1, Level::A2, Level::B1, Level::B2, Level::C1, Level::C2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidLevel(s.to_string()))
    }
}

/// Which side of an entry is shown and which side is expected back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Turkish prompt, Uzbek answer
    SourceToTarget,
    /// Uzbek prompt, Turkish answer
    TargetToSource,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::SourceToTarget => "tr_to_uz",
            Direction::TargetToSource => "uz_to_tr",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "tr_to_uz" | "tr_uz" | "source_to_target" => Ok(Direction::SourceToTarget),
            "uz_to_tr" | "uz_tr" | "target_to_source" => Ok(Direction::TargetToSource),
            _ => Err(Error::InvalidDirection(s.to_string())),
        }
    }
}

/// One vocabulary item at a level.
///
/// `source_text` keeps the casing it was first uploaded with; `translations`
/// are stored normalized (see [`normalize`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub level: Level,
    pub source_text: String,
    pub translations: BTreeSet<String>,
    pub topic: Option<String>,
}

impl WordEntry {
    /// Text shown to the learner for the given direction
    pub fn prompt(&self, direction: Direction) -> String {
        match direction {
            Direction::SourceToTarget => self.source_text.clone(),
            Direction::TargetToSource => self
                .translations
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    /// Normalized answers accepted for the given direction
    pub fn accepted_answers(&self, direction: Direction) -> Vec<String> {
        match direction {
            Direction::SourceToTarget => self.translations.iter().map(|t| normalize(t)).collect(),
            Direction::TargetToSource => vec![normalize(&self.source_text)],
        }
    }
}

/// Apostrophe look-alikes used interchangeably in Uzbek Latin orthography
const APOSTROPHES: [char; 6] = ['\u{02BB}', '\u{02BC}', '\u{2018}', '\u{2019}', '\u{0060}', '\u{00B4}'];

/// Canonical comparison form for words and answers.
///
/// Trims, collapses whitespace runs, folds apostrophe variants to `'` and
/// lower-cases (`İ` becomes plain `i`). Diacritics are kept.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars() {
            match c {
                '\u{0130}' => out.push('i'),
                c if APOSTROPHES.contains(&c) => out.push('\''),
                c => out.extend(c.to_lowercase()),
            }
        }
    }
    out
}
