//! Vocabulary store abstraction consumed by ingestion and the quiz engine

use std::collections::BTreeSet;

use crate::error::Result;
use crate::model::{Level, WordEntry};

/// Result of merging a word pair into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// A new entry was created for the key
    pub created: bool,
    /// At least one translation was not stored before
    pub translations_added: bool,
}

/// Persistent word storage keyed by `(level, normalized source_text)`.
///
/// `upsert_entry` must be atomic per key: concurrent uploads of the same
/// word at the same level end in a single entry holding the union of their
/// translations.
pub trait VocabularyStore {
    /// Look up an entry, comparing `source_text` case-insensitively
    fn find_entry(&self, level: Level, source_text: &str) -> Result<Option<WordEntry>>;

    /// Create the entry or union `translations` into the existing one.
    /// `topic` is only recorded when the entry is created. Blank translations
    /// are dropped; a blank source or an empty set leaves the store untouched.
    fn upsert_entry(
        &self,
        level: Level,
        source_text: &str,
        translations: &BTreeSet<String>,
        topic: Option<&str>,
    ) -> Result<UpsertOutcome>;

    /// Every entry stored at `level`
    fn list_entries(&self, level: Level) -> Result<Vec<WordEntry>>;
}

impl<S: VocabularyStore + ?Sized> VocabularyStore for std::sync::Arc<S> {
    fn find_entry(&self, level: Level, source_text: &str) -> Result<Option<WordEntry>> {
        (**self).find_entry(level, source_text)
    }

    fn upsert_entry(
        &self,
        level: Level,
        source_text: &str,
        translations: &BTreeSet<String>,
        topic: Option<&str>,
    ) -> Result<UpsertOutcome> {
        (**self).upsert_entry(level, source_text, translations, topic)
    }

    fn list_entries(&self, level: Level) -> Result<Vec<WordEntry>> {
        (**self).list_entries(level)
    }
}
