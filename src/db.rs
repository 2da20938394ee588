//! SQLite-backed vocabulary storage

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::{normalize, Level, WordEntry};
use crate::store::{UpsertOutcome, VocabularyStore};

/// Number of words stored at a level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelCount {
    pub level: Level,
    pub word_count: i64,
}

/// Create tables if they do not exist yet
pub fn init_database(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS word_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            level TEXT NOT NULL,
            source_text TEXT NOT NULL,
            source_key TEXT NOT NULL,
            topic TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (level, source_key)
        );

        CREATE TABLE IF NOT EXISTS translations (
            entry_id INTEGER NOT NULL REFERENCES word_entries(id) ON DELETE CASCADE,
            text TEXT NOT NULL,
            PRIMARY KEY (entry_id, text)
        );

        CREATE TABLE IF NOT EXISTS quiz_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            learner_id INTEGER NOT NULL,
            level TEXT NOT NULL,
            direction TEXT NOT NULL,
            total INTEGER NOT NULL,
            score INTEGER NOT NULL,
            skipped INTEGER NOT NULL,
            no_answer INTEGER NOT NULL,
            wrong INTEGER NOT NULL,
            outcomes TEXT NOT NULL,
            finished_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_quiz_results_finished
            ON quiz_results(finished_at, level);",
    )
}

/// Vocabulary store over a single SQLite connection.
///
/// Writers are serialized by the connection mutex inside this process and by
/// an IMMEDIATE transaction across processes sharing the file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        init_database(&conn)?;
        tracing::info!(path = %db_path.as_ref().display(), "opened vocabulary store");
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_database(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| Error::Lock(e.to_string()))
    }

    /// Word counts for every level that has at least one entry
    pub fn level_counts(&self) -> Result<Vec<LevelCount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT level, COUNT(*) FROM word_entries GROUP BY level ORDER BY level",
        )?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(level, word_count)| -> Result<LevelCount> {
                Ok(LevelCount {
                    level: level.parse()?,
                    word_count,
                })
            })
            .collect()
    }

    fn translations_for(conn: &Connection, entry_id: i64) -> rusqlite::Result<BTreeSet<String>> {
        let mut stmt = conn.prepare("SELECT text FROM translations WHERE entry_id = ?1")?;
        let texts = stmt
            .query_map(params![entry_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(texts)
    }
}

impl VocabularyStore for SqliteStore {
    fn find_entry(&self, level: Level, source_text: &str) -> Result<Option<WordEntry>> {
        let conn = self.conn()?;
        let result = conn
            .query_row(
                "SELECT id, source_text, topic FROM word_entries WHERE level = ?1 AND source_key = ?2",
                params![level.as_str(), normalize(source_text)],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        match result {
            Some((id, source_text, topic)) => Ok(Some(WordEntry {
                level,
                source_text,
                translations: Self::translations_for(&conn, id)?,
                topic,
            })),
            None => Ok(None),
        }
    }

    fn upsert_entry(
        &self,
        level: Level,
        source_text: &str,
        translations: &BTreeSet<String>,
        topic: Option<&str>,
    ) -> Result<UpsertOutcome> {
        let key = normalize(source_text);
        let translations: BTreeSet<String> = translations
            .iter()
            .map(|t| normalize(t))
            .filter(|t| !t.is_empty())
            .collect();
        if key.is_empty() || translations.is_empty() {
            return Ok(UpsertOutcome {
                created: false,
                translations_added: false,
            });
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM word_entries WHERE level = ?1 AND source_key = ?2",
                params![level.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;

        let (entry_id, created) = match existing {
            Some(id) => (id, false),
            None => {
                tx.execute(
                    "INSERT INTO word_entries (level, source_text, source_key, topic) VALUES (?1, ?2, ?3, ?4)",
                    params![level.as_str(), source_text.trim(), key, topic],
                )?;
                (tx.last_insert_rowid(), true)
            }
        };

        let mut added = 0;
        for text in &translations {
            added += tx.execute(
                "INSERT OR IGNORE INTO translations (entry_id, text) VALUES (?1, ?2)",
                params![entry_id, text],
            )?;
        }
        tx.commit()?;

        Ok(UpsertOutcome {
            created,
            translations_added: added > 0,
        })
    }

    fn list_entries(&self, level: Level) -> Result<Vec<WordEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT e.id, e.source_text, e.topic, t.text
             FROM word_entries e
             JOIN translations t ON t.entry_id = e.id
             WHERE e.level = ?1
             ORDER BY e.id, t.text",
        )?;

        let rows = stmt.query_map(params![level.as_str()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries: Vec<WordEntry> = Vec::new();
        let mut last_id = None;
        for row in rows {
            let (id, source_text, topic, translation) = row?;
            if last_id != Some(id) {
                entries.push(WordEntry {
                    level,
                    source_text,
                    translations: BTreeSet::new(),
                    topic,
                });
                last_id = Some(id);
            }
            if let Some(entry) = entries.last_mut() {
                entry.translations.insert(translation);
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn upsert_creates_then_merges() {
        let store = SqliteStore::open_in_memory().unwrap();

        let first = store.upsert_entry(Level::A1, "hello", &set(&["salom"]), None).unwrap();
        assert!(first.created);
        assert!(first.translations_added);

        let second = store
            .upsert_entry(Level::A1, "Hello", &set(&["salom", "assalomu alaykum"]), None)
            .unwrap();
        assert!(!second.created);
        assert!(second.translations_added);

        let third = store.upsert_entry(Level::A1, "HELLO", &set(&["Salom"]), None).unwrap();
        assert!(!third.created);
        assert!(!third.translations_added);

        let entries = store.list_entries(Level::A1).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source_text, "hello");
        assert_eq!(entries[0].translations, set(&["assalomu alaykum", "salom"]));
    }

    #[test]
    fn levels_are_separate_partitions() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_entry(Level::A1, "ev", &set(&["uy"]), None).unwrap();
        let outcome = store.upsert_entry(Level::B1, "ev", &set(&["uy"]), None).unwrap();
        assert!(outcome.created);

        assert_eq!(store.list_entries(Level::A1).unwrap().len(), 1);
        assert_eq!(store.list_entries(Level::B1).unwrap().len(), 1);
        assert!(store.list_entries(Level::C2).unwrap().is_empty());
    }

    #[test]
    fn find_entry_is_case_insensitive() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_entry(Level::A2, "Merhaba", &set(&["salom"]), Some("greetings"))
            .unwrap();

        let found = store.find_entry(Level::A2, "  mERHABA").unwrap().unwrap();
        assert_eq!(found.source_text, "Merhaba");
        assert_eq!(found.topic.as_deref(), Some("greetings"));
        assert!(store.find_entry(Level::A1, "merhaba").unwrap().is_none());
    }

    #[test]
    fn topic_is_kept_from_first_upload() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_entry(Level::A1, "kedi", &set(&["mushuk"]), Some("animals")).unwrap();
        store.upsert_entry(Level::A1, "kedi", &set(&["pishak"]), Some("pets")).unwrap();

        let entry = store.find_entry(Level::A1, "kedi").unwrap().unwrap();
        assert_eq!(entry.topic.as_deref(), Some("animals"));
        assert_eq!(entry.translations, set(&["mushuk", "pishak"]));
    }

    #[test]
    fn empty_translation_set_is_ignored() {
        let store = SqliteStore::open_in_memory().unwrap();
        let outcome = store.upsert_entry(Level::A1, "boş", &BTreeSet::new(), None).unwrap();
        assert!(!outcome.created);
        assert!(store.find_entry(Level::A1, "boş").unwrap().is_none());
    }

    #[test]
    fn blank_translations_are_dropped() {
        let store = SqliteStore::open_in_memory().unwrap();
        let outcome = store.upsert_entry(Level::A1, "bos", &set(&["   ", ""]), None).unwrap();
        assert!(!outcome.created);
        assert!(store.find_entry(Level::A1, "bos").unwrap().is_none());

        store.upsert_entry(Level::A1, "bos", &set(&[" ", "bo'sh"]), None).unwrap();
        let entry = store.find_entry(Level::A1, "bos").unwrap().unwrap();
        assert_eq!(entry.translations, set(&["bo'sh"]));
    }

    #[test]
    fn blank_source_is_ignored() {
        let store = SqliteStore::open_in_memory().unwrap();
        let outcome = store.upsert_entry(Level::A1, "   ", &set(&["x"]), None).unwrap();
        assert!(!outcome.created);
        assert!(!outcome.translations_added);
        assert!(store.list_entries(Level::A1).unwrap().is_empty());
    }

    #[test]
    fn level_counts_groups_by_level() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert_entry(Level::A1, "bir", &set(&["bir"]), None).unwrap();
        store.upsert_entry(Level::A1, "iki", &set(&["ikki"]), None).unwrap();
        store.upsert_entry(Level::C1, "kavram", &set(&["tushuncha"]), None).unwrap();

        let counts = store.level_counts().unwrap();
        assert_eq!(
            counts,
            vec![
                LevelCount { level: Level::A1, word_count: 2 },
                LevelCount { level: Level::C1, word_count: 1 },
            ]
        );
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.upsert_entry(Level::B2, "özgür", &set(&["erkin"]), None).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let entry = store.find_entry(Level::B2, "ÖZGÜR").unwrap().unwrap();
        assert_eq!(entry.translations, set(&["erkin"]));
    }
}
