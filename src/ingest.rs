//! Word-list ingestion: parse, deduplicate and persist uploaded pairs

use serde::Serialize;

use crate::error::{MalformedLine, Result};
use crate::extract::{extract_lines, DocumentFormat, ExtractedLine};
use crate::model::Level;
use crate::parser::parse_line;
use crate::store::VocabularyStore;

/// Per-upload ingestion summary. Every input line is counted exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// New entries created
    pub accepted: usize,
    /// Existing entries that gained at least one translation
    pub merged: usize,
    /// Lines already fully present in the store
    pub duplicates: usize,
    pub rejected: Vec<MalformedLine>,
}

impl IngestReport {
    pub fn total_lines(&self) -> usize {
        self.accepted + self.merged + self.duplicates + self.rejected.len()
    }
}

/// Ingest extracted lines into `level`.
///
/// Each pair is persisted as soon as it is parsed, so large uploads are never
/// held in memory. Store failures abort the run and propagate unchanged; pairs
/// written before the failure stay written and a rerun is idempotent.
pub fn ingest<S, I>(store: &S, lines: I, level: Level, topic: Option<&str>) -> Result<IngestReport>
where
    S: VocabularyStore + ?Sized,
    I: IntoIterator<Item = ExtractedLine>,
{
    let topic = topic.map(str::trim).filter(|t| !t.is_empty());
    let mut report = IngestReport::default();

    for line in lines {
        let pair = match parse_line(&line.text, line.number) {
            Ok(pair) => pair,
            Err(rejection) => {
                tracing::debug!(line = rejection.line_number, reason = %rejection.reason, "rejected line");
                report.rejected.push(rejection);
                continue;
            }
        };

        let outcome = store.upsert_entry(level, &pair.source_text, &pair.translations, topic)?;
        if outcome.created {
            report.accepted += 1;
        } else if outcome.translations_added {
            tracing::debug!(word = %pair.source_text, %level, "merged translations");
            report.merged += 1;
        } else {
            report.duplicates += 1;
        }
    }

    tracing::info!(
        %level,
        accepted = report.accepted,
        merged = report.merged,
        duplicates = report.duplicates,
        rejected = report.rejected.len(),
        "ingested word list"
    );
    Ok(report)
}

/// Extract an uploaded document and ingest its lines
pub fn ingest_document<S>(
    store: &S,
    bytes: &[u8],
    format: DocumentFormat,
    level: Level,
    topic: Option<&str>,
) -> Result<IngestReport>
where
    S: VocabularyStore + ?Sized,
{
    let lines = extract_lines(bytes, format)?;
    ingest(store, lines, level, topic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::error::{Error, MalformedReason};
    use crate::store::UpsertOutcome;
    use crate::model::WordEntry;
    use std::collections::BTreeSet;

    fn lines(raw: &[&str]) -> Vec<ExtractedLine> {
        ExtractedLine::numbered(raw.iter().copied())
    }

    #[test]
    fn second_run_is_all_duplicates() {
        let store = SqliteStore::open_in_memory().unwrap();
        let file = ["merhaba - salom", "iyi - yaxshi; yaxshimisiz", "bozuk satır"];

        let first = ingest(&store, lines(&file), Level::A1, None).unwrap();
        assert_eq!(first.accepted, 2);
        assert_eq!(first.rejected.len(), 1);
        let before = store.list_entries(Level::A1).unwrap();

        let second = ingest(&store, lines(&file), Level::A1, None).unwrap();
        assert_eq!(second.accepted, 0);
        assert_eq!(second.merged, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(second.rejected.len(), 1);
        assert_eq!(store.list_entries(Level::A1).unwrap(), before);
    }

    #[test]
    fn merge_extends_existing_translations() {
        let store = SqliteStore::open_in_memory().unwrap();
        ingest(&store, lines(&["hello - salom"]), Level::A1, None).unwrap();
        let report = ingest(&store, lines(&["hello - salom; assalomu alaykum"]), Level::A1, None).unwrap();

        assert_eq!(report.merged, 1);
        let entries = store.list_entries(Level::A1).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].translations,
            ["assalomu alaykum", "salom"]
                .iter()
                .map(|s| s.to_string())
                .collect::<BTreeSet<String>>()
        );
    }

    #[test]
    fn duplicate_within_one_file_is_counted_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let report = ingest(&store, lines(&["su - suv", "SU - Suv"]), Level::A2, Some("drinks")).unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.total_lines(), 2);
    }

    #[test]
    fn rejections_carry_source_line_numbers() {
        let store = SqliteStore::open_in_memory().unwrap();
        let report = ingest(
            &store,
            lines(&["merhaba salom", "", "a-b", "a - b - c", "kalem - qalam"]),
            Level::B1,
            None,
        )
        .unwrap();

        let reasons: Vec<(usize, MalformedReason)> =
            report.rejected.iter().map(|r| (r.line_number, r.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                (1, MalformedReason::NoSeparator),
                (3, MalformedReason::NoSeparator),
                (4, MalformedReason::AmbiguousSeparator),
            ]
        );
        assert_eq!(report.accepted, 1);
        assert_eq!(report.total_lines(), 4);
    }

    #[test]
    fn blank_topic_is_not_stored() {
        let store = SqliteStore::open_in_memory().unwrap();
        ingest(&store, lines(&["ay - oy"]), Level::A1, Some("   ")).unwrap();
        assert_eq!(store.find_entry(Level::A1, "ay").unwrap().unwrap().topic, None);
    }

    #[test]
    fn ingest_document_extracts_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        let report = ingest_document(
            &store,
            "gün - kun\n\ngece - tun\n".as_bytes(),
            DocumentFormat::PlainText,
            Level::A1,
            None,
        )
        .unwrap();
        assert_eq!(report.accepted, 2);
    }

    struct BrokenStore;

    impl VocabularyStore for BrokenStore {
        fn find_entry(&self, _: Level, _: &str) -> Result<Option<WordEntry>> {
            Ok(None)
        }

        fn upsert_entry(&self, _: Level, _: &str, _: &BTreeSet<String>, _: Option<&str>) -> Result<UpsertOutcome> {
            Err(Error::Lock("store unavailable".to_string()))
        }

        fn list_entries(&self, _: Level) -> Result<Vec<WordEntry>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn store_failures_propagate() {
        let err = ingest(&BrokenStore, lines(&["su - suv"]), Level::A1, None).unwrap_err();
        assert!(matches!(err, Error::Lock(_)));
    }
}
