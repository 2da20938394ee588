//! Property-based tests for session counters and ingestion idempotence

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use kelime_core::{
    ingest, Direction, ExtractedLine, Level, QuizSession, SessionOptions, SessionState, SqliteStore,
    VocabularyStore,
};

#[derive(Debug, Clone, Copy)]
enum Action {
    Right,
    Wrong,
    Skip,
    Pass,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![Just(Action::Right), Just(Action::Wrong), Just(Action::Skip), Just(Action::Pass)]
}

fn arb_word() -> impl Strategy<Value = String> {
    "[a-z]{2,8}"
}

fn arb_pairs() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::vec((arb_word(), prop::collection::vec(arb_word(), 1..4)), 1..12)
}

fn to_lines(pairs: &[(String, Vec<String>)]) -> Vec<ExtractedLine> {
    ExtractedLine::numbered(pairs.iter().map(|(word, translations)| format!("{} - {}", word, translations.join("; "))))
}

proptest! {
    #[test]
    fn counters_track_cursor(
        pairs in arb_pairs(),
        actions in prop::collection::vec(arb_action(), 0..16),
        seed in any::<u64>(),
    ) {
        let store = SqliteStore::open_in_memory().unwrap();
        ingest(&store, to_lines(&pairs), Level::A1, None).unwrap();

        let mut session = QuizSession::select(Level::A1, Direction::SourceToTarget, SessionOptions::default());
        session.begin_with_rng(&store, &mut StdRng::seed_from_u64(seed)).unwrap();
        let total = session.current_state().total;

        let mut last_cursor = 0;
        for action in actions {
            if session.current_state().state == SessionState::Finished {
                break;
            }
            let prompt = session.current_prompt().unwrap();
            let outcome = match action {
                Action::Right => {
                    let entry = store.find_entry(Level::A1, &prompt).unwrap().unwrap();
                    let answer = entry.translations.iter().next().unwrap().clone();
                    session.submit_answer(&answer).unwrap()
                }
                Action::Wrong => session.submit_answer("0").unwrap(),
                Action::Skip => session.skip().unwrap(),
                Action::Pass => session.no_answer().unwrap(),
            };

            let progress = session.current_state();
            prop_assert_eq!(progress.score + progress.skipped + progress.no_answer + progress.wrong, progress.cursor);
            prop_assert_eq!(outcome.position, progress.cursor);
            prop_assert!(progress.cursor >= last_cursor);
            prop_assert_eq!(progress.total, total);
            last_cursor = progress.cursor;
        }

        while session.current_prompt().is_some() {
            session.skip().unwrap();
        }
        let summary = session.finish_summary().unwrap();
        prop_assert_eq!(summary.score + summary.skipped + summary.no_answer + summary.wrong, summary.total);
        prop_assert_eq!(summary.outcomes.len(), summary.total);
    }

    #[test]
    fn reingest_is_idempotent(pairs in arb_pairs()) {
        let store = SqliteStore::open_in_memory().unwrap();
        ingest(&store, to_lines(&pairs), Level::B2, None).unwrap();
        let before = store.list_entries(Level::B2).unwrap();

        let again = ingest(&store, to_lines(&pairs), Level::B2, None).unwrap();
        prop_assert_eq!(again.accepted, 0);
        prop_assert_eq!(again.merged, 0);
        prop_assert_eq!(again.duplicates, pairs.len());
        prop_assert_eq!(store.list_entries(Level::B2).unwrap(), before);
    }

    #[test]
    fn limit_caps_pool(pairs in arb_pairs(), limit in 1usize..6) {
        let store = SqliteStore::open_in_memory().unwrap();
        ingest(&store, to_lines(&pairs), Level::A2, None).unwrap();
        let stored = store.list_entries(Level::A2).unwrap().len();

        let options = SessionOptions { limit: Some(limit), ..SessionOptions::default() };
        let mut session = QuizSession::select(Level::A2, Direction::TargetToSource, options);
        session.begin_with_rng(&store, &mut StdRng::seed_from_u64(7)).unwrap();
        prop_assert_eq!(session.current_state().total, stored.min(limit));
    }
}
