//! Quiz session engine
//!
//! A [`QuizSession`] walks a shuffled snapshot of one level's vocabulary:
//! `Selecting -> Active -> Finished`. Every learner action resolves the
//! current question and advances the cursor; nothing leaves `Finished`.
//! Sessions hold no shared state, so callers may run one per learner on any
//! thread.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fuzzy::{closest_match, NearMiss, DEFAULT_NEAR_MISS_THRESHOLD};
use crate::model::{normalize, Direction, Level, WordEntry};
use crate::store::VocabularyStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Level and direction chosen, pool not built yet
    Selecting,
    Active,
    Finished,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Selecting => "selecting",
            SessionState::Active => "active",
            SessionState::Finished => "finished",
        }
    }
}

/// How one question was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Correct,
    Incorrect,
    Skipped,
    NoAnswer,
}

/// Record of one question cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// 1-based question number
    pub position: usize,
    pub prompt: String,
    /// Raw learner text; `None` for skip / no-answer
    pub given_answer: Option<String>,
    /// `None` when no answer was evaluated
    pub correct: Option<bool>,
    pub kind: OutcomeKind,
    /// Answers that would have been accepted
    pub expected: Vec<String>,
    /// Closest accepted answer for a wrong attempt that was nearly right
    pub near_miss: Option<NearMiss>,
}

/// Cursor position of a session and the running tally behind it.
/// `score + skipped + no_answer + wrong == cursor` at every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub state: SessionState,
    pub cursor: usize,
    pub total: usize,
    pub score: usize,
    pub skipped: usize,
    pub no_answer: usize,
    pub wrong: usize,
}

/// Final tally of a finished session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub level: Level,
    pub direction: Direction,
    pub score: usize,
    pub skipped: usize,
    pub no_answer: usize,
    pub wrong: usize,
    pub total: usize,
    pub outcomes: Vec<OutcomeRecord>,
}

impl SessionSummary {
    /// Whole-number percentage of correct answers
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.score * 100 / self.total
        }
    }
}

/// Per-session tuning chosen by the learner or the deployment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    /// Maximum number of questions; `None` (or 0) asks the whole level
    pub limit: Option<usize>,
    pub near_miss_threshold: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            limit: None,
            near_miss_threshold: DEFAULT_NEAR_MISS_THRESHOLD,
        }
    }
}

/// One learner's quiz
#[derive(Debug, Clone)]
pub struct QuizSession {
    level: Level,
    direction: Direction,
    options: SessionOptions,
    state: SessionState,
    pool: Vec<WordEntry>,
    cursor: usize,
    score: usize,
    skipped: usize,
    no_answer: usize,
    outcomes: Vec<OutcomeRecord>,
}

impl QuizSession {
    /// New session in `Selecting`; call [`QuizSession::begin`] to build the pool
    pub fn select(level: Level, direction: Direction, options: SessionOptions) -> Self {
        Self {
            level,
            direction,
            options,
            state: SessionState::Selecting,
            pool: Vec::new(),
            cursor: 0,
            score: 0,
            skipped: 0,
            no_answer: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn begin<S: VocabularyStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        self.begin_with_rng(store, &mut rand::thread_rng())
    }

    /// Snapshot the level's entries, shuffle them once and go `Active`.
    /// Fails with [`Error::EmptyPool`] and stays in `Selecting` if the level is empty.
    pub fn begin_with_rng<S, R>(&mut self, store: &S, rng: &mut R) -> Result<()>
    where
        S: VocabularyStore + ?Sized,
        R: Rng + ?Sized,
    {
        match self.state {
            SessionState::Selecting => {}
            SessionState::Active => return Err(Error::SessionAlreadyStarted),
            SessionState::Finished => return Err(Error::SessionFinished),
        }

        let mut pool = store.list_entries(self.level)?;
        if pool.is_empty() {
            return Err(Error::EmptyPool(self.level));
        }
        pool.shuffle(rng);
        if let Some(limit) = self.options.limit.filter(|n| *n > 0) {
            pool.truncate(limit);
        }

        tracing::info!(level = %self.level, direction = %self.direction, total = pool.len(), "quiz session started");
        self.pool = pool;
        self.state = SessionState::Active;
        Ok(())
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn current_state(&self) -> Progress {
        Progress {
            state: self.state,
            cursor: self.cursor,
            total: self.pool.len(),
            score: self.score,
            skipped: self.skipped,
            no_answer: self.no_answer,
            wrong: self.wrong(),
        }
    }

    /// Prompt of the question waiting for an answer
    pub fn current_prompt(&self) -> Option<String> {
        match self.state {
            SessionState::Active => self.pool.get(self.cursor).map(|e| e.prompt(self.direction)),
            _ => None,
        }
    }

    /// Evaluate `text` against the current question (exact match after normalization)
    pub fn submit_answer(&mut self, text: &str) -> Result<OutcomeRecord> {
        let entry = self.current_entry()?;
        let expected = entry.accepted_answers(self.direction);
        let answer = normalize(text);
        let correct = !answer.is_empty() && expected.contains(&answer);

        let (kind, near_miss) = if correct {
            self.score += 1;
            (OutcomeKind::Correct, None)
        } else {
            let near = closest_match(&answer, &expected, self.options.near_miss_threshold);
            (OutcomeKind::Incorrect, near)
        };

        Ok(self.record(kind, Some(text.to_string()), expected, near_miss))
    }

    pub fn skip(&mut self) -> Result<OutcomeRecord> {
        let expected = self.current_entry()?.accepted_answers(self.direction);
        self.skipped += 1;
        Ok(self.record(OutcomeKind::Skipped, None, expected, None))
    }

    /// Learner declares they do not know the answer
    pub fn no_answer(&mut self) -> Result<OutcomeRecord> {
        let expected = self.current_entry()?.accepted_answers(self.direction);
        self.no_answer += 1;
        Ok(self.record(OutcomeKind::NoAnswer, None, expected, None))
    }

    /// Summary of a finished session
    pub fn finish_summary(&self) -> Result<SessionSummary> {
        match self.state {
            SessionState::Finished => {}
            SessionState::Selecting => return Err(Error::SessionNotStarted),
            SessionState::Active => return Err(Error::SessionNotFinished),
        }

        Ok(SessionSummary {
            level: self.level,
            direction: self.direction,
            score: self.score,
            skipped: self.skipped,
            no_answer: self.no_answer,
            wrong: self.wrong(),
            total: self.pool.len(),
            outcomes: self.outcomes.clone(),
        })
    }

    fn wrong(&self) -> usize {
        self.outcomes.len() - self.score - self.skipped - self.no_answer
    }

    fn current_entry(&self) -> Result<&WordEntry> {
        match self.state {
            SessionState::Selecting => Err(Error::SessionNotStarted),
            SessionState::Finished => Err(Error::SessionFinished),
            SessionState::Active => self.pool.get(self.cursor).ok_or(Error::SessionFinished),
        }
    }

    fn record(
        &mut self,
        kind: OutcomeKind,
        given_answer: Option<String>,
        expected: Vec<String>,
        near_miss: Option<NearMiss>,
    ) -> OutcomeRecord {
        let correct = match kind {
            OutcomeKind::Correct => Some(true),
            OutcomeKind::Incorrect => Some(false),
            OutcomeKind::Skipped | OutcomeKind::NoAnswer => None,
        };
        let outcome = OutcomeRecord {
            position: self.cursor + 1,
            prompt: self.pool[self.cursor].prompt(self.direction),
            given_answer,
            correct,
            kind,
            expected,
            near_miss,
        };

        self.outcomes.push(outcome.clone());
        self.cursor += 1;
        if self.cursor == self.pool.len() {
            self.state = SessionState::Finished;
            tracing::info!(
                level = %self.level,
                score = self.score,
                skipped = self.skipped,
                no_answer = self.no_answer,
                wrong = self.wrong(),
                total = self.pool.len(),
                "quiz session finished"
            );
        }
        outcome
    }
}

/// Build and begin a session with default options
pub fn start_session<S: VocabularyStore + ?Sized>(
    store: &S,
    level: Level,
    direction: Direction,
) -> Result<QuizSession> {
    start_session_with(store, level, direction, SessionOptions::default())
}

pub fn start_session_with<S: VocabularyStore + ?Sized>(
    store: &S,
    level: Level,
    direction: Direction,
    options: SessionOptions,
) -> Result<QuizSession> {
    let mut session = QuizSession::select(level, direction, options);
    session.begin(store)?;
    Ok(session)
}
