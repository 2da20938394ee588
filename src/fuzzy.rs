//! Near-miss detection for wrong quiz answers
//!
//! Only used for feedback; correctness is always decided by exact match.

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, levenshtein, normalized_levenshtein};

use crate::model::normalize;

/// Default similarity above which a wrong answer is reported as close
pub const DEFAULT_NEAR_MISS_THRESHOLD: f64 = 0.8;

/// Closest accepted answer to a wrong attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearMiss {
    pub expected: String,
    pub similarity: f64,
    /// Edit distance in characters
    pub distance: usize,
}

/// Weighted blend of Levenshtein and Jaro-Winkler (the latter is better for typos)
pub fn similarity(input: &str, expected: &str) -> f64 {
    let input = normalize(input);
    let expected = normalize(expected);
    normalized_levenshtein(&input, &expected) * 0.4 + jaro_winkler(&input, &expected) * 0.6
}

/// Best candidate whose similarity reaches `threshold`, if any
pub fn closest_match<'a, I>(input: &str, candidates: I, threshold: f64) -> Option<NearMiss>
where
    I: IntoIterator<Item = &'a String>,
{
    let input_normalized = normalize(input);
    if input_normalized.is_empty() {
        return None;
    }

    candidates
        .into_iter()
        .map(|expected| (expected, similarity(&input_normalized, expected)))
        .filter(|(_, score)| *score >= threshold)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(expected, score)| NearMiss {
            expected: expected.clone(),
            similarity: score,
            distance: levenshtein(&input_normalized, &normalize(expected)),
        })
}
