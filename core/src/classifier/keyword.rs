//! Offline keyword classifier

use super::{Candidate, Classification, Classifier};

/// Deterministic matcher that needs no network.
///
/// Tried in order, first hit wins:
///
/// 1. The input is a 1-based option number (`"2"` picks the second candidate)
/// 2. The input contains a candidate's intent, case-insensitively
/// 3. The input contains a candidate's description, case-insensitively
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl Classifier for KeywordClassifier {
    fn classify(&self, input: &str, candidates: &[Candidate<'_>]) -> Classification {
        let text = input.trim();

        if let Ok(n) = text.parse::<usize>() {
            if let Some(c) = n.checked_sub(1).and_then(|i| candidates.get(i)) {
                return Classification::Intent(c.intent.to_string());
            }
        }

        let lowered = text.to_lowercase();
        let contains = |needle: &str| {
            let needle = needle.trim();
            !needle.is_empty() && lowered.contains(&needle.to_lowercase())
        };

        candidates
            .iter()
            .find(|c| contains(c.intent))
            .or_else(|| candidates.iter().find(|c| contains(c.description)))
            .map(|c| Classification::Intent(c.intent.to_string()))
            .unwrap_or(Classification::Unknown)
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}
