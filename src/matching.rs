//! Typo-tolerant lookup of catalog entries.
//!
//! Each entry is scored against the query on both its identifier and its display name,
//! keeping the better of the two:
//!
//! ```text
//! field_score = 0.6 * contains(field, query) + 0.4 * (1 - levenshtein(query, field) / max_len)
//! ```
//!
//! Strings are lowercased and stripped of everything except alphanumerics and `/` before
//! comparison, so `GPT-4o` and `gpt 4o` both compare as `gpt4o`. Entries scoring below
//! [`MIN_SCORE`] are dropped. Ties keep catalog order.

use crate::types::ModelEntry;

/// Default number of suggestions attached to an unknown-model failure.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;
/// Entries scoring below this are not considered similar.
pub const MIN_SCORE: f64 = 0.3;

const CONTAINMENT_WEIGHT: f64 = 0.6;
const DISTANCE_WEIGHT: f64 = 0.4;

/// Ranks catalog entries by similarity to `query`, best first.
///
/// # Examples
///
/// ```
/// use straico::matching::rank_models;
/// use straico::types::ModelEntry;
///
/// let catalog = vec![
///     ModelEntry::new("GPT-4o Mini", "openai/gpt-4o-mini"),
///     ModelEntry::new("Claude 3.5 Haiku", "anthropic/claude-3-5-haiku"),
///     ModelEntry::new("GPT-4o", "openai/gpt-4o"),
/// ];
/// let ranked = rank_models("gpt4", &catalog, 5);
/// assert_eq!(ranked.len(), 2);
/// assert_eq!(ranked[0].model, "openai/gpt-4o");
/// ```
pub fn rank_models(query: &str, catalog: &[ModelEntry], max_suggestions: usize) -> Vec<ModelEntry> {
    if max_suggestions == 0 || normalize(query).is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f64, &ModelEntry)> = catalog
        .iter()
        .map(|entry| (similarity(query, entry), entry))
        .filter(|(score, _)| *score >= MIN_SCORE)
        .collect();
    // Stable sort keeps catalog order among equal scores.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(_, entry)| entry.clone())
        .collect()
}

/// Similarity of `query` to an entry in `[0.0, 1.0]`.
pub fn similarity(query: &str, entry: &ModelEntry) -> f64 {
    let query = normalize(query);
    if query.is_empty() {
        return 0.0;
    }
    field_score(&query, &normalize(&entry.model)).max(field_score(&query, &normalize(&entry.name)))
}

fn field_score(query: &str, field: &str) -> f64 {
    if field.is_empty() {
        return 0.0;
    }
    let containment = if field.contains(query) { 1.0 } else { 0.0 };
    let longest = query.chars().count().max(field.chars().count());
    let ratio = 1.0 - levenshtein(query, field) as f64 / longest as f64;
    CONTAINMENT_WEIGHT * containment + DISTANCE_WEIGHT * ratio
}

fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '/')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Classic edit distance over Unicode scalar values.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<ModelEntry> {
        vec![
            ModelEntry::new("Claude 3.5 Sonnet", "anthropic/claude-3.5-sonnet"),
            ModelEntry::new("GPT-4o Mini", "openai/gpt-4o-mini"),
            ModelEntry::new("Gemini 2.0 Flash", "google/gemini-2.0-flash-001"),
            ModelEntry::new("GPT-4o", "openai/gpt-4o"),
            ModelEntry::new("Llama 3.1 405B", "meta-llama/llama-3.1-405b-instruct"),
        ]
    }

    #[test]
    fn levenshtein_matches_known_distances() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abcd"), 4);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("gpt4", "gpt4o"), 1);
    }

    #[test]
    fn closer_lexical_match_ranks_first() {
        let ranked = rank_models("gpt4", &catalog(), 5);
        let ids: Vec<&str> = ranked.iter().map(|entry| entry.model.as_str()).collect();
        assert_eq!(ids, vec!["openai/gpt-4o", "openai/gpt-4o-mini"]);
    }

    #[test]
    fn result_length_respects_max_suggestions() {
        for max in 0..4 {
            let ranked = rank_models("o", &catalog(), max);
            assert!(ranked.len() <= max, "max {max} gave {}", ranked.len());
        }
        assert!(rank_models("gpt4", &catalog(), 0).is_empty());
        assert_eq!(rank_models("gpt4", &catalog(), 1)[0].model, "openai/gpt-4o");
    }

    #[test]
    fn ranking_is_deterministic_and_ties_keep_catalog_order() {
        let entries = vec![
            ModelEntry::new("Alpha", "vendor/model-x"),
            ModelEntry::new("Beta", "other/model-x"),
            ModelEntry::new("Gamma", "third/model-x"),
        ];
        let first = rank_models("model-x", &entries, 5);
        let second = rank_models("model-x", &entries, 5);
        assert_eq!(first, second);
        // "other/" and "third/" are the same length, so those two scores tie.
        let ids: Vec<&str> = first.iter().map(|entry| entry.model.as_str()).collect();
        assert_eq!(ids, vec!["other/model-x", "third/model-x", "vendor/model-x"]);
    }

    #[test]
    fn name_and_identifier_are_both_considered() {
        let entries = vec![ModelEntry::new("Sonnet Deluxe", "x/abc-123")];
        assert_eq!(rank_models("sonnet", &entries, 5).len(), 1);
        assert_eq!(rank_models("ABC123", &entries, 5).len(), 1);
    }

    #[test]
    fn unrelated_queries_and_blank_queries_yield_nothing() {
        assert!(rank_models("zzzzzzzzzzzz", &catalog(), 5).is_empty());
        assert!(rank_models("  --  ", &catalog(), 5).is_empty());
        assert!(rank_models("gpt4", &[], 5).is_empty());
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        for entry in catalog() {
            for query in ["gpt", "claude-3.5-sonnet", "x", "openai/gpt-4o"] {
                let score = similarity(query, &entry);
                assert!((0.0..=1.0).contains(&score), "{query} vs {entry:?}: {score}");
            }
        }
        let exact = similarity("openai/gpt-4o", &ModelEntry::new("", "openai/gpt-4o"));
        assert!((exact - 1.0).abs() < f64::EPSILON);
    }
}
