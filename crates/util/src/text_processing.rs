//! # Text Processing Utilities
//!
//! Fuzzy matching used to pick the best candidate (for example a playlist) out of a list of
//! search results.

/// Score awarded per character for each consecutive match in a run.
const CONSECUTIVE_BONUS: i64 = 6;
/// Score awarded when a match lands on a word boundary.
const BOUNDARY_BONUS: i64 = 10;
/// Score awarded when the candidate starts with a query token.
const PREFIX_BONUS: i64 = 30;
/// Upper bound of the bonus for tokens that match early in the candidate.
const EARLY_MATCH_WINDOW: i64 = 20;

/// Returns `Some(score)` when every whitespace-separated token of `query` appears, in order,
/// as a subsequence of `candidate`. Higher scores are better: consecutive runs, word
/// boundaries, prefixes, and shorter candidates are favoured. Matching ignores case.
///
/// ```rust
/// use roomcast_util::text_processing::fuzzy_score;
///
/// assert!(fuzzy_score("Morning Jazz", "jazz").is_some());
/// assert!(fuzzy_score("Morning Jazz", "mj").is_some());
/// assert!(fuzzy_score("Morning Jazz", "blues").is_none());
/// assert_eq!(fuzzy_score("anything", ""), Some(0));
/// ```
pub fn fuzzy_score(candidate: &str, query: &str) -> Option<i64> {
    let tokens: Vec<Vec<char>> = query.split_whitespace().map(|token| token.to_lowercase().chars().collect()).collect();
    if tokens.is_empty() {
        return Some(0);
    }

    let lowered = candidate.to_lowercase();
    let characters: Vec<char> = lowered.chars().collect();
    if characters.is_empty() {
        return None;
    }

    let mut cursor = 0usize;
    let mut total = 0i64;
    for token in &tokens {
        let mut previous: Option<usize> = None;
        let mut first: Option<usize> = None;
        let mut run = 0i64;

        for needle in token {
            let offset = characters[cursor..].iter().position(|character| character == needle)?;
            let index = cursor + offset;
            match previous {
                Some(last) if index == last + 1 => run += 1,
                Some(last) => {
                    run = 1;
                    total -= ((index - last - 1) / 2) as i64;
                }
                None => run = 1,
            }
            total += CONSECUTIVE_BONUS * run;
            if is_word_boundary(&characters, index) {
                total += BOUNDARY_BONUS;
            }
            first.get_or_insert(index);
            previous = Some(index);
            cursor = index + 1;
        }

        let token_text: String = token.iter().collect();
        if lowered.starts_with(&token_text) {
            total += PREFIX_BONUS;
        }
        if let Some(start) = first {
            total += (EARLY_MATCH_WINDOW - start as i64).max(0);
        }
    }

    Some(total - characters.len() as i64 / 8)
}

/// Picks the candidate whose label best matches `query`.
///
/// An exact (case-insensitive) label match wins outright. Otherwise the highest fuzzy score
/// wins, with ties resolved in favour of the earlier candidate. When nothing matches, the
/// first candidate is returned since the list is assumed to already be search results.
pub fn best_match<'a, T, F>(candidates: &'a [T], query: &str, label: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let wanted = query.trim();
    if let Some(exact) = candidates.iter().find(|candidate| label(*candidate).trim().eq_ignore_ascii_case(wanted)) {
        return Some(exact);
    }

    let mut best: Option<(&T, i64)> = None;
    for candidate in candidates {
        let Some(score) = fuzzy_score(label(candidate), wanted) else {
            continue;
        };
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }

    best.map(|(candidate, _)| candidate).or_else(|| candidates.first())
}

fn is_word_boundary(characters: &[char], index: usize) -> bool {
    index == 0
        || characters
            .get(index - 1)
            .is_some_and(|character| character.is_whitespace() || character.is_ascii_punctuation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_prefix_and_consecutive_matches() {
        let prefix = fuzzy_score("Chill Vibes", "chill").expect("prefix match");
        let scattered = fuzzy_score("Coffeehouse Hits Ill", "chill").expect("scattered match");
        assert!(prefix > scattered, "prefix {prefix} should beat scattered {scattered}");
    }

    #[test]
    fn tokens_must_match_in_order() {
        assert!(fuzzy_score("Morning Jazz", "morning jazz").is_some());
        assert!(fuzzy_score("Morning Jazz", "jazz morning").is_none());
    }

    #[test]
    fn best_match_prefers_exact_names() {
        let names = ["Chill Mix 2", "Chill", "Chillhop"];
        let best = best_match(&names, "chill", |name| *name).copied();
        assert_eq!(best, Some("Chill"));
    }

    #[test]
    fn best_match_uses_scores_then_falls_back_to_first() {
        let names = ["Workout", "Deep Focus", "Focus Flow"];
        assert_eq!(best_match(&names, "focus", |name| *name).copied(), Some("Focus Flow"));
        assert_eq!(best_match(&names, "zzz", |name| *name).copied(), Some("Workout"));

        let empty: [&str; 0] = [];
        assert!(best_match(&empty, "focus", |name| *name).is_none());
    }
}
