//! Proximity keyword matcher.
//!
//! Checks normalized content against a rule's phrase set, verifying that
//! phrase tokens appear within a configurable proximity window. Supports
//! OR groups, exclusions with two scopes, ordering constraints, and
//! optional stemming.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::normalize::NormalizedText;
use crate::stem::stem;

/// Where exclusion terms suppress a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionScope {
    /// Any exclusion token anywhere in the content kills every match.
    #[default]
    Anywhere,
    /// Exclusion tokens only kill occurrences they fall within one
    /// window of.
    Proximity,
}

impl std::fmt::Display for ExclusionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionScope::Anywhere => write!(f, "anywhere"),
            ExclusionScope::Proximity => write!(f, "proximity"),
        }
    }
}

impl std::str::FromStr for ExclusionScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "anywhere" => Ok(ExclusionScope::Anywhere),
            "proximity" => Ok(ExclusionScope::Proximity),
            other => Err(format!("unknown exclusion scope: {other}")),
        }
    }
}

/// Matcher-side view of a keyword rule.
///
/// `phrases` is an OR group: any phrase satisfying its constraints
/// yields a match. Each phrase is a token sequence; multi-token phrases
/// must land inside `proximity_window`.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    pub phrases: Vec<Vec<String>>,
    pub exclusions: Vec<String>,
    pub proximity_window: usize,
    pub require_order: bool,
    pub use_stemming: bool,
    pub exclusion_scope: ExclusionScope,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            phrases: Vec::new(),
            exclusions: Vec::new(),
            proximity_window: 15,
            require_order: false,
            use_stemming: false,
            exclusion_scope: ExclusionScope::Anywhere,
        }
    }
}

/// A single occurrence found in content. Offsets are char indices into
/// the normalized text.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchHit {
    /// Space-joined tokens of the phrase definition (not the matched
    /// text itself).
    pub matched_phrase: String,
    pub span_start: usize,
    pub span_end: usize,
    pub snippet: String,
    pub proximity_score: f64,
}

/// Length of the snippet window, in chars.
const SNIPPET_LEN: usize = 200;

/// Convert the storage form (whitespace-joined phrase strings) into the
/// matcher form (token lists).
pub fn tokenize_phrases(phrases: &[String]) -> Vec<Vec<String>> {
    phrases
        .iter()
        .map(|p| p.split_whitespace().map(str::to_string).collect())
        .collect()
}

/// Find all occurrences of a rule's phrases in normalized content.
///
/// Per phrase: locate token occurrences, run the proximity/ordering
/// combination search, filter by exclusions, then attach snippet and
/// score to each surviving occurrence.
pub fn find_matches(content: &NormalizedText, rule: &RuleConfig) -> Vec<MatchHit> {
    if content.text.is_empty() || content.tokens.is_empty() {
        return Vec::new();
    }

    let tokens = &content.tokens;
    let text = &content.text;
    let token_offsets = token_char_offsets(tokens, text);

    let stemmed_tokens: Vec<String> = if rule.use_stemming {
        tokens.iter().map(|t| stem(t)).collect()
    } else {
        tokens.clone()
    };

    // Anywhere-scoped exclusions short-circuit the whole rule.
    if !rule.exclusions.is_empty() && rule.exclusion_scope == ExclusionScope::Anywhere {
        let exclusion_set = exclusion_terms(&rule.exclusions, rule.use_stemming);
        if stemmed_tokens.iter().any(|t| exclusion_set.contains(t)) {
            return Vec::new();
        }
    }

    let mut results = Vec::new();

    for phrase_tokens in &rule.phrases {
        if phrase_tokens.is_empty() {
            continue;
        }

        let phrase_lower: Vec<String> = phrase_tokens.iter().map(|t| t.to_lowercase()).collect();
        let phrase_stemmed: Vec<String> = if rule.use_stemming {
            phrase_lower.iter().map(|t| stem(t)).collect()
        } else {
            phrase_lower
        };

        let occurrences = find_phrase_occurrences(
            &stemmed_tokens,
            &phrase_stemmed,
            rule.proximity_window,
            rule.require_order,
        );

        for indices in occurrences {
            if !rule.exclusions.is_empty()
                && rule.exclusion_scope == ExclusionScope::Proximity
                && has_proximity_exclusion(
                    &stemmed_tokens,
                    tokens,
                    &indices,
                    &rule.exclusions,
                    rule.proximity_window,
                    rule.use_stemming,
                )
            {
                continue;
            }

            let (Some(&first), Some(&last)) = (indices.first(), indices.last()) else {
                continue;
            };
            let span_start = token_offsets[first];
            let span_end = token_offsets[last] + tokens[last].chars().count();

            results.push(MatchHit {
                matched_phrase: phrase_tokens.join(" "),
                span_start,
                span_end,
                snippet: build_snippet(text, span_start, span_end),
                proximity_score: proximity_score(&indices),
            });
        }
    }

    results
}

/// Map token index → char offset of that token in `text`, walking the
/// text with a cursor so repeated tokens resolve to successive
/// occurrences.
fn token_char_offsets(tokens: &[String], text: &str) -> Vec<usize> {
    let mut positions = Vec::with_capacity(tokens.len());
    let mut cursor_bytes = 0usize;
    let mut cursor_chars = 0usize;

    for token in tokens {
        let rest = &text[cursor_bytes..];
        match rest.find(token.as_str()) {
            Some(rel) => {
                let char_pos = cursor_chars + rest[..rel].chars().count();
                positions.push(char_pos);
                cursor_bytes += rel + token.len();
                cursor_chars = char_pos + token.chars().count();
            }
            None => {
                // Tokens are substrings of the text they were cut from;
                // fall back to the cursor if that ever fails to hold.
                positions.push(cursor_chars);
            }
        }
    }
    positions
}

fn exclusion_terms(exclusions: &[String], use_stemming: bool) -> HashSet<String> {
    exclusions
        .iter()
        .map(|e| {
            let lowered = e.to_lowercase();
            if use_stemming {
                stem(&lowered)
            } else {
                lowered
            }
        })
        .collect()
}

/// All occurrences of one phrase within the token list.
///
/// Single-token phrases match at every position holding the token.
/// Multi-token phrases anchor on each occurrence of the first token and
/// search depth-first for one valid combination per anchor.
fn find_phrase_occurrences(
    stemmed_tokens: &[String],
    phrase: &[String],
    proximity_window: usize,
    require_order: bool,
) -> Vec<Vec<usize>> {
    if phrase.len() == 1 {
        let target = &phrase[0];
        return stemmed_tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| *t == target)
            .map(|(i, _)| vec![i])
            .collect();
    }

    let mut token_positions: Vec<Vec<usize>> = Vec::with_capacity(phrase.len());
    for pt in phrase {
        let positions: Vec<usize> = stemmed_tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| *t == pt)
            .map(|(i, _)| i)
            .collect();
        if positions.is_empty() {
            // A required token is missing entirely.
            return Vec::new();
        }
        token_positions.push(positions);
    }

    let mut matches = Vec::new();
    for &anchor in &token_positions[0] {
        if let Some(combo) = extend_combination(
            &token_positions,
            proximity_window,
            require_order,
            &[anchor],
            1,
        ) {
            matches.push(combo);
        }
    }
    matches
}

/// Depth-first assignment of the remaining phrase tokens. Returns the
/// first combination where the index span stays strictly under the
/// window, ordering holds if required, and no position is reused.
fn extend_combination(
    token_positions: &[Vec<usize>],
    proximity_window: usize,
    require_order: bool,
    current: &[usize],
    depth: usize,
) -> Option<Vec<usize>> {
    if depth >= token_positions.len() {
        return Some(current.to_vec());
    }

    for &pos in &token_positions[depth] {
        let mut all = current.to_vec();
        all.push(pos);

        let lo = all.iter().copied().min().unwrap_or(pos);
        let hi = all.iter().copied().max().unwrap_or(pos);
        if hi - lo >= proximity_window {
            continue;
        }
        if require_order && current.last().is_some_and(|&prev| pos <= prev) {
            continue;
        }
        if current.contains(&pos) {
            continue;
        }

        if let Some(result) =
            extend_combination(token_positions, proximity_window, require_order, &all, depth + 1)
        {
            return Some(result);
        }
    }
    None
}

/// True when an exclusion token falls within one window of the matched
/// index range (`[min−W, max+W]`, clamped to the token list).
fn has_proximity_exclusion(
    stemmed_tokens: &[String],
    tokens: &[String],
    matched_indices: &[usize],
    exclusions: &[String],
    window: usize,
    use_stemming: bool,
) -> bool {
    let exclusion_set = exclusion_terms(exclusions, use_stemming);
    let check_tokens = if use_stemming { stemmed_tokens } else { tokens };

    let lo = matched_indices.iter().copied().min().unwrap_or(0);
    let hi = matched_indices.iter().copied().max().unwrap_or(0);
    let start = lo.saturating_sub(window);
    let end = (hi + window + 1).min(check_tokens.len());

    check_tokens[start..end]
        .iter()
        .any(|t| exclusion_set.contains(t))
}

/// 1.0 for single tokens or adjacent spans, otherwise the minimal span
/// over the actual span, floored at 0.1.
fn proximity_score(matched_indices: &[usize]) -> f64 {
    if matched_indices.len() <= 1 {
        return 1.0;
    }

    let lo = matched_indices.iter().copied().min().unwrap_or(0);
    let hi = matched_indices.iter().copied().max().unwrap_or(0);
    let span = hi - lo;
    let min_span = matched_indices.len() - 1;

    if span <= min_span {
        1.0
    } else {
        (min_span as f64 / span as f64).max(0.1)
    }
}

/// 200-char window centered on the match midpoint, with `"..."`
/// overwriting the truncated ends. Text that already fits is returned
/// unchanged.
fn build_snippet(text: &str, span_start: usize, span_end: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= SNIPPET_LEN {
        return text.to_string();
    }

    let center = (span_start + span_end) / 2;
    let mut start = center.saturating_sub(SNIPPET_LEN / 2);
    let mut end = start + SNIPPET_LEN;
    if end > chars.len() {
        end = chars.len();
        start = end.saturating_sub(SNIPPET_LEN);
    }

    let mut snippet: Vec<char> = chars[start..end].to_vec();
    if start > 0 {
        for (i, c) in "...".chars().enumerate() {
            snippet[i] = c;
        }
    }
    if end < chars.len() {
        let n = snippet.len();
        for (i, c) in "...".chars().enumerate() {
            snippet[n - 3 + i] = c;
        }
    }
    snippet.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn rule(phrases: &[&str]) -> RuleConfig {
        RuleConfig {
            phrases: tokenize_phrases(
                &phrases.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            ),
            ..RuleConfig::default()
        }
    }

    #[test]
    fn single_token_hit_scores_one() {
        let content = normalize("I love arbitrage betting strategies");
        let hits = find_matches(&content, &rule(&["arbitrage"]));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched_phrase, "arbitrage");
        assert_eq!(hits[0].proximity_score, 1.0);
    }

    #[test]
    fn multi_token_within_window() {
        let content = normalize("arbitrage is a common strategy in sports betting");
        let hits = find_matches(&content, &rule(&["arbitrage betting"]));
        assert_eq!(hits.len(), 1);
        assert!(hits[0].proximity_score < 1.0);
        assert!(hits[0].proximity_score >= 0.1);
    }

    #[test]
    fn out_of_window_yields_nothing() {
        let filler = "word ".repeat(20);
        let content = normalize(&format!("arbitrage {filler}betting"));
        let mut r = rule(&["arbitrage betting"]);
        r.proximity_window = 5;
        assert!(find_matches(&content, &r).is_empty());
    }

    #[test]
    fn window_bound_is_strict() {
        // Indices 0 and 5: span 5 fails at W=5, passes at W=6.
        let content = normalize("arbitrage a b c d betting");
        let mut r = rule(&["arbitrage betting"]);
        r.proximity_window = 5;
        assert!(find_matches(&content, &r).is_empty());
        r.proximity_window = 6;
        assert_eq!(find_matches(&content, &r).len(), 1);
    }

    #[test]
    fn window_monotonicity() {
        let content = normalize("arbitrage one two three betting more words here");
        let mut windows_matched = Vec::new();
        for w in 1..=20 {
            let mut r = rule(&["arbitrage betting"]);
            r.proximity_window = w;
            windows_matched.push(!find_matches(&content, &r).is_empty());
        }
        // Once a window matches, every larger window matches.
        let first = windows_matched.iter().position(|&m| m);
        if let Some(first) = first {
            assert!(windows_matched[first..].iter().all(|&m| m));
        }
    }

    #[test]
    fn anywhere_exclusion_suppresses_all() {
        let content = normalize("arbitrage betting is a scam");
        let mut r = rule(&["arbitrage betting"]);
        r.exclusions = vec!["scam".into()];
        assert!(find_matches(&content, &r).is_empty());
    }

    #[test]
    fn proximity_exclusion_only_hits_nearby() {
        let mut r = rule(&["arbitrage betting"]);
        r.exclusions = vec!["scam".into()];
        r.exclusion_scope = ExclusionScope::Proximity;
        r.proximity_window = 3;

        let near = normalize("arbitrage betting scam");
        assert!(find_matches(&near, &r).is_empty());

        let filler = "word ".repeat(10);
        let far = normalize(&format!("arbitrage betting good {filler}scam"));
        assert_eq!(find_matches(&far, &r).len(), 1);
    }

    #[test]
    fn require_order_enforced() {
        let content = normalize("betting on arbitrage opportunities");
        let mut r = rule(&["arbitrage betting"]);
        r.require_order = true;
        assert!(find_matches(&content, &r).is_empty());

        r.require_order = false;
        assert_eq!(find_matches(&content, &r).len(), 1);
    }

    #[test]
    fn ordered_hits_have_increasing_indices() {
        let content = normalize("first arbitrage then some betting follows");
        let mut r = rule(&["arbitrage betting"]);
        r.require_order = true;
        let hits = find_matches(&content, &r);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].span_start < hits[0].span_end);
    }

    #[test]
    fn stemming_matches_variants() {
        let content = normalize("they were betting heavily on it");
        let mut r = rule(&["bet"]);
        r.use_stemming = true;
        let hits = find_matches(&content, &r);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched_phrase, "bet");
    }

    #[test]
    fn stemming_applies_to_exclusions() {
        let content = normalize("arbitrage scams everywhere");
        let mut r = rule(&["arbitrage"]);
        r.exclusions = vec!["scamming".into()];
        r.use_stemming = true;
        // "scams" and "scamming" share the stem "scam"
        assert!(find_matches(&content, &r).is_empty());
    }

    #[test]
    fn or_group_any_phrase_matches() {
        let content = normalize("big parlay win today");
        let hits = find_matches(&content, &rule(&["arbitrage", "parlay"]));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched_phrase, "parlay");
    }

    #[test]
    fn missing_token_means_no_match() {
        let content = normalize("plain conversation about sports");
        assert!(find_matches(&content, &rule(&["arbitrage betting"])).is_empty());
    }

    #[test]
    fn repeated_single_token_yields_multiple_hits() {
        let content = normalize("bonus here and bonus there");
        let hits = find_matches(&content, &rule(&["bonus"]));
        assert_eq!(hits.len(), 2);
        assert!(hits[0].span_start < hits[1].span_start);
    }

    #[test]
    fn span_covers_matched_tokens() {
        let content = normalize("I love arbitrage betting strategies");
        let hits = find_matches(&content, &rule(&["arbitrage"]));
        let span = &content.text[hits[0].span_start..hits[0].span_end];
        assert_eq!(span, "arbitrage");
    }

    #[test]
    fn short_text_snippet_is_unchanged() {
        let content = normalize("short text with arbitrage inside");
        let hits = find_matches(&content, &rule(&["arbitrage"]));
        assert_eq!(hits[0].snippet, content.text);
    }

    #[test]
    fn long_text_snippet_is_200_chars_with_ellipses() {
        let prefix = "lead ".repeat(60);
        let suffix = " tail".repeat(60);
        let content = normalize(&format!("{prefix}arbitrage{suffix}"));
        let hits = find_matches(&content, &rule(&["arbitrage"]));
        let snippet = &hits[0].snippet;
        assert_eq!(snippet.chars().count(), 200);
        assert!(snippet.starts_with("..."));
        assert!(snippet.ends_with("..."));
        assert!(snippet.contains("arbitrage"));
    }

    #[test]
    fn adjacent_tokens_score_one() {
        let content = normalize("pure arbitrage betting now");
        let hits = find_matches(&content, &rule(&["arbitrage betting"]));
        assert_eq!(hits[0].proximity_score, 1.0);
    }

    #[test]
    fn score_floors_at_point_one() {
        let filler = "pad ".repeat(13);
        let content = normalize(&format!("arbitrage {filler}betting"));
        let mut r = rule(&["arbitrage betting"]);
        r.proximity_window = 50;
        let hits = find_matches(&content, &r);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].proximity_score >= 0.1);
    }

    #[test]
    fn empty_content_matches_nothing() {
        let content = NormalizedText::default();
        assert!(find_matches(&content, &rule(&["anything"])).is_empty());
    }

    #[test]
    fn tokenize_phrases_splits_on_whitespace() {
        let phrases = tokenize_phrases(&["risk free  bet".to_string(), "promo".to_string()]);
        assert_eq!(
            phrases,
            vec![
                vec!["risk".to_string(), "free".to_string(), "bet".to_string()],
                vec!["promo".to_string()],
            ]
        );
    }
}
