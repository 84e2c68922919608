//! Suffix-stripping stemmer.
//!
//! Intentionally basic: just enough to match common morphological
//! variants (e.g. "betting" → "bet", "runs" → "run") without pulling in
//! a full stemming library. Deterministic: the same token always maps
//! to the same stem.

/// Suffixes tested in order; the first match whose removal leaves a
/// stem of at least 2 chars wins.
const SUFFIXES: [&str; 31] = [
    "ational", "tional", "enci", "anci", "izer", "ation", "ness", "ment", "ful", "less", "ive",
    "ous", "ing", "ble", "ally", "ity", "ies", "ied", "ers", "est", "ely", "ess", "ly", "er",
    "ed", "al", "es", "en", "ty", "ss", "s",
];

/// Stem a lowercase token. Tokens of 3 chars or fewer pass through
/// unchanged. After stripping, a doubled trailing consonant loses one
/// char ("betting" → "bett" → "bet").
pub fn stem(word: &str) -> String {
    let word_len = word.chars().count();
    if word_len <= 3 {
        return word.to_string();
    }

    for suffix in SUFFIXES {
        if word.ends_with(suffix) && word_len - suffix.len() >= 2 {
            let mut stem: Vec<char> = word[..word.len() - suffix.len()].chars().collect();
            if stem.len() >= 2
                && stem[stem.len() - 1] == stem[stem.len() - 2]
                && !matches!(stem[stem.len() - 1], 'a' | 'e' | 'i' | 'o' | 'u')
            {
                stem.pop();
            }
            return stem.into_iter().collect();
        }
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_tokens_pass_through() {
        assert_eq!(stem("bet"), "bet");
        assert_eq!(stem("is"), "is");
        assert_eq!(stem("a"), "a");
    }

    #[test]
    fn common_suffixes_stripped() {
        assert_eq!(stem("betting"), "bet");
        assert_eq!(stem("runs"), "run");
        assert_eq!(stem("bonuses"), "bonus");
        assert_eq!(stem("quickly"), "quick");
        assert_eq!(stem("payment"), "pay");
        assert_eq!(stem("happiness"), "happi");
    }

    #[test]
    fn doubled_consonant_dropped_after_strip() {
        assert_eq!(stem("stopped"), "stop");
        assert_eq!(stem("running"), "run");
    }

    #[test]
    fn vowel_double_is_kept() {
        // "agreed" strips "ed" leaving "agre" -- 'e' is a vowel so no drop
        assert_eq!(stem("agreed"), "agre");
    }

    #[test]
    fn stem_must_keep_two_chars() {
        // stripping "ing" from "wing" would leave one char, so the next
        // matching suffix wins instead
        assert_eq!(stem("wing"), "wing");
    }

    #[test]
    fn deterministic() {
        for w in ["gambling", "arbitrage", "strategies", "offers"] {
            assert_eq!(stem(w), stem(w));
        }
    }
}
