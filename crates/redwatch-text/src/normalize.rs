//! Raw post/comment text → lowercase, markup-free, tokenized form.

use once_cell::sync::Lazy;
use regex::Regex;

/// Result of normalizing a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub tokens: Vec<String>,
    pub sentences: Vec<String>,
}

impl NormalizedText {
    /// Rebuild from already-normalized stored text. Tokens come from a
    /// whitespace split; sentences are not re-derived (the matcher does
    /// not use them).
    pub fn from_stored(text: &str) -> Self {
        Self {
            text: text.to_string(),
            tokens: text.split_whitespace().map(str::to_string).collect(),
            sentences: Vec::new(),
        }
    }
}

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("url regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("link regex"));
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold regex"));
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("italic regex"));
static STRIKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~(.+?)~~").expect("strike regex"));
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("code regex"));
static BLOCKQUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^>\s?").expect("quote regex"));
static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").expect("heading regex"));
static HR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[-*_]{3,}\s*$").expect("hr regex"));
static SUPERSCRIPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^(\S+)").expect("superscript regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9'-]+").expect("token regex"));

/// Normalize raw content text into a clean, matchable form.
///
/// Steps, in order: lowercase, strip markup, strip URLs, collapse
/// whitespace, tokenize (`[a-z0-9'-]+`), segment sentences on `.?!`
/// followed by whitespace. Empty or whitespace-only input yields the
/// empty result.
pub fn normalize(raw_text: &str) -> NormalizedText {
    if raw_text.trim().is_empty() {
        return NormalizedText::default();
    }

    let text = raw_text.to_lowercase();
    let text = strip_markup(&text);
    let text = URL_RE.replace_all(&text, "");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    let text = text.trim().to_string();

    let tokens = TOKEN_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect();
    let sentences = segment_sentences(&text);

    NormalizedText {
        text,
        tokens,
        sentences,
    }
}

/// Remove markdown-style formatting, keeping the inner text.
fn strip_markup(text: &str) -> String {
    let text = LINK_RE.replace_all(text, "$1");
    let text = BOLD_RE.replace_all(&text, "$1");
    let text = ITALIC_RE.replace_all(&text, "$1");
    let text = STRIKE_RE.replace_all(&text, "$1");
    let text = CODE_RE.replace_all(&text, "$1");
    let text = BLOCKQUOTE_RE.replace_all(&text, "");
    let text = HEADING_RE.replace_all(&text, "");
    let text = HR_RE.replace_all(&text, "");
    SUPERSCRIPT_RE.replace_all(&text, "$1").into_owned()
}

/// Split on `.`, `?` or `!` followed by whitespace, keeping the
/// punctuation with its sentence.
fn segment_sentences(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.get(i + 1).is_some_and(|n| n.is_whitespace()) {
            while chars.get(i + 1).is_some_and(|n| n.is_whitespace()) {
                i += 1;
            }
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
        i += 1;
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_result() {
        assert_eq!(normalize(""), NormalizedText::default());
        assert_eq!(normalize("   \n\t "), NormalizedText::default());
    }

    #[test]
    fn lowercases_and_collapses_whitespace() {
        let r = normalize("Hello   WORLD\n\nfoo\tbar");
        assert_eq!(r.text, "hello world foo bar");
        assert_eq!(r.tokens, vec!["hello", "world", "foo", "bar"]);
    }

    #[test]
    fn strips_links_keeping_label() {
        let r = normalize("check [this guide](https://example.com/a) out");
        assert_eq!(r.text, "check this guide out");
    }

    #[test]
    fn strips_bold_italic_strike_code() {
        let r = normalize("**bold** *italic* ~~gone~~ `code`");
        assert_eq!(r.text, "bold italic gone code");
    }

    #[test]
    fn strips_blockquotes_headings_rules() {
        let r = normalize("# Heading\n> quoted line\n---\nplain");
        assert_eq!(r.text, "heading quoted line plain");
    }

    #[test]
    fn strips_superscript_marker() {
        let r = normalize("that was fast^really");
        assert_eq!(r.text, "that was fastreally");
    }

    #[test]
    fn strips_bare_urls() {
        let r = normalize("see https://reddit.com/r/test/abc and http://foo.bar/x?q=1 now");
        assert_eq!(r.text, "see and now");
    }

    #[test]
    fn tokens_keep_contractions_hyphens_digits() {
        let r = normalize("don't risk-free 100 dollars!");
        assert_eq!(r.tokens, vec!["don't", "risk-free", "100", "dollars"]);
    }

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        let r = normalize("First one. Second one! Third? tail without end");
        assert_eq!(
            r.sentences,
            vec!["first one.", "second one!", "third?", "tail without end"]
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "**Bold** and [link](http://x.y) with https://z.example trailing",
            "# Title\n> quote\nSome *styled* text. More text!",
            "plain already normalized text",
        ] {
            let once = normalize(raw);
            let twice = normalize(&once.text);
            assert_eq!(once.text, twice.text);
            assert_eq!(once.tokens, twice.tokens);
        }
    }

    #[test]
    fn from_stored_splits_tokens_on_whitespace() {
        let n = NormalizedText::from_stored("alpha beta gamma");
        assert_eq!(n.tokens, vec!["alpha", "beta", "gamma"]);
        assert!(n.sentences.is_empty());
    }
}
