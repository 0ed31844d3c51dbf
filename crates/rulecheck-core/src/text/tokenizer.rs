//! # Character Tokenizer
//!
//! Chinese regulatory text is labeled per character, so every `char` is a
//! token and label indices count these tokens.

/// Character-level tokenizer.
#[derive(Debug, Clone, Default)]
pub struct CharTokenizer;

impl CharTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Splits `input` into one token per character, whitespace included.
    ///
    /// # Examples
    /// ```
    /// use rulecheck_core::text::CharTokenizer;
    ///
    /// let tokens = CharTokenizer::new().tokenize_to_strings("压力 5MPa");
    /// assert_eq!(tokens.len(), 7);
    /// assert_eq!(tokens[2], " ");
    /// ```
    pub fn tokenize_to_strings(&self, input: &str) -> Vec<String> {
        input.chars().map(String::from).collect()
    }
}

/// Normalizes a raw, unlabeled sentence before tagging.
///
/// A leading clause number such as `1.2.3 ` (all ASCII before the first
/// space) is dropped, then every space is removed.
pub fn clean_sentence(raw: &str) -> String {
    let line = raw.trim_end_matches(['\r', '\n']);
    let body = match line.split_once(' ') {
        Some((prefix, rest)) if prefix.is_ascii() => rest,
        _ => line,
    };
    body.replace(' ', "")
}
