use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag used for spans outside any entity.
pub const OUTSIDE_TAG: &str = "O";

/// A half-open `[start, end)` token range carrying a fine-grained tag.
///
/// Serializes as the `[start, end, "tag"]` triple used by the annotation tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize, String)", into = "(usize, usize, String)")]
pub struct Interval {
    /// First covered token.
    pub start: usize,
    /// One past the last covered token.
    pub end: usize,
    /// Fine-grained entity tag, or `O`.
    pub tag: String,
}

/// Interval-tagged label: the canonical label representation.
pub type Iit = Vec<Interval>;

impl Interval {
    /// Creates a new interval.
    pub fn new(start: usize, end: usize, tag: impl Into<String>) -> Self {
        Self {
            start,
            end,
            tag: tag.into(),
        }
    }

    /// Creates an `O` interval.
    pub fn outside(start: usize, end: usize) -> Self {
        Self::new(start, end, OUTSIDE_TAG)
    }

    /// Number of covered tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the interval covers no token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for `O` intervals.
    #[must_use]
    pub fn is_outside(&self) -> bool {
        self.tag == OUTSIDE_TAG
    }

    /// The untagged range of this interval.
    #[must_use]
    pub fn span(&self) -> SourceSpan {
        SourceSpan::new(self.start, self.end)
    }
}

impl From<(usize, usize, String)> for Interval {
    fn from((start, end, tag): (usize, usize, String)) -> Self {
        Self { start, end, tag }
    }
}

impl From<Interval> for (usize, usize, String) {
    fn from(interval: Interval) -> Self {
        (interval.start, interval.end, interval.tag)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.start, self.end, self.tag)
    }
}

/// A half-open range of token indices into a source sequence.
///
/// Rule trees hold spans instead of copied text so every node can be traced
/// back to the sentence it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Resolves the span against a character-tokenized sequence.
    ///
    /// Out-of-range indices are clamped to the sequence length.
    #[must_use]
    pub fn text(&self, seq: &str) -> String {
        seq.chars()
            .skip(self.start)
            .take(self.end.saturating_sub(self.start))
            .collect()
    }

    /// Resolves the span against an explicit token list.
    #[must_use]
    pub fn text_in<S: AsRef<str>>(&self, tokens: &[S]) -> String {
        let end = self.end.min(tokens.len());
        let start = self.start.min(end);
        tokens[start..end].iter().map(AsRef::as_ref).collect()
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One entry of a word-tag label: a text span and its tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct WordTag {
    pub word: String,
    pub tag: String,
}

impl WordTag {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
    }

    #[must_use]
    pub fn is_outside(&self) -> bool {
        self.tag == OUTSIDE_TAG
    }
}

impl From<(String, String)> for WordTag {
    fn from((word, tag): (String, String)) -> Self {
        Self { word, tag }
    }
}

impl From<WordTag> for (String, String) {
    fn from(wt: WordTag) -> Self {
        (wt.word, wt.tag)
    }
}
