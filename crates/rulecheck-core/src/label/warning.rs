use std::fmt;

use serde::Serialize;

use crate::error::{Result, RuleCheckError};
use crate::label::interval::Interval;

/// A recoverable shape problem found while converting labels.
///
/// Each one is resolved locally (clamping, truncation, promotion) and the
/// conversion carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeWarning {
    /// An interval reached past the end of the sequence and was clamped.
    IntervalClamped { interval: Interval, seq_len: usize },
    /// An interval covered no token and produced no tags.
    EmptyInterval { interval: Interval },
    /// An interval started inside the previous one and was trimmed.
    OverlapTrimmed { interval: Interval, previous_end: usize },
    /// Tag stream and sequence lengths differ; the longer was truncated.
    LengthMismatch { labels: usize, seq: usize },
    /// An `I-` tag with no open entity of its type was promoted to `B-`.
    OrphanInside { index: usize, tag: String },
}

impl fmt::Display for ShapeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntervalClamped { interval, seq_len } => {
                write!(f, "interval {interval} clamped to sequence length {seq_len}")
            }
            Self::EmptyInterval { interval } => write!(f, "interval {interval} is empty"),
            Self::OverlapTrimmed {
                interval,
                previous_end,
            } => write!(f, "interval {interval} overlaps previous end {previous_end}"),
            Self::LengthMismatch { labels, seq } => {
                write!(f, "label/seq length mismatch ({labels}/{seq})")
            }
            Self::OrphanInside { index, tag } => {
                write!(f, "I-{tag} at token {index} has no preceding B-{tag}")
            }
        }
    }
}

/// A conversion result together with the shape warnings raised on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checked<T> {
    pub value: T,
    pub warnings: Vec<ShapeWarning>,
}

impl<T> Checked<T> {
    /// Wraps a value, logging every warning.
    pub(crate) fn new(value: T, warnings: Vec<ShapeWarning>) -> Self {
        for warning in &warnings {
            tracing::warn!(%warning, "recovered label shape problem");
        }
        Self { value, warnings }
    }

    /// Returns `true` if no warning was raised.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Drops the warnings.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Fails on the first warning instead of accepting the recovery.
    pub fn into_strict(self) -> Result<T> {
        match self.warnings.into_iter().next() {
            Some(warning) => Err(RuleCheckError::Shape(warning)),
            None => Ok(self.value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Checked<U> {
        Checked {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}
