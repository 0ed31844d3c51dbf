use thiserror::Error;

use crate::grammar::SyntaxError;
use crate::label::{Interval, ShapeWarning};

/// Ingestion-time integrity violations.
///
/// These indicate systemic corruption of the annotated corpus and are the only
/// errors allowed to abort a whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A label uses a tag outside the fixed vocabulary.
    #[error("invalid tag {tag:?} in sequence #{text_id}")]
    UnknownTag {
        /// Hash identifier of the offending sequence.
        text_id: String,
        /// The rejected tag.
        tag: String,
    },

    /// Two records share the same content hash.
    #[error("hash collision: sequence #{text_id} occurs more than once")]
    DuplicateTextId {
        /// The duplicated hash identifier.
        text_id: String,
    },

    /// The source text contains `[` or `]`, which are reserved for slabel markup.
    #[error("sequence #{text_id} contains '[' or ']'")]
    ReservedBracket {
        /// Hash identifier of the offending sequence.
        text_id: String,
    },
}

/// Errors that can occur during rulecheck core operations.
#[derive(Debug, Error)]
pub enum RuleCheckError {
    /// Corpus integrity violation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A sequence rebuilt from word-tag pairs disagrees with the expected one.
    #[error("reconstructed sequence {found:?} does not match expected {expected:?}")]
    ReconstructionMismatch {
        /// The sequence the caller expected.
        expected: String,
        /// The sequence rebuilt from the label.
        found: String,
    },

    /// Slabel markup with nested or stray brackets.
    #[error("invalid slabel format at char {position}: {reason}")]
    InvalidSLabelFormat {
        /// Character offset into the slabel string.
        position: usize,
        /// What was wrong.
        reason: String,
    },

    /// Two intervals cover the same token, so no word order exists.
    #[error("overlapping intervals {previous} and {next}")]
    OverlappingIntervals {
        /// The earlier interval (by start).
        previous: Interval,
        /// The interval that starts inside `previous`.
        next: Interval,
    },

    /// A string that is not `O`, `B-<tag>` or `I-<tag>`.
    #[error("invalid BIO tag {0:?}")]
    InvalidBioTag(String),

    /// A tag or id with no entry in the tag vocabulary.
    #[error("tag {0:?} is not in the vocabulary")]
    UnknownVocabularyEntry(String),

    /// A shape problem escalated by strict mode.
    #[error("shape check failed: {0}")]
    Shape(ShapeWarning),

    /// The rule tree builder could not produce a tree for the sequence.
    #[error("no rule found: {0}")]
    NoRuleFound(SyntaxError),

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),
}

impl RuleCheckError {
    /// Whether this error must abort batch processing.
    ///
    /// Only vocabulary and hash integrity violations qualify; every other error
    /// concerns a single sequence.
    #[must_use]
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for rulecheck operations.
pub type Result<T> = std::result::Result<T, RuleCheckError>;
