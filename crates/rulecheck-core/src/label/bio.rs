//! # BIO Tags for Compliance-Rule Labeling
//!
//! Per-token tags in the BIO (Begin-Inside-Outside) scheme. The entity part
//! of a tag is an open string here; membership in the fixed tag vocabulary is
//! checked at corpus ingestion, not while converting labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RuleCheckError;
use crate::label::interval::OUTSIDE_TAG;

/// A BIO tag for a single token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BioTag {
    /// `B-<tag>`: first token of an entity.
    Begin(String),
    /// `I-<tag>`: continuation of the entity opened before it.
    Inside(String),
    /// `O`: token outside any entity.
    Outside,
}

impl BioTag {
    pub fn begin(tag: impl Into<String>) -> Self {
        BioTag::Begin(tag.into())
    }

    pub fn inside(tag: impl Into<String>) -> Self {
        BioTag::Inside(tag.into())
    }

    pub fn is_outside(&self) -> bool {
        matches!(self, BioTag::Outside)
    }

    /// Get the entity tag, if any.
    pub fn entity_tag(&self) -> Option<&str> {
        match self {
            BioTag::Begin(tag) | BioTag::Inside(tag) => Some(tag),
            BioTag::Outside => None,
        }
    }

    /// Turns an `I-` tag into the matching `B-` tag.
    #[must_use]
    pub fn promote(self) -> Self {
        match self {
            BioTag::Inside(tag) => BioTag::Begin(tag),
            other => other,
        }
    }
}

impl fmt::Display for BioTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BioTag::Begin(tag) => write!(f, "B-{tag}"),
            BioTag::Inside(tag) => write!(f, "I-{tag}"),
            BioTag::Outside => write!(f, "{OUTSIDE_TAG}"),
        }
    }
}

impl FromStr for BioTag {
    type Err = RuleCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == OUTSIDE_TAG {
            return Ok(BioTag::Outside);
        }
        match s.split_at_checked(2) {
            Some(("B-", tag)) if !tag.is_empty() => Ok(BioTag::begin(tag)),
            Some(("I-", tag)) if !tag.is_empty() => Ok(BioTag::inside(tag)),
            _ => Err(RuleCheckError::InvalidBioTag(s.to_string())),
        }
    }
}

impl TryFrom<String> for BioTag {
    type Error = RuleCheckError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BioTag> for String {
    fn from(tag: BioTag) -> Self {
        tag.to_string()
    }
}

/// Parses a whitespace-separated tag line such as `O B-prop I-prop`.
pub fn parse_bio_line(line: &str) -> Result<Vec<BioTag>, RuleCheckError> {
    line.split_whitespace().map(str::parse).collect()
}
