use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleCheckError};
use crate::label::BioTag;

/// Fine-grained entity kinds of the annotation scheme.
///
/// This is the closed tag vocabulary: annotated labels using anything else
/// are rejected at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Sub-object the rule is scoped to.
    #[serde(rename = "sobj")]
    SubObject,
    /// Object the rule applies to.
    #[serde(rename = "obj")]
    Object,
    /// Property being constrained.
    #[serde(rename = "prop")]
    Property,
    /// Comparator, e.g. "不应大于".
    #[serde(rename = "cmp")]
    Comparator,
    /// Restriction object of a requirement.
    #[serde(rename = "Robj")]
    RestrictionObject,
    /// Required property value.
    #[serde(rename = "Rprop")]
    RequiredProperty,
    /// Alternate or repeated required value.
    #[serde(rename = "aRprop")]
    AlternateRequiredProperty,
}

/// The fixed tag vocabulary, in annotation order.
pub const TAGS: [EntityKind; 7] = [
    EntityKind::SubObject,
    EntityKind::Object,
    EntityKind::Property,
    EntityKind::Comparator,
    EntityKind::RestrictionObject,
    EntityKind::RequiredProperty,
    EntityKind::AlternateRequiredProperty,
];

impl EntityKind {
    /// The tag as written in labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SubObject => "sobj",
            Self::Object => "obj",
            Self::Property => "prop",
            Self::Comparator => "cmp",
            Self::RestrictionObject => "Robj",
            Self::RequiredProperty => "Rprop",
            Self::AlternateRequiredProperty => "aRprop",
        }
    }

    /// Looks a tag up in the vocabulary.
    pub fn from_tag(tag: &str) -> Option<Self> {
        TAGS.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// Returns `true` if `tag` belongs to the vocabulary.
    pub fn is_known(tag: &str) -> bool {
        Self::from_tag(tag).is_some()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = RuleCheckError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_tag(s).ok_or_else(|| RuleCheckError::UnknownVocabularyEntry(s.to_string()))
    }
}

/// Ordered BIO tag set with the tag-id mapping shared with the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVocabulary {
    tags: Vec<BioTag>,
    index: HashMap<BioTag, usize>,
}

impl TagVocabulary {
    /// Builds a vocabulary from an ordered tag list.
    ///
    /// Duplicates keep their first id.
    pub fn new(tags: Vec<BioTag>) -> Self {
        let mut index = HashMap::with_capacity(tags.len());
        for (id, tag) in tags.iter().enumerate() {
            index.entry(tag.clone()).or_insert(id);
        }
        Self { tags, index }
    }

    /// `O` plus `B-`/`I-` for every kind in [`TAGS`], in canonical order.
    pub fn from_entity_kinds() -> Self {
        let mut tags = vec![BioTag::Outside];
        for kind in TAGS {
            tags.push(BioTag::begin(kind.as_str()));
            tags.push(BioTag::inside(kind.as_str()));
        }
        Self::from_unordered(tags)
    }

    /// Sorts tags canonically (`B-obj` orders as `objB-`) and builds the vocabulary.
    pub fn from_unordered(tags: impl IntoIterator<Item = BioTag>) -> Self {
        let mut tags: Vec<BioTag> = tags.into_iter().collect();
        tags.sort_by_key(canonical_key);
        tags.dedup();
        Self::new(tags)
    }

    /// Parses a `tags.txt` body: one tag per non-blank line.
    pub fn parse(text: &str) -> Result<Self> {
        let tags = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<BioTag>>>()?;
        Ok(Self::new(tags))
    }

    /// Renders the vocabulary as a `tags.txt` body.
    pub fn to_lines(&self) -> String {
        let mut out = String::new();
        for tag in &self.tags {
            out.push_str(&tag.to_string());
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[BioTag] {
        &self.tags
    }

    pub fn id_of(&self, tag: &BioTag) -> Option<usize> {
        self.index.get(tag).copied()
    }

    pub fn tag_of(&self, id: usize) -> Option<&BioTag> {
        self.tags.get(id)
    }

    /// Maps tags to ids.
    ///
    /// # Errors
    ///
    /// Returns `RuleCheckError::UnknownVocabularyEntry` for a tag not in the vocabulary.
    pub fn tags_to_ids(&self, tags: &[BioTag]) -> Result<Vec<usize>> {
        tags.iter()
            .map(|tag| {
                self.id_of(tag)
                    .ok_or_else(|| RuleCheckError::UnknownVocabularyEntry(tag.to_string()))
            })
            .collect()
    }

    /// Maps ids to tags.
    pub fn ids_to_tags(&self, ids: &[usize]) -> Result<Vec<BioTag>> {
        ids.iter()
            .map(|&id| {
                self.tag_of(id)
                    .cloned()
                    .ok_or_else(|| RuleCheckError::UnknownVocabularyEntry(id.to_string()))
            })
            .collect()
    }

    /// Maps ids to tags, skipping negative padding ids.
    pub fn decode_masked(&self, ids: &[i64]) -> Result<Vec<BioTag>> {
        let kept: Vec<usize> = ids
            .iter()
            .filter_map(|&id| usize::try_from(id).ok())
            .collect();
        self.ids_to_tags(&kept)
    }
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::from_entity_kinds()
    }
}

fn canonical_key(tag: &BioTag) -> String {
    match tag {
        BioTag::Begin(t) => format!("{t}B-"),
        BioTag::Inside(t) => format!("{t}I-"),
        BioTag::Outside => BioTag::Outside.to_string(),
    }
}
