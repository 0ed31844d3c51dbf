pub mod rule_tree;
pub mod vocab;

pub use rule_tree::{PrGroup, Property, PropertyRef, Requirement, RuleTree};
pub use vocab::{EntityKind, TAGS, TagVocabulary};
