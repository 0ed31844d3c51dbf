//! # Rulecheck Core
//!
//! Label representations and rule extraction for Chinese compliance-rule
//! sequence labeling. Converts between interval, BIO, word-tag and slabel
//! labels, and reduces a tagged sentence to a typed rule tree.
//!
//! ## Quick Start
//!
//! ```rust
//! use rulecheck_core::{Interval, LabelCodec, RuleTreeBuilder};
//!
//! let seq = "设计压力不应大于5MPa";
//! let iit = vec![
//!     Interval::new(0, 4, "prop"),
//!     Interval::new(4, 8, "cmp"),
//!     Interval::new(8, 12, "Rprop"),
//! ];
//!
//! let codec = LabelCodec::new().unwrap();
//! let slabel = codec.iit_to_slabel(&iit, seq).unwrap().into_value();
//! assert_eq!(slabel, "[设计压力/prop][不应大于/cmp][5MPa/Rprop]");
//!
//! let tree = RuleTreeBuilder::new().build_from_iit(&iit).unwrap();
//! assert_eq!(tree.properties()[0].name.text(seq), "设计压力");
//! ```
pub mod error;
pub mod grammar;
pub mod label;
pub mod pipeline;
pub mod rule;
pub mod text;
pub mod types;

// Re-export primary API
pub use error::{Result, RuleCheckError, ValidationError};
pub use grammar::{GrammarParser, GrammarToken, ParseTree, SyntaxError, Terminal};
pub use label::{
    BioTag, Checked, Iit, Interval, LabelCodec, RenderStyle, RenderedLabels, ShapeWarning,
    SourceSpan, WordTag, clean_seq_label, parse_bio_line,
};
pub use pipeline::{Extraction, Pipeline, PipelineConfig, TrainingPair};
pub use rule::RuleTreeBuilder;
pub use text::{CharTokenizer, clean_sentence};
pub use types::{
    EntityKind, PrGroup, Property, PropertyRef, Requirement, RuleTree, TAGS, TagVocabulary,
};
