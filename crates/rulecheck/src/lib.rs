//! # Rulecheck
//!
//! Turns BIO-tagged regulatory sentences into structured compliance rules.
//!
//! The label codec, grammar and rule-tree builder live in
//! [`rulecheck_core`] and are re-exported at the root; corpus ingestion
//! and dataset export are under [`dataset`].

pub use rulecheck_core::*;
pub use rulecheck_dataset as dataset;
