//! # Rulecheck Dataset
//!
//! Annotation corpus ingestion and BIO dataset export for the rulecheck
//! tagger. The annotation tool's JSON export is validated, reconciled
//! against its markup, split into train/val, and written as the
//! `sentences.txt` / `tags.txt` files the model reads.

pub mod corpus;
pub mod error;
pub mod export;

pub use corpus::{AnnotationRecord, Corpus, RecordUpdate, Split, text_hash};
pub use error::{DatasetError, Result};
pub use export::{EncodedExample, collect_tags, load_bio_dataset, sync_tags_file, write_split};
