//! # Annotation Corpus
//!
//! The annotation tool exports one JSON array of records:
//!
//! ```json
//! [{"text_id": "…", "text": "…", "label": [[0, 4, "prop"]], "slabel": "[…/prop]…"}]
//! ```
//!
//! Hand edits usually land in `slabel`, so on disagreement the markup wins
//! over the interval label.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rulecheck_core::{EntityKind, Iit, LabelCodec, RuleCheckError, ValidationError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{DatasetError, Result};

/// One annotated sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Content hash of `text`.
    pub text_id: String,
    pub text: String,
    pub label: Iit,
    pub slabel: String,
}

impl AnnotationRecord {
    /// Builds a record whose id and markup are derived from `text` and `label`.
    pub fn new(codec: &LabelCodec, text: impl Into<String>, label: Iit) -> Result<Self> {
        let text = text.into();
        let slabel = codec.iit_to_slabel(&label, &text)?.into_value();
        Ok(Self {
            text_id: text_hash(&text),
            text,
            label,
            slabel,
        })
    }
}

/// Hex SHA-256 digest of a sentence.
pub fn text_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// A change made by [`Corpus::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RecordUpdate {
    /// The interval label was rebuilt from the record's markup.
    LabelFromSlabel { text_id: String },
    /// The stored id did not match the text hash.
    TextId { from: String, to: String },
}

/// Train and validation partitions.
#[derive(Debug, Clone, Default)]
pub struct Split {
    pub train: Vec<AnnotationRecord>,
    pub val: Vec<AnnotationRecord>,
}

/// An annotated corpus.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<AnnotationRecord>,
}

impl Corpus {
    pub fn new(records: Vec<AnnotationRecord>) -> Self {
        Self { records }
    }

    /// Loads the annotation JSON, dropping records with an empty label.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        let records: Vec<AnnotationRecord> =
            serde_json::from_str(&raw).map_err(|e| DatasetError::json(path, e))?;

        let total = records.len();
        let records: Vec<_> = records.into_iter().filter(|r| !r.label.is_empty()).collect();
        info!(
            path = %path.display(),
            kept = records.len(),
            dropped = total - records.len(),
            "loaded annotation corpus"
        );
        Ok(Self { records })
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AnnotationRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checks corpus integrity.
    ///
    /// # Errors
    ///
    /// The first violation found: a text containing `[` or `]`, a duplicated
    /// `text_id`, or a label tag outside the vocabulary.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if let Some(record) = self
            .records
            .iter()
            .find(|r| r.text.contains(['[', ']']))
        {
            return Err(ValidationError::ReservedBracket {
                text_id: record.text_id.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(self.records.len());
        for record in &self.records {
            if !seen.insert(record.text_id.as_str()) {
                return Err(ValidationError::DuplicateTextId {
                    text_id: record.text_id.clone(),
                });
            }
        }

        for record in &self.records {
            if let Some(iv) = record.label.iter().find(|iv| !EntityKind::is_known(&iv.tag)) {
                return Err(ValidationError::UnknownTag {
                    text_id: record.text_id.clone(),
                    tag: iv.tag.clone(),
                });
            }
        }

        Ok(())
    }

    /// Brings labels and ids in line with the markup and text.
    ///
    /// A record whose label renders to different markup than its `slabel`
    /// gets its label rebuilt from the `slabel`. Ids are then refreshed to
    /// the hash of the text, and the result is validated again.
    ///
    /// # Errors
    ///
    /// `ReconstructionMismatch` if the markup does not spell the record's
    /// text, slabel format errors from parsing the markup, and any
    /// [`validate`](Self::validate) failure of the reconciled corpus.
    pub fn reconcile(&mut self, codec: &LabelCodec) -> Result<Vec<RecordUpdate>> {
        let mut updates = Vec::new();

        for record in &mut self.records {
            let derived = codec.iit_to_slabel(&record.label, &record.text)?.into_value();
            if derived == record.slabel {
                continue;
            }

            let (label, seq) = codec.slabel_to_iit(&record.slabel, false)?;
            if seq != record.text {
                return Err(RuleCheckError::ReconstructionMismatch {
                    expected: record.text.clone(),
                    found: seq,
                }
                .into());
            }
            info!(text_id = %record.text_id, "label updated from slabel");
            record.label = label;
            updates.push(RecordUpdate::LabelFromSlabel {
                text_id: record.text_id.clone(),
            });
        }

        for record in &mut self.records {
            let hash = text_hash(&record.text);
            if hash != record.text_id {
                info!(from = %record.text_id, to = %hash, "text id refreshed");
                updates.push(RecordUpdate::TextId {
                    from: std::mem::replace(&mut record.text_id, hash.clone()),
                    to: hash,
                });
            }
        }

        self.validate()?;
        Ok(updates)
    }

    /// Writes the corpus as indented JSON, keeping the previous file as `<path>.bak`.
    pub fn save_with_backup(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            let backup = backup_path(path);
            if backup.exists() {
                fs::remove_file(&backup).map_err(|e| DatasetError::io(&backup, e))?;
            }
            fs::rename(path, &backup).map_err(|e| DatasetError::io(path, e))?;
            info!(backup = %backup.display(), "previous corpus backed up");
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.records
            .serialize(&mut ser)
            .map_err(|e| DatasetError::json(path, e))?;

        let mut file = fs::File::create(path).map_err(|e| DatasetError::io(path, e))?;
        file.write_all(&buf).map_err(|e| DatasetError::io(path, e))?;
        Ok(())
    }

    /// Shuffles deterministically and cuts the first `train_ratio` share off as training data.
    pub fn split(&self, train_ratio: f64, seed: u64) -> Result<Split> {
        if !(0.0..=1.0).contains(&train_ratio) {
            return Err(DatasetError::InvalidRatio(train_ratio));
        }

        let mut records = self.records.clone();
        let mut rng = oorandom::Rand64::new(u128::from(seed));
        for i in (1..records.len()).rev() {
            let j = rng.rand_range(0..(i as u64 + 1)) as usize;
            records.swap(i, j);
        }

        let n_train = (records.len() as f64 * train_ratio) as usize;
        let val = records.split_off(n_train);
        if val.is_empty() && !records.is_empty() {
            warn!("validation split is empty");
        }
        Ok(Split {
            train: records,
            val,
        })
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}
