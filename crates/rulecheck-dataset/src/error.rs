use std::path::{Path, PathBuf};

use rulecheck_core::{RuleCheckError, ValidationError};
use thiserror::Error;

/// Errors raised while reading, checking or writing datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A malformed line in a BIO dataset file.
    #[error("{}:{line}: {reason}", path.display())]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("split ratio {0} is not within [0, 1]")]
    InvalidRatio(f64),

    #[error(transparent)]
    Core(#[from] RuleCheckError),
}

impl DatasetError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this error must abort the whole run.
    ///
    /// I/O failures and corpus integrity violations are; a single bad
    /// sentence is not.
    #[must_use]
    pub fn is_batch_fatal(&self) -> bool {
        match self {
            Self::Core(err) => err.is_batch_fatal(),
            _ => true,
        }
    }
}

impl From<ValidationError> for DatasetError {
    fn from(err: ValidationError) -> Self {
        Self::Core(err.into())
    }
}

/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
