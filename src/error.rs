//! Error types for keydash

use std::path::PathBuf;

use thiserror::Error;

/// Invalid inputs to the metric functions and target text construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("target text must not be empty")]
    EmptyTarget,

    #[error("target text contains an untypable character {0:?}")]
    UntypableTarget(char),
}

/// Failures while persisting or rebuilding results
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("signing key {} is not valid hex: {source}", path.display())]
    KeyEncoding {
        path: PathBuf,
        #[source]
        source: hex::FromHexError,
    },

    #[error("signing key must not be empty")]
    InvalidKey,
}

impl StoreError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// A verified record or summary line that does not have the expected labels
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing {0:?} line")]
    MissingLabel(&'static str),

    #[error("malformed {label:?} value {value:?}")]
    Malformed { label: &'static str, value: String },
}

/// Sentence bank lookup failures
#[derive(Debug, Error)]
pub enum SentenceError {
    #[error("no sentence number {index} (choose 1-{available})")]
    OutOfRange { index: usize, available: usize },

    #[error("bundled sentence data is unreadable: {0}")]
    Bundle(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
