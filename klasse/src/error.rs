//! Snapshot store errors

use std::{io, path::PathBuf};

use thiserror::Error;

/// Store result type
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while reading or writing captured payloads.
///
/// The grading and pool rules never fail, only the plumbing around them does.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("could not decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("could not encode snapshot: {0}")]
    Encode(#[from] ron::Error),

    #[error("{kind} {id} not found in snapshot store")]
    NotFound { kind: &'static str, id: String },

    #[error("file watcher failed: {0}")]
    Watch(#[from] notify::Error),
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
