// Error kinds for the board core
//
// DuplicateIdentity is a caller bug and is never swallowed.
// NetworkFailure is recovered at the boundary (no snapshot change).
// An invalid category selection is not an error at all - it is clamped.

use crate::snapshot::{ItemId, Section};
use std::path::PathBuf;
use thiserror::Error;

/// Snapshot construction and lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The same identity appeared twice in one snapshot.
    #[error("duplicate item identity {id} in section {section}")]
    DuplicateIdentity { id: ItemId, section: Section },

    /// An identity that is not part of the committed snapshot.
    #[error("unknown item identity {0}")]
    UnknownItem(ItemId),
}

/// Fetch-level failure reported by the entry source collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("network failure: {reason}")]
pub struct NetworkFailure {
    pub reason: String,
}

impl NetworkFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        NetworkFailure {
            reason: reason.into(),
        }
    }
}

/// An edit script that does not fit the list it is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("index {index} out of range for list of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("inserted identity {0} is already present")]
    AlreadyPresent(ItemId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("logging already initialised")]
    AlreadyInitialised,
}
