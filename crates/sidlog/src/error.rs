//! Error types for recording sessions and chip adapters.
use std::io;

use thiserror::Error;

/// Configuration error local to one chip adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChipError {
    /// The host asked for a model identifier this recorder does not know.
    #[error("invalid SID model ({0})")]
    InvalidModel(u32),
}

/// A chip's clock source reported a time earlier than the chip's last access.
///
/// The scheduler only moves forward, so this is an internal consistency
/// failure and not something a caller can recover from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("clock moved backwards: now {now} < last access {last}")]
pub struct ClockRegression {
    pub now: u64,
    pub last: u64,
}

/// Failure of a recording session.
///
/// The session keeps the first failure it sees. Messages follow the form
/// `<label>: <cause> -- <output name>`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{label}: (open) {source} -- {name}")]
    Open {
        label: String,
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{label}: (write) {source} -- {name}")]
    Write {
        label: String,
        name: String,
        #[source]
        source: io::Error,
    },

    /// The OS accepted fewer bytes than requested.
    #[error("{label}: truncated <write> ({written} of {requested} bytes) -- {name}")]
    Truncated {
        label: String,
        name: String,
        written: usize,
        requested: usize,
    },

    #[error("{label}: (fsync) {source} -- {name}")]
    Sync {
        label: String,
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{label}: out of memory")]
    OutOfMemory { label: String },

    /// A chip refused its initial configuration while being created.
    #[error("{label}: {source}")]
    ChipInit {
        label: String,
        #[source]
        source: ChipError,
    },
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
