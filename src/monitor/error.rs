//! Error taxonomy for the monitoring engine.
//!
//! Per-line failures ([`Error::Parse`], [`Error::OutOfOrder`]) are recoverable:
//! the offending line is skipped and the stream continues. Configuration and
//! source-level failures are fatal and surfaced before or instead of
//! processing. Nothing in the engine panics on malformed external input.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A log line did not match the expected record format.
    #[error("malformed log line: {0}")]
    Parse(String),

    /// A record's timestamp precedes the newest record already stored.
    ///
    /// The store only ever grows forward in time; reordered input is dropped
    /// rather than silently re-sorted.
    #[error("request at {got} is older than the last stored request at {last}")]
    OutOfOrder { got: String, last: String },

    /// Invalid operating parameters supplied at construction.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The log source could not be opened or followed.
    #[error("log source unavailable: {0}")]
    Source(#[from] io::Error),
}

impl Error {
    /// Whether processing can continue past this error (skip the line).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Parse(_) | Error::OutOfOrder { .. })
    }
}
