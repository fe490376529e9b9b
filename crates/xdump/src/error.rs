//! Error types for the extraction engine.
//!
//! Bounded-read failures are not modeled as errors at all: they turn into
//! [`crate::parsers::RejectReason`] at the parser/reader boundary. Only
//! container-level and programming-invariant failures propagate as `Err`.

use thiserror::Error;

/// Raised by [`crate::binary::BinaryReader`] when a read window exceeds
/// the underlying slice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("read of {len} bytes at offset {offset} exceeds bounds (available {available})")]
pub struct OutOfBoundsError {
    pub offset: u64,
    pub len: u64,
    pub available: u64,
}

/// Errors from [`crate::dump::DumpSource`].
#[derive(Error, Debug)]
pub enum DumpError {
    #[error("I/O error opening dump: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    OutOfBounds(#[from] OutOfBoundsError),
}

/// Errors from [`crate::dump::MinidumpIndex`].
///
/// `MalformedContainer` is the only fatal kind from this component;
/// everything else that could go wrong while parsing one stream is
/// absorbed and yields an empty/partial index instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MinidumpError {
    #[error("malformed minidump container: {0}")]
    MalformedContainer(String),
}

/// Errors surfaced by [`crate::runtime::RuntimeStructReader`] that are not
/// plain rejections — i.e. conditions the caller wants to count, not just
/// silently drop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("pointer {va:#x} does not resolve to a file offset")]
    UnresolvedTarget { va: u64 },

    #[error(transparent)]
    OutOfBounds(#[from] OutOfBoundsError),
}

/// Top-level error for the orchestrator. Only these two kinds are fatal:
/// `InternalInvariantViolation`, and `MalformedContainer` from minidump
/// parsing, which this wraps.
#[derive(Error, Debug)]
pub enum CarveError {
    #[error(transparent)]
    Minidump(#[from] MinidumpError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("internal invariant violation: {0}")]
    InternalInvariantViolation(String),
}

pub type Result<T, E = CarveError> = std::result::Result<T, E>;
