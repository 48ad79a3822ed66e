//! Error types for the diff crate.

use tp_types::ValueError;

/// Errors that can occur while decoding or applying an operation tree.
///
/// Comparison itself never fails: values that cannot be diffed finer than a
/// whole-value replacement simply produce a `Rpl` operation.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A wire node carried an `op` tag outside the closed tag vocabulary.
    #[error("unknown diff op: {0}")]
    UnknownTag(String),

    /// A wire node had a known tag but an unusable payload.
    #[error("malformed wire node: {0}")]
    MalformedWire(String),

    /// An operation was applied to a value of the wrong shape
    /// (e.g., a merge against a sequence).
    #[error("cannot apply {op} to {found}")]
    TypeMismatch { op: &'static str, found: &'static str },

    /// A sequence row addressed a slot past the end of the working copy.
    #[error("row position {position} out of range for sequence of length {len}")]
    PositionOutOfRange { position: usize, len: usize },

    /// The patch deleted the value it was applied to.
    #[error("patch removed the root value")]
    RootRemoved,

    /// A reconstruction hook rejected its payload.
    #[error("reconstruction failed: {0}")]
    Reconstruction(String),

    /// Reading typed data out of a value failed.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
