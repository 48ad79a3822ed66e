use thiserror::Error;

/// Errors produced when reading typed data out of a value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("unexpected value kind: expected {expected}, got {actual}")]
    UnexpectedKind {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("missing field: {0}")]
    MissingField(String),
}

/// Result alias for value conversions.
pub type ValueResult<T> = Result<T, ValueError>;
