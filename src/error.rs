//! Error types for every store operation.

use std::fmt;

use thiserror::Error;

use crate::data_type::DataType;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [Error], reported to callers by the
/// operation guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A table with the same name already exists.
    AlreadyExists,
    /// The table does not exist.
    NotFound,
    /// A column spec is not `<name>:<type>` or repeats a column.
    MalformedColumnSpec,
    /// A column spec names a type outside the supported set.
    UnknownType,
    /// The number of inserted values differs from the number of columns.
    ArityMismatch,
    /// A value cannot be stored in its column.
    InvalidValue,
    /// A table name cannot be used as a storage key.
    InvalidName,
    /// The storage layer failed to read, write or decode data.
    PersistenceFailure,
    /// Anything else.
    Unexpected,
}

impl ErrorKind {
    /// Returns a short human-readable label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AlreadyExists => "already exists",
            Self::NotFound => "not found",
            Self::MalformedColumnSpec => "malformed column spec",
            Self::UnknownType => "unknown type",
            Self::ArityMismatch => "wrong number of values",
            Self::InvalidValue => "invalid value",
            Self::InvalidName => "invalid name",
            Self::PersistenceFailure => "persistence failure",
            Self::Unexpected => "unexpected error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when raw text cannot be converted to a column type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {value:?} to {expected}")]
pub struct ConversionError {
    pub value: String,
    pub expected: DataType,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("table {0:?} already exists")]
    AlreadyExists(String),

    #[error("table {0:?} does not exist")]
    NotFound(String),

    #[error("malformed column spec {0:?}, expected <name>:<type>")]
    MalformedColumnSpec(String),

    #[error("duplicate column {0:?}")]
    DuplicateColumn(String),

    #[error("unknown column type {0:?}, expected one of int, str, bool")]
    UnknownType(String),

    #[error("expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("invalid value {value:?} for column {column:?}: expected {expected}")]
    InvalidValue {
        column: String,
        value: String,
        expected: DataType,
    },

    #[error("column {column:?} has type {expected}, got a {actual} value")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("column {0:?} is assigned by the store and cannot be set")]
    ReadOnlyColumn(String),

    #[error("invalid table name {0:?}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A failure outside every other category, such as a panic contained by
    /// [crate::guard::OperationGuard].
    #[error("{0}")]
    Unexpected(String),
}

impl Error {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::MalformedColumnSpec(_) | Self::DuplicateColumn(_) => {
                ErrorKind::MalformedColumnSpec
            }
            Self::UnknownType(_) => ErrorKind::UnknownType,
            Self::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            Self::InvalidValue { .. } | Self::TypeMismatch { .. } | Self::ReadOnlyColumn(_) => {
                ErrorKind::InvalidValue
            }
            Self::InvalidName(_) => ErrorKind::InvalidName,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::PersistenceFailure,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Attaches the column name to a conversion failure.
    pub fn invalid_value(column: &str, err: ConversionError) -> Self {
        Self::InvalidValue {
            column: column.to_string(),
            value: err.value,
            expected: err.expected,
        }
    }
}
