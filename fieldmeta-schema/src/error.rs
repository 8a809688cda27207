//! Error types for the field-type registry and slot codec

use thiserror::Error;

use crate::filter_table::RowColumn;
use crate::slot::SlotName;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Severity levels for error classification
///
/// - **Warning**: the operation recovered locally and editing proceeds.
/// - **Error**: the operation was rejected but the session stays usable.
/// - **Critical**: the editor for this field cannot continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Warning,
    Error,
    Critical,
}

/// Trait for error types that report a severity level
pub trait Severity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

/// Errors that can occur in registry, codec and filter-table operations
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Persisted column code with no matching descriptor
    #[error("unknown field type: column code {column_type}")]
    UnknownFieldType { column_type: i32 },

    /// UI-driven selection of a key that is not in the catalogue
    #[error("unknown field type key: {key}")]
    UnknownFieldKey { key: String },

    /// The definition carries no column code at all
    #[error("field definition has no column type")]
    MissingColumnType,

    /// Write of a row reference that is not in the current valid list
    #[error("invalid {column} reference '{value}' on row {row_id}")]
    InvalidRowReference {
        row_id: String,
        column: RowColumn,
        value: String,
    },

    /// Filter row not found by ID
    #[error("filter row not found: {row_id}")]
    RowNotFound { row_id: String },

    /// The catalogue itself is inconsistent
    #[error("invalid field type catalogue: {message}")]
    InvalidCatalogue { message: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Create an invalid catalogue error
    pub fn invalid_catalogue(message: impl Into<String>) -> Self {
        Self::InvalidCatalogue {
            message: message.into(),
        }
    }

    /// Create an invalid row reference error
    pub fn invalid_row_reference(
        row_id: impl Into<String>,
        column: RowColumn,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidRowReference {
            row_id: row_id.into(),
            column,
            value: value.into(),
        }
    }
}

impl Severity for SchemaError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidRowReference { .. } | Self::RowNotFound { .. } | Self::Json(_) => {
                ErrorSeverity::Error
            }
            Self::UnknownFieldType { .. }
            | Self::UnknownFieldKey { .. }
            | Self::MissingColumnType
            | Self::InvalidCatalogue { .. } => ErrorSeverity::Critical,
        }
    }
}

/// Non-fatal problems found while decoding a stored definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeWarning {
    /// A blob was unreadable and replaced by its empty default
    #[error("malformed {slot} blob replaced by empty default: {message}")]
    MalformedBlob { slot: SlotName, message: String },

    /// A lookup-mode code outside the known set was dropped
    #[error("unknown lookup mode {code} dropped")]
    UnknownLookupMode { code: i32 },
}

impl Severity for DecodeWarning {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }
}
