//! Error and warning types for edit sessions

use fieldmeta_schema::{
    DecodeWarning, ErrorSeverity, ListKey, RefTarget, SchemaError, Severity, SlotName,
};
use thiserror::Error;

/// Result type for edit session operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Failure reported by a remote reference or persistence service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service could not be reached or answered with an error
    #[error("{operation} failed: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    /// The requested record does not exist
    #[error("{what} not found")]
    NotFound { what: String },
}

impl ServiceError {
    /// Create an unavailable error
    pub fn unavailable(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            operation,
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}

/// Errors returned by edit session operations
#[derive(Debug, Error)]
pub enum EditorError {
    /// Registry, codec or filter-table failure
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A required value is empty at save time
    #[error("required field missing: {field}")]
    RequiredFieldMissing { field: &'static str },

    /// Write of a reference that is not in the loaded list
    #[error("invalid reference '{value}' for {target}")]
    InvalidSlotReference { target: RefTarget, value: String },

    /// Write to a slot the active field type does not declare
    #[error("{slot} is not used by field type {field_type}")]
    SlotNotUsed {
        slot: SlotName,
        field_type: &'static str,
    },

    /// The blob value does not have the active type's shape
    #[error("{slot} blob does not match the shape of field type {field_type}")]
    BlobShapeMismatch {
        slot: SlotName,
        field_type: &'static str,
    },

    /// No field type has been selected yet
    #[error("no field type selected")]
    NoFieldType,

    /// Filter-table operation on a type without one
    #[error("field type {field_type} has no filter table")]
    NoFilterTable { field_type: &'static str },

    /// The session was saved or cancelled
    #[error("edit session is closed")]
    SessionClosed,

    /// The persistence service rejected the save
    #[error("persistence failed: {0}")]
    Persistence(#[from] ServiceError),
}

impl EditorError {
    /// Create a required field error
    pub fn required(field: &'static str) -> Self {
        Self::RequiredFieldMissing { field }
    }

    /// Create an invalid slot reference error
    pub fn invalid_reference(target: RefTarget, value: impl Into<String>) -> Self {
        Self::InvalidSlotReference {
            target,
            value: value.into(),
        }
    }
}

impl Severity for EditorError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Schema(err) => err.severity(),
            Self::RequiredFieldMissing { .. }
            | Self::InvalidSlotReference { .. }
            | Self::SlotNotUsed { .. }
            | Self::BlobShapeMismatch { .. }
            | Self::NoFieldType
            | Self::NoFilterTable { .. }
            | Self::Persistence(_) => ErrorSeverity::Error,
            Self::SessionClosed => ErrorSeverity::Critical,
        }
    }
}

/// Non-fatal problems collected by a session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorWarning {
    /// Recovered while decoding the opened definition
    #[error(transparent)]
    Decode(#[from] DecodeWarning),

    /// A reference list could not be fetched and was treated as empty
    #[error("reference list {key} could not be fetched: {message}")]
    ReferenceFetchFailed { key: ListKey, message: String },
}

impl Severity for EditorWarning {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_errors_keep_their_severity() {
        let err: EditorError = SchemaError::UnknownFieldType { column_type: 77 }.into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.to_string(), "unknown field type: column code 77");
    }

    #[test]
    fn test_invalid_reference_display() {
        let err = EditorError::invalid_reference(RefTarget::Slot(SlotName::MetaType2), "9");
        assert_eq!(err.to_string(), "invalid reference '9' for metaType2");
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_fetch_warning_display() {
        let warning = EditorWarning::ReferenceFetchFailed {
            key: ListKey::EntityFields("7".into()),
            message: "timeout".into(),
        };
        assert_eq!(
            warning.to_string(),
            "reference list entityFields:7 could not be fetched: timeout"
        );
        assert_eq!(warning.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_persistence_wraps_service_error() {
        let err: EditorError = ServiceError::unavailable("insertFieldDefinition", "503").into();
        assert!(err.to_string().contains("insertFieldDefinition failed: 503"));
    }
}
