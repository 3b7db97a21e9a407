//! Error types for the outcome core
//!
//! Separates client-caused failures (bad records) from failures that point at
//! a broken artifact bundle or classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single field-level problem found while validating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Wire name of the offending field (`$` for the record itself)
    pub field: String,
    /// Machine-readable violation code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Expected type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// What was actually received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl FieldViolation {
    pub const MISSING: &'static str = "REQUIRED_FIELD_MISSING";
    pub const TYPE_MISMATCH: &'static str = "TYPE_MISMATCH";
    pub const INVALID_RECORD: &'static str = "INVALID_RECORD";

    pub fn missing(field: impl Into<String>, expected: &str) -> Self {
        let field = field.into();
        Self {
            message: format!("Required field '{}' is missing", field),
            field,
            code: Self::MISSING.to_string(),
            expected: Some(expected.to_string()),
            actual: None,
        }
    }

    pub fn type_mismatch(field: impl Into<String>, expected: &str, actual: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            message: format!("Field '{}' is not a valid {}", field, expected),
            field,
            code: Self::TYPE_MISMATCH.to_string(),
            expected: Some(expected.to_string()),
            actual: Some(actual.into()),
        }
    }

    pub fn invalid_record(actual: impl Into<String>) -> Self {
        Self {
            field: "$".to_string(),
            code: Self::INVALID_RECORD.to_string(),
            message: "Record must be a JSON object".to_string(),
            expected: Some("object".to_string()),
            actual: Some(actual.into()),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.field, self.code)
    }
}

/// Main error type for outcome operations
#[derive(Error, Debug)]
pub enum OutcomeError {
    /// One or more record fields are missing or malformed
    #[error("Validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// A feature computation produced an unusable value
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// An artifact could not be read or is inconsistent with the bundle
    #[error("Artifact error in {}: {message}", .path.display())]
    Artifact { path: PathBuf, message: String },

    /// The classifier could not be invoked
    #[error("Inference error: {0}")]
    Inference(String),

    /// The classifier returned a class outside the label set
    #[error("Classifier returned unknown class index {0}")]
    UnknownClass(usize),
}

impl OutcomeError {
    /// Create a pipeline error
    pub fn pipeline(msg: impl Into<String>) -> Self {
        OutcomeError::Pipeline(msg.into())
    }

    /// Create an artifact error tied to a file
    pub fn artifact(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        OutcomeError::Artifact {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        OutcomeError::Inference(msg.into())
    }

    /// Check if this error was caused by the caller's input
    pub fn is_user_error(&self) -> bool {
        matches!(self, OutcomeError::Validation(_) | OutcomeError::Pipeline(_))
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for outcome operations
pub type Result<T> = std::result::Result<T, OutcomeError>;
