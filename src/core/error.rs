use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building, encoding, signing or validating a document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SifenError {
    /// One or more document model rules failed.
    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    /// A date, number or fixed-width value could not be formatted.
    #[error("cannot format '{value}': {reason}")]
    Format { value: String, reason: String },

    /// Signing failed (missing reference, bad key material, canonicalization).
    #[error("signature error: {0}")]
    Signature(String),

    /// A field needed for the QR verification string is missing.
    #[error("verification code error: {0}")]
    VerificationCode(String),

    /// The document bytes are not well-formed markup.
    #[error("malformed document at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// The schema contract could not be located or parsed.
    #[error("schema contract unavailable: {0}")]
    ContractUnavailable(String),

    /// The document does not conform to the schema contract.
    #[error("document violates schema: {}", join(.0))]
    SchemaViolation(Vec<SchemaIssue>),

    /// XML generation error.
    #[error("XML error: {0}")]
    Xml(String),
}

impl SifenError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![ValidationError::new(field, message)])
    }

    pub fn format(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "recipient.ruc").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// SIFEN field code the rule belongs to, if any (e.g. "dNumDoc").
    pub rule: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "[{}] {}: {}", rule, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    /// Create a validation error without a rule ID.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Create a validation error tied to a SIFEN field code.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}

/// How serious a schema finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Where in the instance document a schema finding was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line of the element start tag.
    pub line: usize,
    /// Element path from the root, e.g. `/rDE/DE/gTimb/dNumDoc`.
    pub path: String,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {} {}", self.line, self.path)
    }
}

/// One schema contract violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    pub location: Location,
    pub message: String,
    pub severity: Severity,
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.location, self.message)
    }
}
