//! Error envelope types and helpers.

use crate::redaction::redact_if_secret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata attached to errors for diagnostics.
pub type ErrorMetadata = BTreeMap<String, String>;

/// High-level classification of error origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Expected failures (bad configuration, malformed input).
    Expected,
    /// Unexpected failures (I/O, serialization).
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected => formatter.write_str("expected"),
            Self::Unexpected => formatter.write_str("unexpected"),
        }
    }
}

/// Retry classification for failure handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Retrying may succeed (e.g. a transient write failure).
    Retriable,
    /// Retrying with the same input fails the same way.
    NonRetriable,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retriable => formatter.write_str("retriable"),
            Self::NonRetriable => formatter.write_str("non-retriable"),
        }
    }
}

/// Stable error code, rendered as `namespace:code`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Create a new error code with a namespace and code.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Returns the namespace portion.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the code identifier.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Structured error returned at crate boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error kind describing the origin category.
    pub kind: ErrorKind,
    /// Retry classification.
    pub class: ErrorClass,
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Additional diagnostic metadata. Never holds secret values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    /// Create an expected error with non-retriable classification.
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Expected,
            class: ErrorClass::NonRetriable,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Create an unexpected error with the provided retry classification.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>, class: ErrorClass) -> Self {
        Self {
            kind: ErrorKind::Unexpected,
            class,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a single metadata entry.
    ///
    /// Values under secret-looking keys (`password`, `token`, ...) are stored
    /// as [`crate::REDACTED`].
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl AsRef<str>) -> Self {
        let key = key.into();
        let value = redact_if_secret(&key, value.as_ref());
        self.metadata.insert(key, value);
        self
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {} {}: {}",
            self.kind, self.class, self.code, self.message
        )
    }
}

impl std::error::Error for ErrorEnvelope {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::REDACTED;

    #[test]
    fn constructors_set_kind_and_class() {
        let expected = ErrorEnvelope::expected(ErrorCode::new("config", "invalid_json"), "bad");
        assert_eq!(expected.kind, ErrorKind::Expected);
        assert_eq!(expected.class, ErrorClass::NonRetriable);

        let unexpected = ErrorEnvelope::unexpected(
            ErrorCode::new("io", "stdout"),
            "broken pipe",
            ErrorClass::Retriable,
        );
        assert_eq!(unexpected.kind, ErrorKind::Unexpected);
        assert_eq!(unexpected.class, ErrorClass::Retriable);
    }

    #[test]
    fn code_renders_namespace_and_identifier() {
        let code = ErrorCode::new("config", "validation_failed");
        assert_eq!(code.namespace(), "config");
        assert_eq!(code.code(), "validation_failed");
        assert_eq!(code.to_string(), "config:validation_failed");
    }

    #[test]
    fn display_includes_kind_class_and_code() {
        let error = ErrorEnvelope::expected(ErrorCode::new("config", "validation_failed"), "bad");
        assert_eq!(
            error.to_string(),
            "expected non-retriable config:validation_failed: bad"
        );
    }

    #[test]
    fn secret_metadata_is_redacted_on_insert() {
        let error = ErrorEnvelope::expected(ErrorCode::new("config", "validation_failed"), "bad")
            .with_metadata("password", "hunter2")
            .with_metadata("fields", "maxConnections");

        assert_eq!(
            error.metadata.get("password").map(String::as_str),
            Some(REDACTED)
        );
        assert_eq!(
            error.metadata.get("fields").map(String::as_str),
            Some("maxConnections")
        );
    }

    #[test]
    fn empty_metadata_is_not_serialized() -> Result<(), Box<dyn std::error::Error>> {
        let error = ErrorEnvelope::expected(ErrorCode::new("config", "invalid_json"), "bad");
        let json = serde_json::to_value(&error)?;
        assert!(json.get("metadata").is_none());
        assert_eq!(json["code"]["namespace"], "config");
        Ok(())
    }
}
