//! Validation traits for configuration values.

/// Trait for validation errors used by `Validate`.
///
/// Each constructor describes a single field-level failure; implementors may
/// aggregate several of them.
pub trait ValidationError: Sized {
    /// A required field was absent.
    fn required(field: &'static str) -> Self;

    /// A field value is invalid for a specific reason.
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self;

    /// A numeric field is below its inclusive minimum.
    fn too_small(field: &'static str, min: i64) -> Self;

    /// A numeric field is above its inclusive maximum.
    fn too_big(field: &'static str, max: i64) -> Self;
}

/// Validate a value against its structural rules.
pub trait Validate {
    /// Error type returned by validation.
    type Error: ValidationError;

    /// Validate the value, reporting every violation found.
    fn validate(&self) -> Result<(), Self::Error>;
}
