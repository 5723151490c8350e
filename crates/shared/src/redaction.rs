//! Secret detection and redaction utilities.
//!
//! Provides consistent logic for detecting sensitive keys/variables and
//! redacting their values in error messages and logs.

/// Checks if a key/variable name likely refers to a secret.
///
/// Uses case-insensitive pattern matching to detect common secret-related
/// naming conventions. `AUTH` only counts as a whole word segment, so
/// `basic_auth` is secret while `PG_SSL_REJECT_UNAUTHORIZED` is not.
///
/// # Examples
///
/// ```
/// use pgserver_shared::is_secret_key;
///
/// assert!(is_secret_key("PGPASSWORD"));
/// assert!(is_secret_key("password"));
/// assert!(is_secret_key("sslkey"));
/// assert!(!is_secret_key("PG_MAX_CONNECTIONS"));
/// assert!(!is_secret_key("PG_SSL_REJECT_UNAUTHORIZED"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASSWORD")
        || key.contains("CREDENTIAL")
        || key
            .split(|ch: char| !ch.is_ascii_alphanumeric())
            .any(|segment| segment == "AUTH" || segment == "AUTHORIZATION")
}

/// Redacts a value if the key is likely a secret.
///
/// Returns `"[REDACTED]"` for secret keys, or the original value otherwise.
///
/// # Examples
///
/// ```
/// use pgserver_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("PGPASSWORD", "hunter2"), "[REDACTED]");
/// assert_eq!(redact_if_secret("DEBUG", "yes"), "yes");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";
