//! Connection URL helpers.
//!
//! `currentSchema` is accepted in `DATABASE_URL` for convenience but is not a
//! libpq connection parameter, so it is lifted out as the default schema and
//! stripped before the URL reaches the driver. Unparseable URLs are never an
//! error here: extraction yields nothing and stripping returns the input.

use pgserver_shared::{REDACTED, is_secret_key};
use url::Url;

/// Query parameter carrying the default schema.
pub const CURRENT_SCHEMA_PARAM: &str = "currentSchema";

/// Extract the `currentSchema` query parameter from a connection URL.
///
/// Returns `None` when the URL does not parse, the parameter is missing, or
/// its value is empty.
///
/// # Examples
///
/// ```
/// use pgserver_config::parse_current_schema;
///
/// assert_eq!(
///     parse_current_schema("postgresql://u:p@h:5432/db?currentSchema=foo").as_deref(),
///     Some("foo")
/// );
/// assert_eq!(parse_current_schema("not a url"), None);
/// ```
pub fn parse_current_schema(database_url: &str) -> Option<String> {
    let url = Url::parse(database_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == CURRENT_SCHEMA_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Remove every `currentSchema` query parameter from a connection URL.
///
/// Remaining parameters are re-serialized in their original order; no bare
/// trailing `?` is left behind. Unparseable input is returned unchanged.
///
/// # Examples
///
/// ```
/// use pgserver_config::remove_current_schema_from_url;
///
/// assert_eq!(
///     remove_current_schema_from_url("postgresql://u:p@h:5432/db?currentSchema=foo"),
///     "postgresql://u:p@h:5432/db"
/// );
/// assert_eq!(remove_current_schema_from_url("not a url"), "not a url");
/// ```
pub fn remove_current_schema_from_url(database_url: &str) -> String {
    let Ok(mut url) = Url::parse(database_url) else {
        return database_url.to_owned();
    };

    let remaining: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != CURRENT_SCHEMA_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if remaining.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(remaining);
    }

    let cleaned = url.to_string();
    match cleaned.strip_suffix('?') {
        Some(stripped) => stripped.to_owned(),
        None => cleaned,
    }
}

/// Render a connection URL without credentials for logs and diagnostics.
///
/// Userinfo is dropped and secret-looking query parameters (`password`,
/// `sslkey`, ...) are masked. Unparseable input is replaced by a placeholder
/// because a DSN that is not a URL may still embed a password.
pub fn sanitize_url_credentials(database_url: &str) -> String {
    let mut parsed = match Url::parse(database_url) {
        Ok(parsed) => parsed,
        Err(error) => return format!("[invalid url: {error}]"),
    };

    if parsed.password().is_some() || !parsed.username().is_empty() {
        if parsed.set_username("").is_err() {
            return "[invalid url: invalid username]".to_string();
        }
        if parsed.set_password(None).is_err() {
            return "[invalid url: invalid password]".to_string();
        }
    }

    let has_secret_param = parsed.query_pairs().any(|(key, _)| is_secret_key(&key));
    if has_secret_param {
        let masked: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(key, value)| {
                let value = if is_secret_key(&key) {
                    REDACTED.to_string()
                } else {
                    value.into_owned()
                };
                (key.into_owned(), value)
            })
            .collect();
        parsed.query_pairs_mut().clear().extend_pairs(masked);
    }

    parsed.to_string()
}
