//! Environment variable coercion.
//!
//! Coercion here is permissive:
//! - values that cannot be interpreted fall back to the variable's default
//! - bounds are NOT applied (out-of-range values flow through untouched and
//!   are rejected by `schema` validation)
//! - the process environment is only read by [`PgEnv::from_std_env`]

use pgserver_shared::redact_if_secret;
use std::collections::BTreeMap;

/// Env var: PostgreSQL connection URL (required).
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Env var: allow write statements.
pub const ENV_ALLOW_WRITE_OPS: &str = "DANGEROUSLY_ALLOW_WRITE_OPS";
/// Env var: connection pool size.
pub const ENV_MAX_CONNECTIONS: &str = "PG_MAX_CONNECTIONS";
/// Env var: connection timeout in seconds.
pub const ENV_CONNECTION_TIMEOUT: &str = "PG_CONNECTION_TIMEOUT";
/// Env var: statement timeout in milliseconds.
pub const ENV_STATEMENT_TIMEOUT: &str = "PG_STATEMENT_TIMEOUT";
/// Env var: use prepared statements.
pub const ENV_PREPARE_STATEMENTS: &str = "PG_PREPARE_STATEMENTS";
/// Env var: debug mode.
pub const ENV_DEBUG: &str = "DEBUG";
/// Env var: path to the SSL root certificate.
pub const ENV_SSL_ROOT_CERT: &str = "PG_SSL_ROOT_CERT";
/// Env var: require SSL connections.
pub const ENV_REQUIRE_SSL: &str = "PG_REQUIRE_SSL";
/// Env var: reject SSL peers with unverifiable certificates.
pub const ENV_SSL_REJECT_UNAUTHORIZED: &str = "PG_SSL_REJECT_UNAUTHORIZED";
/// Env var: fetch type metadata on connect.
pub const ENV_FETCH_TYPES: &str = "PG_FETCH_TYPES";

/// Every env var read by the loader.
pub const RECOGNIZED_ENV_VARS: [&str; 11] = [
    ENV_DATABASE_URL,
    ENV_ALLOW_WRITE_OPS,
    ENV_MAX_CONNECTIONS,
    ENV_CONNECTION_TIMEOUT,
    ENV_STATEMENT_TIMEOUT,
    ENV_PREPARE_STATEMENTS,
    ENV_DEBUG,
    ENV_SSL_ROOT_CERT,
    ENV_REQUIRE_SSL,
    ENV_SSL_REJECT_UNAUTHORIZED,
    ENV_FETCH_TYPES,
];

/// Default for `DANGEROUSLY_ALLOW_WRITE_OPS`.
pub const DEFAULT_ALLOW_WRITE_OPS: bool = false;
/// Default for `PG_MAX_CONNECTIONS`.
pub const DEFAULT_MAX_CONNECTIONS: i64 = 10;
/// Default for `PG_CONNECTION_TIMEOUT` (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: i64 = 30;
/// Default for `PG_STATEMENT_TIMEOUT` (milliseconds).
pub const DEFAULT_STATEMENT_TIMEOUT_MS: i64 = 30_000;
/// Default for `PG_PREPARE_STATEMENTS`.
pub const DEFAULT_PREPARE_STATEMENTS: bool = true;
/// Default for `DEBUG`.
pub const DEFAULT_DEBUG: bool = false;
/// Default for `PG_REQUIRE_SSL`.
pub const DEFAULT_REQUIRE_SSL: bool = false;
/// Default for `PG_SSL_REJECT_UNAUTHORIZED`.
pub const DEFAULT_SSL_REJECT_UNAUTHORIZED: bool = true;
/// Default for `PG_FETCH_TYPES`.
pub const DEFAULT_FETCH_TYPES: bool = true;

/// Tokens coerced to `true` (after trimming and lower-casing).
pub const TRUTHY_TOKENS: [&str; 6] = ["true", "1", "yes", "on", "y", "t"];
/// Tokens coerced to `false` (after trimming and lower-casing).
pub const FALSY_TOKENS: [&str; 7] = ["false", "0", "no", "off", "", "n", "f"];

/// A raw value handed to the coercion rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvValue<'a> {
    /// String input (the only shape the process environment produces).
    Text(&'a str),
    /// Already-typed boolean input.
    Bool(bool),
    /// Already-typed numeric input.
    Number(f64),
}

impl<'a> From<&'a str> for EnvValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for EnvValue<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for EnvValue<'_> {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Interpret a raw value as a boolean; `None` when it is unparseable.
pub fn parse_bool(value: EnvValue<'_>) -> Option<bool> {
    match value {
        EnvValue::Bool(value) => Some(value),
        EnvValue::Text(raw) => {
            let normalized = raw.trim().to_lowercase();
            if TRUTHY_TOKENS.contains(&normalized.as_str()) {
                Some(true)
            } else if FALSY_TOKENS.contains(&normalized.as_str()) {
                Some(false)
            } else {
                None
            }
        },
        EnvValue::Number(_) => None,
    }
}

/// Coerce a raw value to a boolean, substituting `default` when absent or unparseable.
pub fn coerce_bool(value: Option<EnvValue<'_>>, default: bool) -> bool {
    value.and_then(parse_bool).unwrap_or(default)
}

/// Interpret a raw value as an integer (truncated toward zero).
///
/// Returns `None` for non-numeric or non-finite input. Empty or
/// whitespace-only text is `0`. Magnitudes beyond `i64` saturate.
pub fn parse_int(value: EnvValue<'_>) -> Option<i64> {
    match value {
        EnvValue::Number(number) => truncate_finite(number),
        EnvValue::Text(raw) => parse_numeric_text(raw.trim()),
        EnvValue::Bool(_) => None,
    }
}

/// Coerce a raw value to an integer, substituting `default` when absent or unparseable.
pub fn coerce_int(value: Option<EnvValue<'_>>, default: i64) -> i64 {
    value.and_then(parse_int).unwrap_or(default)
}

fn parse_numeric_text(text: &str) -> Option<i64> {
    // Blank text is numeric zero, not "missing".
    if text.is_empty() {
        return Some(0);
    }

    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        let stripped = text
            .get(..2)
            .filter(|head| head.eq_ignore_ascii_case(prefix))
            .and_then(|_| text.get(2..));
        if let Some(digits) = stripped {
            return parse_radix_digits(digits, radix);
        }
    }

    text.parse::<f64>().ok().and_then(truncate_finite)
}

fn parse_radix_digits(digits: &str, radix: u32) -> Option<i64> {
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
        return None;
    }
    // Digits are validated above, so the only possible failure is overflow.
    Some(i64::from_str_radix(digits, radix).unwrap_or(i64::MAX))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float-to-int `as` casts saturate, which is the intended truncation"
)]
fn truncate_finite(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.trunc() as i64)
}

/// Coerced view of the recognised environment variables.
///
/// Every field already has its default applied; only `database_url` and
/// `ssl_root_cert` may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgEnv {
    /// Raw `DATABASE_URL` (may be empty; the loader rejects that).
    pub database_url: Option<String>,
    /// `DANGEROUSLY_ALLOW_WRITE_OPS`.
    pub allow_write_ops: bool,
    /// `PG_MAX_CONNECTIONS` (unbounded at this stage).
    pub max_connections: i64,
    /// `PG_CONNECTION_TIMEOUT` in seconds (unbounded at this stage).
    pub connection_timeout: i64,
    /// `PG_STATEMENT_TIMEOUT` in milliseconds (unbounded at this stage).
    pub statement_timeout: i64,
    /// `PG_PREPARE_STATEMENTS`.
    pub prepare_statements: bool,
    /// `DEBUG`.
    pub debug: bool,
    /// `PG_SSL_ROOT_CERT`, passed through verbatim.
    pub ssl_root_cert: Option<String>,
    /// `PG_REQUIRE_SSL`.
    pub require_ssl: bool,
    /// `PG_SSL_REJECT_UNAUTHORIZED`.
    pub ssl_reject_unauthorized: bool,
    /// `PG_FETCH_TYPES`.
    pub fetch_types: bool,
}

impl Default for PgEnv {
    fn default() -> Self {
        Self {
            database_url: None,
            allow_write_ops: DEFAULT_ALLOW_WRITE_OPS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT_SECS,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT_MS,
            prepare_statements: DEFAULT_PREPARE_STATEMENTS,
            debug: DEFAULT_DEBUG,
            ssl_root_cert: None,
            require_ssl: DEFAULT_REQUIRE_SSL,
            ssl_reject_unauthorized: DEFAULT_SSL_REJECT_UNAUTHORIZED,
            fetch_types: DEFAULT_FETCH_TYPES,
        }
    }
}

impl PgEnv {
    /// Coerce env values from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self {
            database_url: map.get(ENV_DATABASE_URL).cloned(),
            allow_write_ops: bool_var(map, ENV_ALLOW_WRITE_OPS, DEFAULT_ALLOW_WRITE_OPS),
            max_connections: int_var(map, ENV_MAX_CONNECTIONS, DEFAULT_MAX_CONNECTIONS),
            connection_timeout: int_var(
                map,
                ENV_CONNECTION_TIMEOUT,
                DEFAULT_CONNECTION_TIMEOUT_SECS,
            ),
            statement_timeout: int_var(map, ENV_STATEMENT_TIMEOUT, DEFAULT_STATEMENT_TIMEOUT_MS),
            prepare_statements: bool_var(map, ENV_PREPARE_STATEMENTS, DEFAULT_PREPARE_STATEMENTS),
            debug: bool_var(map, ENV_DEBUG, DEFAULT_DEBUG),
            ssl_root_cert: map.get(ENV_SSL_ROOT_CERT).cloned(),
            require_ssl: bool_var(map, ENV_REQUIRE_SSL, DEFAULT_REQUIRE_SSL),
            ssl_reject_unauthorized: bool_var(
                map,
                ENV_SSL_REJECT_UNAUTHORIZED,
                DEFAULT_SSL_REJECT_UNAUTHORIZED,
            ),
            fetch_types: bool_var(map, ENV_FETCH_TYPES, DEFAULT_FETCH_TYPES),
        }
    }

    /// Coerce env values from the current process environment.
    ///
    /// Variables that are unset or not valid unicode are treated as absent.
    pub fn from_std_env() -> Self {
        Self::from_map(&snapshot_std_env())
    }
}

/// Snapshot the recognised variables from the process environment.
pub fn snapshot_std_env() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for name in RECOGNIZED_ENV_VARS {
        if let Ok(value) = std::env::var(name) {
            map.insert(name.to_string(), value);
        }
    }
    map
}

fn bool_var(map: &BTreeMap<String, String>, var: &'static str, default: bool) -> bool {
    let Some(raw) = map.get(var) else {
        return default;
    };
    parse_bool(EnvValue::Text(raw)).unwrap_or_else(|| {
        tracing::warn!(
            env_var = var,
            value = %redact_if_secret(var, raw),
            default,
            "unrecognised boolean value; using default"
        );
        default
    })
}

fn int_var(map: &BTreeMap<String, String>, var: &'static str, default: i64) -> i64 {
    let Some(raw) = map.get(var) else {
        return default;
    };
    parse_int(EnvValue::Text(raw)).unwrap_or_else(|| {
        tracing::warn!(
            env_var = var,
            value = %redact_if_secret(var, raw),
            default,
            "unrecognised integer value; using default"
        );
        default
    })
}
