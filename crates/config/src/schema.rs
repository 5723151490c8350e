//! Server configuration shape, bounds, and structural validation.
//!
//! Validation is a fixed list of per-field checks. Every violation is
//! collected before failing so a single error reports all of them.

use crate::connection_url::sanitize_url_credentials;
use pgserver_shared::{ErrorCode, ErrorEnvelope, Validate, ValidationError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Lowest accepted pool size.
pub const MAX_CONNECTIONS_MIN: i64 = 1;
/// Highest accepted pool size.
pub const MAX_CONNECTIONS_MAX: i64 = 100;
/// Lowest accepted connection timeout (seconds).
pub const CONNECTION_TIMEOUT_MIN_SECS: i64 = 1;
/// Highest accepted connection timeout (seconds).
pub const CONNECTION_TIMEOUT_MAX_SECS: i64 = 300;
/// Lowest accepted statement timeout (milliseconds). No upper bound.
pub const STATEMENT_TIMEOUT_MIN_MS: i64 = 0;

/// Serialized name of [`ServerConfig::database_url`].
pub const FIELD_DATABASE_URL: &str = "databaseUrl";
/// Serialized name of [`ServerConfig::allow_write_ops`].
pub const FIELD_ALLOW_WRITE_OPS: &str = "allowWriteOps";
/// Serialized name of [`ServerConfig::max_connections`].
pub const FIELD_MAX_CONNECTIONS: &str = "maxConnections";
/// Serialized name of [`ServerConfig::connection_timeout`].
pub const FIELD_CONNECTION_TIMEOUT: &str = "connectionTimeout";
/// Serialized name of [`ServerConfig::statement_timeout`].
pub const FIELD_STATEMENT_TIMEOUT: &str = "statementTimeout";
/// Serialized name of [`ServerConfig::prepare_statements`].
pub const FIELD_PREPARE_STATEMENTS: &str = "prepareStatements";
/// Serialized name of [`ServerConfig::debug`].
pub const FIELD_DEBUG: &str = "debug";
/// Serialized name of [`ServerConfig::ssl_root_cert_path`].
pub const FIELD_SSL_ROOT_CERT_PATH: &str = "sslRootCertPath";
/// Serialized name of [`ServerConfig::require_ssl`].
pub const FIELD_REQUIRE_SSL: &str = "requireSsl";
/// Serialized name of [`ServerConfig::ssl_reject_unauthorized`].
pub const FIELD_SSL_REJECT_UNAUTHORIZED: &str = "sslRejectUnauthorized";
/// Serialized name of [`ServerConfig::fetch_types`].
pub const FIELD_FETCH_TYPES: &str = "fetchTypes";
/// Serialized name of [`ServerConfig::default_schema`].
pub const FIELD_DEFAULT_SCHEMA: &str = "defaultSchema";

/// Validated configuration handed to the database connectivity layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Connection URL with `currentSchema` removed.
    pub database_url: String,
    /// Whether write statements are permitted.
    pub allow_write_ops: bool,
    /// Pool size.
    #[schemars(range(min = 1, max = 100))]
    pub max_connections: i64,
    /// Connection timeout in seconds.
    #[schemars(range(min = 1, max = 300))]
    pub connection_timeout: i64,
    /// Statement timeout in milliseconds.
    #[schemars(range(min = 0))]
    pub statement_timeout: i64,
    /// Whether statements are prepared.
    pub prepare_statements: bool,
    /// Verbose diagnostics.
    pub debug: bool,
    /// Path to a root certificate bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_root_cert_path: Option<String>,
    /// `Some(true)` when TLS is required; absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_ssl: Option<bool>,
    /// `Some(true)` when server certificates are verified; absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_reject_unauthorized: Option<bool>,
    /// `Some(true)` when type metadata is fetched on connect; absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_types: Option<bool>,
    /// Schema lifted from the `currentSchema` URL parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,
}

impl ServerConfig {
    /// Copy of the config with credentials removed from the connection URL.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            database_url: sanitize_url_credentials(&self.database_url),
            ..self.clone()
        }
    }
}

impl Validate for ServerConfig {
    type Error = ConfigurationError;

    fn validate(&self) -> Result<(), Self::Error> {
        let checks = [
            bound_violation(
                FIELD_MAX_CONNECTIONS,
                self.max_connections,
                MAX_CONNECTIONS_MIN,
                Some(MAX_CONNECTIONS_MAX),
            ),
            bound_violation(
                FIELD_CONNECTION_TIMEOUT,
                self.connection_timeout,
                CONNECTION_TIMEOUT_MIN_SECS,
                Some(CONNECTION_TIMEOUT_MAX_SECS),
            ),
            bound_violation(
                FIELD_STATEMENT_TIMEOUT,
                self.statement_timeout,
                STATEMENT_TIMEOUT_MIN_MS,
                None,
            ),
        ];
        ConfigurationError::collect(checks.into_iter().flatten())
    }
}

/// Re-validate an already constructed configuration.
///
/// # Errors
///
/// Returns [`ConfigurationError`] listing every out-of-range field.
pub fn validate_config(config: &ServerConfig) -> Result<(), ConfigurationError> {
    config.validate()
}

fn bound_violation(
    field: &'static str,
    value: i64,
    min: i64,
    max: Option<i64>,
) -> Option<ConfigurationError> {
    if value < min {
        return Some(ConfigurationError::too_small(field, min));
    }
    match max {
        Some(max) if value > max => Some(ConfigurationError::too_big(field, max)),
        _ => None,
    }
}

/// A single field-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Path segments to the offending field. Empty for the root value.
    pub path: Vec<&'static str>,
    /// Human-readable reason.
    pub reason: String,
    /// Environment variable the value was read from, when known.
    pub env_var: Option<&'static str>,
}

impl FieldViolation {
    /// Violation at a single top-level field.
    pub fn at(field: &'static str, reason: impl Into<String>) -> Self {
        let path = if field.is_empty() {
            Vec::new()
        } else {
            vec![field]
        };
        Self {
            path,
            reason: reason.into(),
            env_var: None,
        }
    }

    /// Path segments joined with `.`.
    #[must_use]
    pub fn path(&self) -> String {
        self.path.join(".")
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(formatter, "{}", self.reason)?;
        } else {
            write!(formatter, "{}: {}", self.path(), self.reason)?;
        }
        if let Some(env_var) = self.env_var {
            write!(formatter, " (from {env_var})")?;
        }
        Ok(())
    }
}

/// Configuration failed to load or validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    violations: Vec<FieldViolation>,
}

impl ConfigurationError {
    /// Build an error from the given violations.
    #[must_use]
    pub const fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    /// Merge several errors; `Ok` when there is nothing to report.
    ///
    /// # Errors
    ///
    /// Returns the merged error when at least one violation was supplied.
    pub fn collect(errors: impl IntoIterator<Item = Self>) -> Result<(), Self> {
        let violations: Vec<FieldViolation> = errors
            .into_iter()
            .flat_map(|error| error.violations)
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self::new(violations))
        }
    }

    /// All violations, in field order.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Joined paths of the violating fields.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        self.violations.iter().map(FieldViolation::path).collect()
    }

    /// Attribute violations to the environment variables their fields came from.
    #[must_use]
    pub fn with_env_sources(mut self, sources: &[(&str, &'static str)]) -> Self {
        for violation in &mut self.violations {
            if violation.env_var.is_some() {
                continue;
            }
            let path = violation.path();
            violation.env_var = sources
                .iter()
                .find(|(field, _)| *field == path)
                .map(|(_, env_var)| *env_var);
        }
        self
    }

    /// Stable error code for configuration failures.
    #[must_use]
    pub fn error_code() -> ErrorCode {
        ErrorCode::new("config", "validation_failed")
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("Configuration validation failed: ")?;
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationError {}

impl ValidationError for ConfigurationError {
    fn required(field: &'static str) -> Self {
        Self::new(vec![FieldViolation::at(field, "Required")])
    }

    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::new(vec![FieldViolation::at(field, reason)])
    }

    fn too_small(field: &'static str, min: i64) -> Self {
        Self::invalid(field, format!("Number must be greater than or equal to {min}"))
    }

    fn too_big(field: &'static str, max: i64) -> Self {
        Self::invalid(field, format!("Number must be less than or equal to {max}"))
    }
}

impl From<ConfigurationError> for ErrorEnvelope {
    fn from(error: ConfigurationError) -> Self {
        let code = ConfigurationError::error_code();
        let message = error.to_string();
        let fields = error.fields().join(",");
        Self::expected(code, message)
            .with_metadata("fields", fields)
            .with_metadata("count", error.violations.len().to_string())
    }
}

/// Validate an untyped JSON value against the [`ServerConfig`] shape.
///
/// Unknown keys are ignored. Type mismatches and bound violations are
/// reported together, in field order.
///
/// Numeric fields must be integral, which is stricter than a plain
/// number check: `10.0` is accepted but `2.5` is rejected with
/// `Expected integer, received float` even when it is within bounds.
///
/// # Errors
///
/// Returns [`ConfigurationError`] when the value is not an object or any
/// field is missing, mistyped, or out of range.
pub fn validate_config_value(value: &Value) -> Result<ServerConfig, ConfigurationError> {
    let Value::Object(map) = value else {
        return Err(ConfigurationError::invalid(
            "",
            format!("Expected object, received {}", json_type_name(value)),
        ));
    };

    let mut reader = ObjectReader::new(map);
    let database_url = reader.string(FIELD_DATABASE_URL);
    let allow_write_ops = reader.boolean(FIELD_ALLOW_WRITE_OPS);
    let max_connections = reader.integer(
        FIELD_MAX_CONNECTIONS,
        MAX_CONNECTIONS_MIN,
        Some(MAX_CONNECTIONS_MAX),
    );
    let connection_timeout = reader.integer(
        FIELD_CONNECTION_TIMEOUT,
        CONNECTION_TIMEOUT_MIN_SECS,
        Some(CONNECTION_TIMEOUT_MAX_SECS),
    );
    let statement_timeout =
        reader.integer(FIELD_STATEMENT_TIMEOUT, STATEMENT_TIMEOUT_MIN_MS, None);
    let prepare_statements = reader.boolean(FIELD_PREPARE_STATEMENTS);
    let debug = reader.boolean(FIELD_DEBUG);
    let ssl_root_cert_path = reader.optional_string(FIELD_SSL_ROOT_CERT_PATH);
    let require_ssl = reader.optional_boolean(FIELD_REQUIRE_SSL);
    let ssl_reject_unauthorized = reader.optional_boolean(FIELD_SSL_REJECT_UNAUTHORIZED);
    let fetch_types = reader.optional_boolean(FIELD_FETCH_TYPES);
    let default_schema = reader.optional_string(FIELD_DEFAULT_SCHEMA);

    if !reader.errors.is_empty() {
        return Err(reader.finish());
    }

    match (
        database_url,
        allow_write_ops,
        max_connections,
        connection_timeout,
        statement_timeout,
        prepare_statements,
        debug,
    ) {
        (
            Some(database_url),
            Some(allow_write_ops),
            Some(max_connections),
            Some(connection_timeout),
            Some(statement_timeout),
            Some(prepare_statements),
            Some(debug),
        ) => Ok(ServerConfig {
            database_url,
            allow_write_ops,
            max_connections,
            connection_timeout,
            statement_timeout,
            prepare_statements,
            debug,
            ssl_root_cert_path,
            require_ssl,
            ssl_reject_unauthorized,
            fetch_types,
            default_schema,
        }),
        _ => Err(reader.finish()),
    }
}

/// Parse and validate a JSON document as a [`ServerConfig`].
///
/// # Errors
///
/// Returns `config:invalid_json` when the text is not JSON and
/// `config:validation_failed` when it does not match the config shape.
pub fn parse_server_config_json(input: &str) -> Result<ServerConfig, ErrorEnvelope> {
    let value: Value = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
        .with_metadata("line", error.line().to_string())
        .with_metadata("column", error.column().to_string())
    })?;
    validate_config_value(&value).map_err(ErrorEnvelope::from)
}

struct ObjectReader<'a> {
    map: &'a Map<String, Value>,
    errors: Vec<ConfigurationError>,
}

impl<'a> ObjectReader<'a> {
    const fn new(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            errors: Vec::new(),
        }
    }

    fn finish(self) -> ConfigurationError {
        ConfigurationError::new(
            self.errors
                .into_iter()
                .flat_map(|error| error.violations)
                .collect(),
        )
    }

    fn mismatch(&mut self, field: &'static str, expected: &str, found: &Value) {
        self.errors.push(ConfigurationError::invalid(
            field,
            format!("Expected {expected}, received {}", json_type_name(found)),
        ));
    }

    fn string(&mut self, field: &'static str) -> Option<String> {
        match self.map.get(field) {
            None => {
                self.errors.push(ConfigurationError::required(field));
                None
            },
            Some(value) => self.expect_string(field, value),
        }
    }

    fn optional_string(&mut self, field: &'static str) -> Option<String> {
        let value = self.map.get(field)?;
        self.expect_string(field, value)
    }

    fn expect_string(&mut self, field: &'static str, value: &Value) -> Option<String> {
        if let Value::String(text) = value {
            Some(text.clone())
        } else {
            self.mismatch(field, "string", value);
            None
        }
    }

    fn boolean(&mut self, field: &'static str) -> Option<bool> {
        match self.map.get(field) {
            None => {
                self.errors.push(ConfigurationError::required(field));
                None
            },
            Some(value) => self.expect_boolean(field, value),
        }
    }

    fn optional_boolean(&mut self, field: &'static str) -> Option<bool> {
        let value = self.map.get(field)?;
        self.expect_boolean(field, value)
    }

    fn expect_boolean(&mut self, field: &'static str, value: &Value) -> Option<bool> {
        if let Value::Bool(flag) = value {
            Some(*flag)
        } else {
            self.mismatch(field, "boolean", value);
            None
        }
    }

    fn integer(&mut self, field: &'static str, min: i64, max: Option<i64>) -> Option<i64> {
        let Some(value) = self.map.get(field) else {
            self.errors.push(ConfigurationError::required(field));
            return None;
        };
        let Value::Number(number) = value else {
            self.mismatch(field, "number", value);
            return None;
        };
        let Some(parsed) = integral_value(number) else {
            self.errors.push(ConfigurationError::invalid(
                field,
                "Expected integer, received float",
            ));
            return None;
        };
        if let Some(violation) = bound_violation(field, parsed, min, max) {
            self.errors.push(violation);
        }
        Some(parsed)
    }
}

fn integral_value(number: &serde_json::Number) -> Option<i64> {
    if let Some(value) = number.as_i64() {
        return Some(value);
    }
    if number.as_u64().is_some() {
        return Some(i64::MAX);
    }
    let value = number.as_f64()?;
    if value.is_finite() && value.fract() == 0.0 {
        Some(saturating_i64(value))
    } else {
        None
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "value is integral and `as` saturates at the i64 bounds"
)]
fn saturating_i64(value: f64) -> i64 {
    value as i64
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
