//! Config assembly from the environment, plus deterministic rendering.
//!
//! Loading never fails on a malformed URL or an unparseable flag; only a
//! missing/empty `DATABASE_URL` or an out-of-range value is an error.

use crate::connection_url::{
    parse_current_schema, remove_current_schema_from_url, sanitize_url_credentials,
};
use crate::env::{
    ENV_ALLOW_WRITE_OPS, ENV_CONNECTION_TIMEOUT, ENV_DATABASE_URL, ENV_DEBUG, ENV_FETCH_TYPES,
    ENV_MAX_CONNECTIONS, ENV_PREPARE_STATEMENTS, ENV_REQUIRE_SSL, ENV_SSL_REJECT_UNAUTHORIZED,
    ENV_SSL_ROOT_CERT, ENV_STATEMENT_TIMEOUT, PgEnv,
};
use crate::schema::{
    ConfigurationError, FIELD_ALLOW_WRITE_OPS, FIELD_CONNECTION_TIMEOUT, FIELD_DATABASE_URL,
    FIELD_DEBUG, FIELD_FETCH_TYPES, FIELD_MAX_CONNECTIONS, FIELD_PREPARE_STATEMENTS,
    FIELD_REQUIRE_SSL, FIELD_SSL_REJECT_UNAUTHORIZED, FIELD_SSL_ROOT_CERT_PATH,
    FIELD_STATEMENT_TIMEOUT, ServerConfig,
};
use pgserver_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Validate, ValidationError};
use std::collections::BTreeMap;
use url::Url;

/// Config field to the environment variable it is read from.
pub const FIELD_ENV_VARS: [(&str, &str); 11] = [
    (FIELD_DATABASE_URL, ENV_DATABASE_URL),
    (FIELD_ALLOW_WRITE_OPS, ENV_ALLOW_WRITE_OPS),
    (FIELD_MAX_CONNECTIONS, ENV_MAX_CONNECTIONS),
    (FIELD_CONNECTION_TIMEOUT, ENV_CONNECTION_TIMEOUT),
    (FIELD_STATEMENT_TIMEOUT, ENV_STATEMENT_TIMEOUT),
    (FIELD_PREPARE_STATEMENTS, ENV_PREPARE_STATEMENTS),
    (FIELD_DEBUG, ENV_DEBUG),
    (FIELD_SSL_ROOT_CERT_PATH, ENV_SSL_ROOT_CERT),
    (FIELD_REQUIRE_SSL, ENV_REQUIRE_SSL),
    (FIELD_SSL_REJECT_UNAUTHORIZED, ENV_SSL_REJECT_UNAUTHORIZED),
    (FIELD_FETCH_TYPES, ENV_FETCH_TYPES),
];

/// Load and validate the server config from an environment snapshot.
///
/// # Errors
///
/// Returns [`ConfigurationError`] when `DATABASE_URL` is missing or empty,
/// or when a numeric setting is out of range. All of these are reported
/// together.
pub fn load_config(env: &BTreeMap<String, String>) -> Result<ServerConfig, ConfigurationError> {
    load_config_from_env(&PgEnv::from_map(env))
}

/// Load and validate the server config from the process environment.
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_config_std_env() -> Result<ServerConfig, ConfigurationError> {
    load_config_from_env(&PgEnv::from_std_env())
}

/// Assemble and validate the server config from already coerced values.
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_config_from_env(env: &PgEnv) -> Result<ServerConfig, ConfigurationError> {
    let url_violation = match env.database_url.as_deref() {
        None => Some(ConfigurationError::required(ENV_DATABASE_URL)),
        Some("") => Some(ConfigurationError::invalid(
            ENV_DATABASE_URL,
            "DATABASE_URL is required",
        )),
        Some(_) => None,
    };
    let raw_url = env.database_url.as_deref().unwrap_or_default();

    if url_violation.is_none() && Url::parse(raw_url).is_err() {
        tracing::warn!(
            env_var = ENV_DATABASE_URL,
            "connection URL is not a parseable URL; passing it through unchanged"
        );
    }

    let default_schema = parse_current_schema(raw_url);
    let database_url = remove_current_schema_from_url(raw_url);
    if let Some(schema) = default_schema.as_deref() {
        tracing::debug!(schema, "stripped currentSchema from connection URL");
    }

    let config = ServerConfig {
        database_url,
        allow_write_ops: env.allow_write_ops,
        max_connections: env.max_connections,
        connection_timeout: env.connection_timeout,
        statement_timeout: env.statement_timeout,
        prepare_statements: env.prepare_statements,
        debug: env.debug,
        ssl_root_cert_path: env.ssl_root_cert.clone(),
        require_ssl: env.require_ssl.then_some(true),
        ssl_reject_unauthorized: env.ssl_reject_unauthorized.then_some(true),
        fetch_types: env.fetch_types.then_some(true),
        default_schema,
    };

    let field_errors = config
        .validate()
        .err()
        .map(|error| error.with_env_sources(&FIELD_ENV_VARS));
    ConfigurationError::collect(url_violation.into_iter().chain(field_errors))?;

    tracing::debug!(
        database_url = %sanitize_url_credentials(&config.database_url),
        max_connections = config.max_connections,
        connection_timeout = config.connection_timeout,
        statement_timeout = config.statement_timeout,
        allow_write_ops = config.allow_write_ops,
        "loaded server config"
    );
    Ok(config)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
///
/// # Errors
///
/// Returns `config:serialize_json` if serialization fails.
pub fn to_pretty_json(config: &ServerConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_json"),
            format!("failed to serialize config JSON: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
///
/// # Errors
///
/// Returns `config:serialize_toml` if serialization fails.
pub fn to_pretty_toml(config: &ServerConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}
