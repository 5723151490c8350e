//! # pgserver-config
//!
//! Environment-driven configuration for the PostgreSQL server: permissive
//! coercion of env values, `currentSchema` handling for the connection URL,
//! and structural validation of the assembled [`ServerConfig`].
//! This crate depends on `shared` only.

/// Connection URL helpers (`currentSchema`, credential stripping).
pub mod connection_url;
/// JSON Schema export for the server config.
pub mod config_schema;
/// Environment variable names, defaults, and coercion.
pub mod env;
/// Config assembly and rendering.
pub mod load;
/// Config shape, bounds, and validation.
pub mod schema;

pub use config_schema::server_config_schema;
pub use connection_url::{
    CURRENT_SCHEMA_PARAM, parse_current_schema, remove_current_schema_from_url,
    sanitize_url_credentials,
};
pub use env::{
    EnvValue, PgEnv, coerce_bool, coerce_int, parse_bool, parse_int, snapshot_std_env,
};
pub use load::{
    FIELD_ENV_VARS, load_config, load_config_from_env, load_config_std_env, to_pretty_json,
    to_pretty_toml,
};
pub use schema::{
    ConfigurationError, FieldViolation, ServerConfig, parse_server_config_json, validate_config,
    validate_config_value,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
