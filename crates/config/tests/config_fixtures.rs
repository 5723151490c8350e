//! Integration tests for validating JSON config documents.

use pgserver_config::{parse_server_config_json, to_pretty_json};
use std::error::Error;
use std::fs;
use std::path::Path;

fn read_fixture(relative: &str) -> Result<String, Box<dyn Error>> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative);
    Ok(fs::read_to_string(path)?)
}

#[test]
fn valid_fixture_parses() -> Result<(), Box<dyn Error>> {
    let config = parse_server_config_json(&read_fixture("config/valid.json")?)?;

    assert_eq!(config.database_url, "postgresql://h/db");
    assert_eq!(config.max_connections, 10);
    assert_eq!(config.require_ssl, None);
    assert_eq!(config.default_schema.as_deref(), Some("public"));
    Ok(())
}

#[test]
fn valid_fixture_renders_back_to_equivalent_json() -> Result<(), Box<dyn Error>> {
    let input = read_fixture("config/valid.json")?;
    let config = parse_server_config_json(&input)?;

    let rendered: serde_json::Value = serde_json::from_str(&to_pretty_json(&config)?)?;
    let original: serde_json::Value = serde_json::from_str(&input)?;
    assert_eq!(rendered, original);
    Ok(())
}

#[test]
fn invalid_types_are_reported_together() -> Result<(), Box<dyn Error>> {
    let Err(error) = parse_server_config_json(&read_fixture("config/invalid-types.json")?) else {
        return Err("expected invalid-types fixture to fail".into());
    };

    assert_eq!(error.code.to_string(), "config:validation_failed");
    assert_eq!(
        error.message,
        "Configuration validation failed: \
         databaseUrl: Expected string, received number, \
         allowWriteOps: Expected boolean, received string, \
         statementTimeout: Required, \
         defaultSchema: Expected string, received null"
    );
    assert_eq!(
        error.metadata.get("fields").map(String::as_str),
        Some("databaseUrl,allowWriteOps,statementTimeout,defaultSchema")
    );
    Ok(())
}

#[test]
fn out_of_range_fixture_is_rejected() -> Result<(), Box<dyn Error>> {
    let Err(error) = parse_server_config_json(&read_fixture("config/out-of-range.json")?) else {
        return Err("expected out-of-range fixture to fail".into());
    };

    assert_eq!(
        error.message,
        "Configuration validation failed: \
         maxConnections: Number must be greater than or equal to 1, \
         connectionTimeout: Number must be less than or equal to 300"
    );
    assert_eq!(error.metadata.get("count").map(String::as_str), Some("2"));
    Ok(())
}

#[test]
fn malformed_json_is_not_a_validation_error() -> Result<(), Box<dyn Error>> {
    let Err(error) = parse_server_config_json("{\"databaseUrl\": ") else {
        return Err("expected malformed JSON to fail".into());
    };

    assert_eq!(error.code.to_string(), "config:invalid_json");
    Ok(())
}
