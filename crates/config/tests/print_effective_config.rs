//! End-to-end tests for the `print_effective_config` binary.

use std::error::Error;
use std::process::{Command, Output};

fn run(env: &[(&str, &str)], args: &[&str]) -> Result<Output, Box<dyn Error>> {
    let output = Command::new(env!("CARGO_BIN_EXE_print_effective_config"))
        .env_clear()
        .envs(env.iter().copied())
        .args(args)
        .output()?;
    Ok(output)
}

#[test]
fn prints_redacted_json_by_default() -> Result<(), Box<dyn Error>> {
    let output = run(
        &[(
            "DATABASE_URL",
            "postgresql://app:hunter2@db:5432/orders?currentSchema=billing",
        )],
        &[],
    )?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    let value: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(value["databaseUrl"], "postgresql://db:5432/orders");
    assert_eq!(value["defaultSchema"], "billing");
    assert_eq!(value["maxConnections"], 10);
    assert!(!stdout.contains("hunter2"));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(!stderr.contains("logging disabled"));
    Ok(())
}

#[test]
fn show_secrets_keeps_credentials() -> Result<(), Box<dyn Error>> {
    let output = run(
        &[("DATABASE_URL", "postgresql://app:hunter2@db:5432/orders")],
        &["--show-secrets"],
    )?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("postgresql://app:hunter2@db:5432/orders"));
    Ok(())
}

#[test]
fn prints_toml_on_request() -> Result<(), Box<dyn Error>> {
    let output = run(
        &[
            ("DATABASE_URL", "postgresql://h/db"),
            ("PG_MAX_CONNECTIONS", "12"),
        ],
        &["--format", "toml"],
    )?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("maxConnections = 12"));
    assert!(stdout.ends_with('\n'));
    Ok(())
}

#[test]
fn configuration_errors_exit_with_code_two() -> Result<(), Box<dyn Error>> {
    let output = run(&[("PG_MAX_CONNECTIONS", "500")], &[])?;

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains(
        "DATABASE_URL: Required, \
         maxConnections: Number must be less than or equal to 100 (from PG_MAX_CONNECTIONS)"
    ));
    Ok(())
}

#[test]
fn out_of_range_values_exit_with_code_two() -> Result<(), Box<dyn Error>> {
    let output = run(
        &[
            ("DATABASE_URL", "postgresql://h/db"),
            ("PG_MAX_CONNECTIONS", "500"),
        ],
        &[],
    )?;

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("(from PG_MAX_CONNECTIONS)"));
    Ok(())
}
