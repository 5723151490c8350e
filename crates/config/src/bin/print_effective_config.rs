//! Print the effective server config loaded from the process environment.
//!
//! Credentials in the connection URL are stripped unless `--show-secrets`
//! is passed. Exit codes: 0 on success, 2 on a configuration error, 1 on
//! any other failure.

use clap::{Parser, ValueEnum};
use pgserver_config::env::ENV_DEBUG;
use pgserver_config::{
    ConfigurationError, EnvValue, load_config_std_env, parse_bool, to_pretty_json, to_pretty_toml,
};
use pgserver_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::io;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Toml,
}

#[derive(Debug, Parser)]
#[command(name = "print_effective_config", version, about)]
struct Cli {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Print the connection URL with credentials intact.
    #[arg(long)]
    show_secrets: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {}", error.message);
            if error.code == ConfigurationError::error_code() {
                ExitCode::from(EXIT_CONFIG_ERROR)
            } else {
                ExitCode::from(EXIT_FAILURE)
            }
        },
    }
}

fn run(cli: &Cli) -> Result<(), ErrorEnvelope> {
    let debug = std::env::var(ENV_DEBUG)
        .ok()
        .and_then(|raw| parse_bool(EnvValue::Text(&raw)))
        .unwrap_or(false);
    init_tracing(debug);

    let config = load_config_std_env()?;
    let config = if cli.show_secrets {
        config
    } else {
        config.redacted()
    };

    let output = match cli.format {
        OutputFormat::Json => to_pretty_json(&config)?,
        OutputFormat::Toml => to_pretty_toml(&config)?,
    };

    let mut stdout = io::stdout();
    stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::new("io", "stdout"),
                format!("failed to write config: {error}"),
                ErrorClass::NonRetriable,
            )
        })
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if let Err(error) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("warning: logging disabled: {error}");
    }
}
