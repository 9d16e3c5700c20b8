// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::WaitStrategy;

/// Command-line arguments for `procpump`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procpump",
    version,
    about = "Run a command, stream its output and kill it on timeout.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML).
    ///
    /// Default: `Procpump.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Kill the command after this many seconds (0 or less: never).
    ///
    /// Overrides `[exec].timeout_secs`.
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// How to wait for a command that has a timeout.
    #[arg(long, value_name = "STRATEGY")]
    pub wait_strategy: Option<WaitStrategy>,

    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Extra environment variable for the command. Repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub env: Vec<(String, String)>,

    /// File fed to the command's stdin; `-` for our own stdin.
    #[arg(long, value_name = "PATH")]
    pub stdin: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCPUMP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the parsed command vector and its rendered form, but don't run it.
    #[arg(long)]
    pub dry_run: bool,

    /// With `--dry-run`, also print the environment the command would get.
    #[arg(long, requires = "dry_run")]
    pub show_env: bool,

    /// Print each argument quoted with the `[quote]` options instead of
    /// running the command.
    #[arg(long, conflicts_with = "dry_run")]
    pub quote: bool,

    /// The command. A single word is split like a shell command line
    /// (honouring single and double quotes); several words are used as-is.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
