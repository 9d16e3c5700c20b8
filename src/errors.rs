// src/errors.rs

//! Crate-wide error types.
//!
//! - [`ArgsError`] covers tokenizing and quoting of command lines.
//! - [`ExecError`] is the failure half of an [`ExecutionOutcome`].
//! - [`ProcpumpError`] wraps everything for the config loader and the CLI.
//!
//! [`ExecutionOutcome`]: crate::exec::ExecutionOutcome

use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArgsError {
    #[error("unbalanced quotes in {input}")]
    MalformedInput { input: String },

    #[error("can't handle single and double quotes in same argument: {argument}")]
    AmbiguousQuoting { argument: String },

    /// Every argument `try_render` could not quote, in input order.
    #[error("{} argument(s) could not be quoted", .failures.len())]
    Unquotable { failures: Vec<ArgsError> },
}

/// Why a wait on a running process was abandoned before it exited.
#[derive(Error, Debug)]
pub enum InterruptCause {
    #[error("cancelled by caller")]
    Cancelled,

    #[error("process registry is shutting down")]
    Shutdown,

    #[error("waiting for process failed: {0}")]
    Wait(#[source] io::Error),
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("invalid command line: {0}")]
    InvalidArgument(String),

    #[error("failed to start process `{program}`: {source}")]
    SpawnFailure {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("process timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("error while executing external command, process killed: {cause}")]
    Interrupted {
        #[source]
        cause: InterruptCause,
    },
}

#[derive(Error, Debug)]
pub enum ProcpumpError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ProcpumpError>;
