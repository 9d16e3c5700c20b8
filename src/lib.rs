// src/lib.rs

pub mod args;
pub mod cli;
pub mod cmdline;
pub mod config;
pub mod env;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::cmdline::CommandVector;
use crate::config::{load_or_default, ConfigFile};
use crate::env::{effective_env, HostEnvironment};
use crate::errors::ExecError;
use crate::exec::{ExecuteRequest, ExecutorOptions, ProcessExecutor, ProcessRegistry, WriterConsumer};

/// Exit code used when the command timed out (as `timeout(1)` does).
pub const EXIT_TIMEOUT: i32 = 124;

/// Exit code used when the command was interrupted (Ctrl-C).
pub const EXIT_INTERRUPTED: i32 = 130;

/// Exit code used when our stdout was closed by its reader (`128 + SIGPIPE`).
pub const EXIT_BROKEN_PIPE: i32 = 141;

/// High-level entry point used by `main.rs`. Returns the exit code for the
/// `procpump` process.
///
/// This wires together:
/// - config loading
/// - command vector construction (tokenizing a single-word command)
/// - process registry + Ctrl-C handling
/// - executor
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_or_default(args.config.as_deref())?;
    let command = build_command(&args, &cfg)?;

    if args.quote {
        print_quoted(&command, &cfg)?;
        return Ok(0);
    }

    if args.dry_run {
        print_dry_run(&command, args.show_env)?;
        return Ok(0);
    }

    let registry = ProcessRegistry::new();
    let grace = cfg.exec.shutdown_grace();

    // Ctrl-C -> kill everything registered. The guard covers every other
    // way out of this function.
    let _ctrl_c = registry.spawn_ctrl_c_listener(grace);
    let _guard = registry.shutdown_guard();

    let mut options = ExecutorOptions::from(&cfg.exec);
    if let Some(strategy) = args.wait_strategy {
        options.wait_strategy = strategy;
    }
    let executor = ProcessExecutor::with_options(registry.clone(), options);

    // Once our own stdout is gone (e.g. `procpump ... | head`) there is no
    // point keeping the child alive.
    let stdout = Arc::new(WriterConsumer::stdout().on_broken_pipe({
        let registry = registry.clone();
        move || {
            registry.kill_all();
        }
    }));
    let stderr = Arc::new(WriterConsumer::stderr());

    let request = ExecuteRequest::new(command.clone())
        .stdout(stdout.clone())
        .stderr(stderr);
    let mut request = match args.timeout {
        Some(secs) => request.timeout_secs(secs),
        None => request.timeout(cfg.exec.timeout()),
    };

    match args.stdin.as_deref() {
        None => {}
        Some("-") => request = request.stdin(tokio::io::stdin()),
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening stdin file '{path}'"))?;
            request = request.stdin(file);
        }
    }

    info!(command = %command, "running command");

    let outcome = executor.execute(request).await;
    let code = match outcome {
        _ if stdout.is_broken_pipe() => {
            debug!("stdout closed by reader; child stopped");
            EXIT_BROKEN_PIPE
        }
        Ok(code) => code,
        Err(err @ ExecError::Timeout { .. }) => {
            report(&err);
            EXIT_TIMEOUT
        }
        Err(err @ ExecError::Interrupted { .. }) => {
            report(&err);
            EXIT_INTERRUPTED
        }
        Err(err) => return Err(err.into()),
    };

    let killed = registry.shutdown(grace).await;
    debug!(exit_code = code, killed, "run complete");
    Ok(code)
}

/// Best-effort message on stderr; a closed stderr is not worth a panic.
fn report(err: &ExecError) {
    let _ = writeln!(std::io::stderr(), "procpump: {err}");
}

/// Build the command vector from the CLI words plus config/CLI overrides.
fn build_command(args: &CliArgs, cfg: &ConfigFile) -> Result<CommandVector> {
    let mut command = match args.command.as_slice() {
        [line] => CommandVector::parse(line)?,
        words => CommandVector::new(words.iter().cloned())?,
    };

    command = command
        .with_clear_env(cfg.exec.clear_env)
        .with_envs(cfg.env.clone())
        .with_envs(args.env.iter().cloned());

    if let Some(dir) = args.cwd.as_ref().or(cfg.exec.working_dir.as_ref()) {
        command = command.with_working_dir(dir);
    }

    Ok(command)
}

fn print_quoted(command: &CommandVector, cfg: &ConfigFile) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for arg in command.argv() {
        writeln!(out, "{}", args::quote_with(arg, &cfg.quote)?)?;
    }
    Ok(())
}

/// Simple dry-run output: print the vector, its rendering and optionally the
/// environment.
fn print_dry_run(command: &CommandVector, show_env: bool) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "procpump dry-run")?;
    writeln!(out, "  program: {}", command.program())?;
    for (i, arg) in command.arguments().iter().enumerate() {
        writeln!(out, "  arg[{}]: {}", i + 1, arg)?;
    }
    writeln!(out, "  rendered: {}", command.render())?;
    if let Some(dir) = command.working_dir() {
        writeln!(out, "  cwd: {}", dir.display())?;
    }

    if show_env {
        let env = effective_env(
            &HostEnvironment::new(),
            command.env_overrides(),
            command.clears_env(),
        )
        .context("reading host environment")?;
        writeln!(out)?;
        writeln!(out, "environment ({}):", env.len())?;
        for (key, value) in env.iter() {
            writeln!(out, "  {key}={value}")?;
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
