// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running external commands, using
//! `tokio::process::Command`, and getting their output back to the caller
//! line by line.
//!
//! - [`executor`] owns [`ProcessExecutor`], which spawns a process, wires up
//!   the pumps, enforces the timeout and produces the exit code.
//! - [`pump`] contains the background drain/feed tasks.
//! - [`registry`] tracks live processes so they can all be killed at
//!   shutdown.
//! - [`sink`] defines [`StreamConsumer`] and a few stock consumers.

pub mod executor;
pub mod pump;
pub mod registry;
pub mod sink;

pub use executor::{
    CapturedOutput, ExecuteRequest, ExecutionOutcome, ExecutorOptions, InputSource,
    ProcessExecutor,
};
pub use pump::{PumpState, StreamPump};
pub use registry::{ProcessId, ProcessRegistry, RegisteredProcess, Registration, ShutdownGuard};
pub use sink::{LineCollector, NullConsumer, StreamConsumer, TracingConsumer, WriterConsumer};
