// src/exec/executor.rs

//! Runs one external process to completion.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::cmdline::CommandVector;
use crate::config::ExecSection;
use crate::errors::{ExecError, InterruptCause};
use crate::types::WaitStrategy;

use super::pump::StreamPump;
use super::registry::{ProcessRegistry, Registration};
use super::sink::{LineCollector, NullConsumer, StreamConsumer};

/// Exit code of a process that ran to completion, or why there is none.
pub type ExecutionOutcome = std::result::Result<i32, ExecError>;

/// Source copied into the child's stdin.
pub type InputSource = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    pub wait_strategy: WaitStrategy,
    /// Liveness check interval for [`WaitStrategy::Poll`].
    pub poll_interval: Duration,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            wait_strategy: WaitStrategy::Native,
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl From<&ExecSection> for ExecutorOptions {
    fn from(section: &ExecSection) -> Self {
        Self {
            wait_strategy: section.wait_strategy,
            poll_interval: Duration::from_millis(section.poll_interval_ms),
        }
    }
}

/// Everything one execution needs besides the executor itself.
pub struct ExecuteRequest {
    command: CommandVector,
    stdin: Option<InputSource>,
    stdout: Arc<dyn StreamConsumer>,
    stderr: Arc<dyn StreamConsumer>,
    timeout: Option<Duration>,
    cancel: Option<oneshot::Receiver<()>>,
}

impl ExecuteRequest {
    /// No input, output discarded, no timeout.
    pub fn new(command: CommandVector) -> Self {
        Self {
            command,
            stdin: None,
            stdout: Arc::new(NullConsumer),
            stderr: Arc::new(NullConsumer),
            timeout: None,
            cancel: None,
        }
    }

    pub fn stdin<R>(mut self, source: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        self.stdin = Some(Box::new(source));
        self
    }

    pub fn stdout(mut self, consumer: Arc<dyn StreamConsumer>) -> Self {
        self.stdout = consumer;
        self
    }

    pub fn stderr(mut self, consumer: Arc<dyn StreamConsumer>) -> Self {
        self.stderr = consumer;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Timeout in whole seconds; zero or negative means none.
    pub fn timeout_secs(self, secs: i64) -> Self {
        let timeout = u64::try_from(secs).ok().map(Duration::from_secs);
        self.timeout(timeout)
    }

    /// Kill the process and fail with [`ExecError::Interrupted`] once a value
    /// is sent on the paired sender. Dropping the sender does nothing.
    pub fn cancel_on(mut self, cancel: oneshot::Receiver<()>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn command(&self) -> &CommandVector {
        &self.command
    }
}

/// Output of [`ProcessExecutor::capture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub exit_code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Spawns processes, drains their output and enforces timeouts.
///
/// Every spawned process is registered in the executor's [`ProcessRegistry`]
/// for as long as the executor is waiting on it.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    registry: ProcessRegistry,
    options: ExecutorOptions,
}

enum WaitEnd {
    Exited(ExitStatus),
    TimedOut(Duration),
    Interrupted(InterruptCause),
}

/// The (up to) three pumps attached to one child.
struct Pumps {
    feeder: Option<StreamPump>,
    stdout: Option<StreamPump>,
    stderr: Option<StreamPump>,
}

impl Pumps {
    fn start(
        child: &mut Child,
        stdin: Option<InputSource>,
        stdout: Arc<dyn StreamConsumer>,
        stderr: Arc<dyn StreamConsumer>,
    ) -> Self {
        let feeder = match (stdin, child.stdin.take()) {
            (Some(source), Some(pipe)) => Some(StreamPump::spawn_feeder("stdin", source, pipe)),
            _ => None,
        };
        let stdout = child
            .stdout
            .take()
            .map(|pipe| StreamPump::spawn("stdout", pipe, stdout));
        let stderr = child
            .stderr
            .take()
            .map(|pipe| StreamPump::spawn("stderr", pipe, stderr));

        Self {
            feeder,
            stdout,
            stderr,
        }
    }

    /// Wait for every pump to report done.
    async fn join(&mut self) {
        for pump in [&mut self.feeder, &mut self.stdout, &mut self.stderr]
            .into_iter()
            .flatten()
        {
            let state = pump.wait().await;
            debug!(pump = pump.name(), ?state, "pump done");
        }
    }

    fn close(&mut self) {
        for pump in [&mut self.feeder, &mut self.stdout, &mut self.stderr]
            .into_iter()
            .flatten()
        {
            pump.close();
        }
    }
}

impl ProcessExecutor {
    pub fn new(registry: ProcessRegistry) -> Self {
        Self::with_options(registry, ExecutorOptions::default())
    }

    pub fn with_options(registry: ProcessRegistry, options: ExecutorOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Run the request's command to completion.
    ///
    /// stdout and stderr are drained concurrently from the moment the process
    /// starts, so a child writing more than a pipe buffer's worth never
    /// blocks. On success every line the child wrote has been delivered to
    /// the consumers before this returns. After a timeout or interruption the
    /// consumers may only have seen a prefix.
    pub async fn execute(&self, request: ExecuteRequest) -> ExecutionOutcome {
        let ExecuteRequest {
            command,
            stdin,
            stdout,
            stderr,
            timeout,
            cancel,
        } = request;

        let program = command.program().to_string();

        let mut cmd = command.to_command();
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| ExecError::SpawnFailure {
            program: program.clone(),
            source,
        })?;

        let pid = child.id();
        let mut registration = self.registry.add(pid, &program);
        info!(program = %program, pid, timeout = ?timeout, "started process");

        let mut pumps = Pumps::start(&mut child, stdin, stdout, stderr);

        let outcome = self
            .supervise(&mut child, &mut registration, &mut pumps, timeout, cancel)
            .await;

        pumps.close();
        outcome
    }

    /// Run `command` with its output collected in memory.
    pub async fn capture(
        &self,
        command: CommandVector,
        timeout: Option<Duration>,
    ) -> std::result::Result<CapturedOutput, ExecError> {
        let stdout = Arc::new(LineCollector::new());
        let stderr = Arc::new(LineCollector::new());

        let request = ExecuteRequest::new(command)
            .stdout(stdout.clone())
            .stderr(stderr.clone())
            .timeout(timeout);

        let exit_code = self.execute(request).await?;

        Ok(CapturedOutput {
            exit_code,
            stdout: stdout.take(),
            stderr: stderr.take(),
        })
    }

    async fn supervise(
        &self,
        child: &mut Child,
        registration: &mut Registration,
        pumps: &mut Pumps,
        timeout: Option<Duration>,
        cancel: Option<oneshot::Receiver<()>>,
    ) -> ExecutionOutcome {
        let pid = child.id();

        match self.wait_for_exit(child, registration, timeout, cancel).await {
            WaitEnd::Exited(status) => {
                // A descendant holding the pipes open can keep the join going
                // after the child exits; shutdown still has to get through.
                let drained = tokio::select! {
                    biased;

                    _ = pumps.join() => true,
                    _ = registration.kill_requested() => false,
                };
                self.registry.remove(registration.id());

                if !drained {
                    info!(pid, "shutdown requested while draining output; closing pumps");
                    pumps.close();
                    return Err(ExecError::Interrupted {
                        cause: InterruptCause::Shutdown,
                    });
                }

                let code = exit_code(status);
                info!(pid, exit_code = code, success = status.success(), "process exited");
                Ok(code)
            }
            WaitEnd::TimedOut(timeout) => {
                warn!(pid, timeout = ?timeout, "process timed out; killing");
                kill(child).await;
                self.registry.remove(registration.id());
                Err(ExecError::Timeout { timeout })
            }
            WaitEnd::Interrupted(cause) => {
                info!(pid, cause = %cause, "wait interrupted; killing process");
                kill(child).await;
                self.registry.remove(registration.id());
                Err(ExecError::Interrupted { cause })
            }
        }
    }

    async fn wait_for_exit(
        &self,
        child: &mut Child,
        registration: &mut Registration,
        timeout: Option<Duration>,
        cancel: Option<oneshot::Receiver<()>>,
    ) -> WaitEnd {
        let deadline = timeout.map(|t| Instant::now() + t);

        let expired = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        let cancelled = async move {
            match cancel {
                Some(rx) => {
                    if rx.await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending().await,
            }
        };

        let poll_interval = match (self.options.wait_strategy, timeout) {
            (WaitStrategy::Poll, Some(_)) => Some(self.options.poll_interval),
            _ => None,
        };

        tokio::select! {
            biased;

            status = exit_status(child, poll_interval) => match status {
                Ok(status) => WaitEnd::Exited(status),
                Err(e) => WaitEnd::Interrupted(InterruptCause::Wait(e)),
            },
            _ = expired => WaitEnd::TimedOut(timeout.unwrap_or_default()),
            _ = registration.kill_requested() => WaitEnd::Interrupted(InterruptCause::Shutdown),
            _ = cancelled => WaitEnd::Interrupted(InterruptCause::Cancelled),
        }
    }
}

/// Wait for `child` to exit, either through the native wait or by checking
/// liveness every `poll_interval`.
async fn exit_status(child: &mut Child, poll_interval: Option<Duration>) -> io::Result<ExitStatus> {
    let Some(interval) = poll_interval else {
        return child.wait().await;
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        sleep(interval).await;
    }
}

/// Forcefully terminate and reap `child`. Errors are logged, not returned.
async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(pid = child.id(), error = %e, "failed to kill child process");
    }
}

/// Exit code of `status`. On Unix a process killed by a signal reports
/// `128 + signal`, as shells do; anything else without a code is `-1`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
