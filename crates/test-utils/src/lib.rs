pub mod consumers;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

use procpump::cmdline::CommandVector;
use procpump::exec::{ProcessExecutor, ProcessRegistry};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// `sh -c <script>`.
pub fn sh(script: &str) -> CommandVector {
    CommandVector::new(["sh", "-c", script]).expect("sh command vector is non-empty")
}

/// An executor with its own registry, so tests never share state.
pub fn isolated_executor() -> (ProcessExecutor, ProcessRegistry) {
    let registry = ProcessRegistry::new();
    (ProcessExecutor::new(registry.clone()), registry)
}

/// True if a process with this pid exists and is not a zombie.
///
/// Reads `/proc` where available, otherwise falls back to `kill -0` (which
/// also counts unreaped zombies as alive).
pub fn pid_alive(pid: u32) -> bool {
    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        let state = stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next());
        return !matches!(state, Some('Z') | Some('X') | None);
    }
    if std::path::Path::new("/proc/self").exists() {
        return false;
    }

    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
