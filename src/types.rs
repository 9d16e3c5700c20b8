use std::str::FromStr;
use serde::Deserialize;

/// How the executor waits for a process that has a timeout.
///
/// - `Native`: race the OS exit notification against a deadline timer
///   (default).
/// - `Poll`: check liveness with `try_wait` every `poll_interval` until the
///   process exits or the deadline passes. Termination can then land up to
///   one interval past the deadline.
///
/// Runs without a timeout always use the native wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitStrategy {
    #[default]
    Native,
    Poll,
}

impl FromStr for WaitStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(WaitStrategy::Native),
            "poll" => Ok(WaitStrategy::Poll),
            other => Err(format!(
                "invalid wait_strategy: {other} (expected \"native\" or \"poll\")"
            )),
        }
    }
}
