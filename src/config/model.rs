// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::args::QuoteOptions;
use crate::types::WaitStrategy;

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [exec]
/// timeout_secs = 30
/// wait_strategy = "poll"
/// poll_interval_ms = 10
///
/// [env]
/// RUST_LOG = "debug"
///
/// [quote]
/// force = true
/// ```
///
/// All sections are optional and have reasonable defaults. Turn it into a
/// [`ConfigFile`] with `ConfigFile::try_from`, which validates it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Execution behaviour from `[exec]`.
    #[serde(default)]
    pub exec: ExecSection,

    /// Environment overrides for every launched process, from `[env]`.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Options for the single-argument quoter, from `[quote]`.
    #[serde(default)]
    pub quote: QuoteOptions,
}

/// Validated configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub exec: ExecSection,
    pub env: BTreeMap<String, String>,
    pub quote: QuoteOptions,
}

impl ConfigFile {
    /// Assemble without validation. Only the validator calls this.
    pub(crate) fn new_unchecked(
        exec: ExecSection,
        env: BTreeMap<String, String>,
        quote: QuoteOptions,
    ) -> Self {
        Self { exec, env, quote }
    }
}

/// `[exec]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecSection {
    /// Seconds before a running process is killed. Zero or negative disables
    /// the timeout.
    #[serde(default)]
    pub timeout_secs: i64,

    /// `"native"` (default) or `"poll"`.
    #[serde(default)]
    pub wait_strategy: WaitStrategy,

    /// Interval between liveness checks when `wait_strategy = "poll"`.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Working directory for launched processes. Defaults to the current one.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// If true, processes see only the `[env]` variables instead of
    /// inheriting ours.
    #[serde(default)]
    pub clear_env: bool,

    /// How long shutdown waits for killed processes to be reaped.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_shutdown_grace_ms() -> u64 {
    2000
}

impl Default for ExecSection {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            wait_strategy: WaitStrategy::default(),
            poll_interval_ms: default_poll_interval_ms(),
            working_dir: None,
            clear_env: false,
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl ExecSection {
    /// `timeout_secs` as a duration, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        u64::try_from(self.timeout_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
