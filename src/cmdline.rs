// src/cmdline.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::args;
use crate::errors::{ExecError, Result};

/// A program plus its arguments, with an optional working directory and
/// environment overrides.
///
/// The vector is never empty and its program is never the empty string; both
/// are checked on construction. The `with_*` methods consume the value and
/// return a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVector {
    argv: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    clear_env: bool,
}

impl CommandVector {
    /// Build from an explicit argument list. Index 0 is the program.
    pub fn new<I, S>(argv: I) -> std::result::Result<Self, ExecError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();

        match argv.first() {
            None => Err(ExecError::InvalidArgument(
                "command vector must not be empty".to_string(),
            )),
            Some(program) if program.is_empty() => Err(ExecError::InvalidArgument(
                "program name must not be empty".to_string(),
            )),
            Some(_) => Ok(Self {
                argv,
                working_dir: None,
                env: BTreeMap::new(),
                clear_env: false,
            }),
        }
    }

    /// Tokenize a command-line string and build a vector from it.
    pub fn parse(line: &str) -> Result<Self> {
        let argv = args::tokenize(line)?;
        Ok(Self::new(argv)?)
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the program.
    pub fn arguments(&self) -> &[String] {
        &self.argv[1..]
    }

    /// Program and arguments.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// True when the child sees only [`env_overrides`](Self::env_overrides)
    /// instead of inheriting the parent's environment.
    pub fn clears_env(&self) -> bool {
        self.clear_env
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_clear_env(mut self, clear: bool) -> Self {
        self.clear_env = clear;
        self
    }

    /// Render back into a single command-line string (see [`args::render`]).
    pub fn render(&self) -> String {
        args::render(&self.argv)
    }

    /// The process builder for this vector. Stdio wiring is left to the
    /// caller.
    pub(crate) fn to_command(&self) -> Command {
        let mut cmd = Command::new(self.program());
        cmd.args(self.arguments());

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        if self.clear_env {
            cmd.env_clear();
        }
        cmd.envs(&self.env);

        cmd
    }
}

impl fmt::Display for CommandVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
