// src/env.rs

//! Host environment lookup.
//!
//! Executions only need a string-to-string mapping; where it comes from is
//! behind [`EnvironmentProvider`] so callers (and tests) can substitute their
//! own source.

use std::collections::BTreeMap;
use std::io;

pub trait EnvironmentProvider: Send + Sync {
    /// Snapshot of the environment variables.
    fn vars(&self) -> io::Result<BTreeMap<String, String>>;
}

/// Reads the environment of the current process.
#[derive(Debug, Clone, Copy)]
pub struct HostEnvironment {
    case_sensitive: bool,
}

impl HostEnvironment {
    pub fn new() -> Self {
        Self {
            case_sensitive: true,
        }
    }

    /// Upper-case every key, for hosts where variable names are
    /// case-insensitive. Later duplicates win.
    pub fn case_insensitive() -> Self {
        Self {
            case_sensitive: false,
        }
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentProvider for HostEnvironment {
    fn vars(&self) -> io::Result<BTreeMap<String, String>> {
        let vars = std::env::vars_os()
            .map(|(k, v)| {
                let key = k.to_string_lossy().into_owned();
                let key = if self.case_sensitive {
                    key
                } else {
                    key.to_uppercase()
                };
                (key, v.to_string_lossy().into_owned())
            })
            .collect();
        Ok(vars)
    }
}

/// Environment the child of `provider` would see: the provider's variables
/// (unless `clear` is set) overlaid with `overrides`.
pub fn effective_env(
    provider: &dyn EnvironmentProvider,
    overrides: &BTreeMap<String, String>,
    clear: bool,
) -> io::Result<BTreeMap<String, String>> {
    let mut env = if clear {
        BTreeMap::new()
    } else {
        provider.vars()?
    };
    env.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(env)
}
