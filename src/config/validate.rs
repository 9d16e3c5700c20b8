// src/config/validate.rs

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ProcpumpError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ProcpumpError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.exec, raw.env, raw.quote))
    }
}

/// Run every check on a raw config without consuming it.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_exec_section(cfg)?;
    validate_env_names(cfg)?;
    Ok(())
}

fn validate_exec_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.exec.poll_interval_ms == 0 {
        return Err(ProcpumpError::ConfigError(
            "[exec].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(dir) = &cfg.exec.working_dir {
        if !dir.is_dir() {
            return Err(ProcpumpError::ConfigError(format!(
                "[exec].working_dir '{}' is not an existing directory",
                dir.display()
            )));
        }
    }

    Ok(())
}

fn validate_env_names(cfg: &RawConfigFile) -> Result<()> {
    let valid = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
        .map_err(|e| ProcpumpError::ConfigError(format!("invalid env name pattern: {e}")))?;

    for name in cfg.env.keys() {
        if !valid.is_match(name) {
            return Err(ProcpumpError::ConfigError(format!(
                "[env] has invalid variable name '{}'",
                name
            )));
        }
    }
    Ok(())
}
