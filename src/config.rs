use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_POLICY_PATH: &str = "SCRIBBLE_POLICY_PATH";
pub const ENV_WRITE_TIMEOUT_MS: &str = "SCRIBBLE_POLICY_WRITE_TIMEOUT_MS";

const DEFAULT_POLICY_PATH: &str = "policy.csv";
const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5_000;

// Authorization settings, usually sourced from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    /// Policy file read at startup and appended to by group writes.
    pub policy_path: PathBuf,
    /// Bound on store writes whose context carries no deadline.
    pub write_timeout_ms: u64,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        AuthzConfig {
            policy_path: PathBuf::from(DEFAULT_POLICY_PATH),
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}

impl AuthzConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AuthzConfig::default();

        if let Some(path) = lookup(ENV_POLICY_PATH).filter(|p| !p.trim().is_empty()) {
            config.policy_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_WRITE_TIMEOUT_MS) {
            let value: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                name: ENV_WRITE_TIMEOUT_MS.to_string(),
                reason: format!("{e}"),
            })?;
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    name: ENV_WRITE_TIMEOUT_MS.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.write_timeout_ms = value;
        }

        Ok(config)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}
