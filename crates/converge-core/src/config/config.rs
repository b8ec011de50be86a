//! Core configuration structures and file handling

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::error::{ConfigError, Result};
use crate::classify::CodePolicy;
use crate::retry::RetrySettings;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceConfig {
    /// Budget for create/delete retry loops
    #[serde(default)]
    pub retry: RetryConfig,

    /// Budget for state polling
    #[serde(default)]
    pub watch: WatchConfig,

    /// Status-code policy for create calls
    #[serde(default = "CodePolicy::create")]
    pub create: CodePolicy,

    /// Status-code policy for delete calls
    #[serde(default = "CodePolicy::delete")]
    pub delete: CodePolicy,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            watch: WatchConfig::default(),
            create: CodePolicy::create(),
            delete: CodePolicy::delete(),
        }
    }
}

/// Retry loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Overall deadline for one retry loop, in seconds
    #[serde(default = "default_retry_timeout")]
    pub timeout_secs: u64,

    /// Fixed delay between attempts, in milliseconds
    #[serde(default = "default_retry_delay")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_retry_timeout(),
            delay_ms: default_retry_delay(),
        }
    }
}

impl RetryConfig {
    pub fn settings(&self) -> RetrySettings {
        RetrySettings {
            timeout: Duration::from_secs(self.timeout_secs),
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

/// State polling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Overall deadline for one watch, in seconds
    #[serde(default = "default_watch_timeout")]
    pub timeout_secs: u64,

    /// Delay between reads, in milliseconds
    #[serde(default = "default_watch_delay")]
    pub delay_ms: u64,

    /// Consecutive target reads required before a watch succeeds
    #[serde(default = "default_target_occurrence")]
    pub continuous_target_occurrence: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_watch_timeout(),
            delay_ms: default_watch_delay(),
            continuous_target_occurrence: default_target_occurrence(),
        }
    }
}

impl WatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl ConvergenceConfig {
    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// A missing file is not an error: it yields the default configuration.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text, expanding `${VAR}` references first
    pub fn from_toml(content: &str) -> Result<Self> {
        let expanded_content = Self::expand_env_vars(content);
        let config: ConvergenceConfig = toml::from_str(&expanded_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = self.to_toml()?;
        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("rs", "converge", "converge").ok_or(ConfigError::ConfigDirError)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Check budgets and code policies for mistakes that would make every
    /// convergence fail or spin
    pub fn validate(&self) -> Result<()> {
        if self.retry.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "retry.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.watch.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "watch.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.watch.continuous_target_occurrence == 0 {
            return Err(ConfigError::Invalid(
                "watch.continuous_target_occurrence must be at least 1".to_string(),
            ));
        }

        for (name, policy) in [("create", &self.create), ("delete", &self.delete)] {
            if policy.stop.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{name}.stop must list at least one status code"
                )));
            }
            if !policy.stop.is_disjoint(&policy.retry) {
                return Err(ConfigError::Invalid(format!(
                    "{name}.stop and {name}.retry overlap: {} vs {}",
                    policy.stop, policy.retry
                )));
            }
            if let Some(code) = policy
                .stop
                .iter()
                .chain(policy.retry.iter())
                .find(|code| StatusCode::from_u16(*code).is_err())
            {
                return Err(ConfigError::Invalid(format!(
                    "{name}: {code} is not a valid HTTP status code"
                )));
            }
        }

        Ok(())
    }

    /// Expand environment variables in configuration content
    ///
    /// Unset variables are left as-is.
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

// Default value functions for serde
fn default_retry_timeout() -> u64 {
    300
}

fn default_retry_delay() -> u64 {
    5_000
}

fn default_watch_timeout() -> u64 {
    600
}

fn default_watch_delay() -> u64 {
    10_000
}

fn default_target_occurrence() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ConvergenceConfig::default();
        assert_eq!(config.retry.settings().timeout, Duration::from_secs(300));
        assert_eq!(config.retry.settings().delay, Duration::from_secs(5));
        assert_eq!(config.watch.timeout(), Duration::from_secs(600));
        assert_eq!(config.watch.delay(), Duration::from_secs(10));
        assert_eq!(config.create, CodePolicy::create());
        assert_eq!(config.delete, CodePolicy::delete());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = ConvergenceConfig::from_toml(
            r#"
[retry]
delay_ms = 250
"#,
        )
        .unwrap();

        assert_eq!(config.retry.delay_ms, 250);
        assert_eq!(config.retry.timeout_secs, 300);
        assert_eq!(config.watch, WatchConfig::default());
        assert_eq!(config.delete, CodePolicy::delete());
    }

    #[test]
    fn test_delete_policy_override() {
        let config = ConvergenceConfig::from_toml(
            r#"
[delete]
stop = [204]
retry = [409, 424]
"#,
        )
        .unwrap();

        assert!(config.delete.stop.contains(StatusCode::NO_CONTENT));
        assert!(!config.delete.stop.contains(StatusCode::CREATED));
    }

    #[test]
    fn test_overlapping_policy_rejected() {
        let err = ConvergenceConfig::from_toml(
            r#"
[create]
stop = [201, 409]
retry = [409]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("overlap"), "{err}");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ConvergenceConfig::from_toml("[retry]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_status_code_rejected() {
        let err = ConvergenceConfig::from_toml("[create]\nstop = [42]\nretry = []\n").unwrap_err();
        assert!(err.to_string().contains("42"), "{err}");
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut config = ConvergenceConfig::default();
        config.watch.continuous_target_occurrence = 3;

        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[watch]"));
        assert!(toml.contains("stop = ["));

        let parsed = ConvergenceConfig::from_toml(&toml).unwrap();
        assert_eq!(parsed, config);
    }
}
