//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/agentforge/) and project (.agentforge/)
//! level configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::{ProviderConfig, RetryPolicy};
use crate::constants;
use crate::loader::PythonCompilerConfig;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: ProviderConfig,

    /// State file locations
    pub state: StateConfig,

    /// Cache TTLs
    pub cache: CacheConfig,

    /// Retry behavior for transient LLM failures
    pub retry: RetryConfig,

    /// Python runtime used to load generated agents
    pub loader: LoaderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: ProviderConfig::default(),
            state: StateConfig::default(),
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
            loader: LoaderConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ForgeError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(crate::types::ForgeError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(crate::types::ForgeError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(crate::types::ForgeError::Config(
                "Retry max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.backoff_factor < 1.0 {
            return Err(crate::types::ForgeError::Config(format!(
                "Retry backoff_factor must be at least 1.0, got {}",
                self.retry.backoff_factor
            )));
        }

        if self.cache.ttl_secs == 0 {
            return Err(crate::types::ForgeError::Config(
                "Cache ttl_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// State Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding the persisted JSON stores
    pub data_dir: PathBuf,

    /// Keyword table and agent records
    pub keywords_file: String,

    /// Technology registry backing dynamic triggers
    pub registry_file: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".agentforge"),
            keywords_file: "keywords.json".to_string(),
            registry_file: "registry.json".to_string(),
        }
    }
}

impl StateConfig {
    pub fn keywords_path(&self) -> PathBuf {
        self.data_dir.join(&self.keywords_file)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(&self.registry_file)
    }
}

// =============================================================================
// Cache Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for prompt and result caches, in seconds
    pub ttl_secs: u64,

    /// TTL for catalog trigger lookups, in seconds
    pub catalog_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: constants::cache::DEFAULT_TTL_SECS,
            catalog_ttl_secs: constants::cache::CATALOG_TTL_SECS,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first
    pub max_attempts: usize,

    /// Initial backoff delay in milliseconds
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each failure
    pub backoff_factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: constants::retry::MAX_ATTEMPTS,
            initial_delay_ms: constants::retry::INITIAL_DELAY_MS,
            backoff_factor: constants::retry::BACKOFF_FACTOR,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            self.backoff_factor,
        )
    }
}

// =============================================================================
// Loader Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Interpreter binary used to probe and run generated agents
    pub python_bin: String,

    /// Directory for scratch files; the system temp dir when unset
    pub scratch_dir: Option<PathBuf>,

    /// Per-invocation wall-clock limit in seconds
    pub timeout_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            python_bin: constants::loader::PYTHON_BIN.to_string(),
            scratch_dir: None,
            timeout_secs: constants::loader::TIMEOUT_SECS,
        }
    }
}

impl LoaderConfig {
    pub fn compiler_config(&self) -> PythonCompilerConfig {
        PythonCompilerConfig {
            python_bin: self.python_bin.clone(),
            scratch_dir: self
                .scratch_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.backoff_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_state_paths_join_data_dir() {
        let state = StateConfig::default();
        assert_eq!(state.keywords_path(), PathBuf::from(".agentforge/keywords.json"));
        assert_eq!(state.registry_path(), PathBuf::from(".agentforge/registry.json"));
    }

    #[test]
    fn test_retry_config_builds_policy() {
        let policy = RetryConfig::default().policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.backoff_factor, 2.0);
    }
}
