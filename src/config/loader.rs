//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/agentforge/config.toml)
//! 3. Project config (.agentforge/config.toml)
//! 4. Environment variables (AGENTFORGE_* prefix)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::{debug, info};

use super::types::Config;
use crate::types::{ForgeError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. AGENTFORGE_LLM_MODEL -> llm.model
        figment = figment.merge(Env::prefixed("AGENTFORGE_").split('_').lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ForgeError::Config(format!("Configuration error: {e}")))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ForgeError::Config(format!("Configuration error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (~/.config/agentforge/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("agentforge"))
    }

    /// Global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Project config file path
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".agentforge/config.toml")
    }

    /// Project data directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".agentforge")
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize the project directory with a default config
    pub fn init_project() -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        fs::create_dir_all(&project_dir)?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        }

        Ok(project_dir)
    }

    /// Default project config content (TOML)
    fn default_project_config() -> String {
        r#"# AgentForge Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

# LLM settings (for agent generation)
[llm]
provider = "openai"
timeout_secs = 120
temperature = 0.7

# Persistent state
[state]
data_dir = ".agentforge"

# Retry behavior for transient LLM failures
[retry]
max_attempts = 3
initial_delay_ms = 1000
backoff_factor = 2.0

# Python runtime used to load generated agents
[loader]
python_bin = "python3"
timeout_secs = 30
"#
        .to_string()
    }
}
