//! Configuration Management
//!
//! Unified configuration system with hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/agentforge/config.toml)
//! 3. Project config (.agentforge/config.toml)
//! 4. Environment variables (AGENTFORGE_*)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
