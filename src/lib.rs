//! AgentForge - Dynamic Code-Analysis Agent Factory
//!
//! Generates specialized code-analysis agents on demand: a technology
//! keyword resolves to a trigger, an LLM synthesizes the agent source, a
//! multi-stage validator screens it, and a compiler loads it into a
//! callable agent. Keyword tables and agent lifecycles persist across runs
//! in crash-safe JSON state files.
//!
//! ## Core Features
//!
//! - **Trigger Catalog**: static triggers plus dynamic ones derived from a
//!   technology registry
//! - **Keyword Detection**: token-overlap matching of free text to known
//!   technologies
//! - **Validated Generation**: security, structure, import, and rule checks
//!   before anything is loaded
//! - **Caching**: TTL caches at the prompt and result level
//! - **Crash-Safe State**: backup-on-write JSON persistence
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use agentforge::{AgentFactory, GenerationOptions, KeywordManager, TriggerCatalog};
//! use agentforge::ai::create_provider;
//! use agentforge::loader::{PythonCompiler, PythonCompilerConfig};
//! use agentforge::state::StateManager;
//!
//! let catalog = Arc::new(TriggerCatalog::builtin());
//! let store = StateManager::new(".agentforge/keywords.json")?;
//! let seed = catalog.keywords();
//! let keywords = Arc::new(KeywordManager::with_seed(
//!     store,
//!     seed.iter().map(|(k, d)| (k.as_str(), d.as_str())),
//! )?);
//!
//! let factory = AgentFactory::builder()
//!     .catalog(catalog)
//!     .keywords(keywords)
//!     .provider(create_provider(&Default::default())?)
//!     .compiler(Arc::new(PythonCompiler::new(PythonCompilerConfig::default())))
//!     .build()?;
//!
//! let result = factory.generate("python", GenerationOptions::new()).await;
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: trigger resolution (static + registry-derived)
//! - [`keyword`]: keyword detection and agent lifecycle records
//! - [`ai`]: LLM providers, prompt assembly, retry
//! - [`validate`]: multi-stage screening of generated code
//! - [`loader`]: compiling validated source into callable agents
//! - [`factory`]: the orchestrating pipeline
//! - [`state`]: crash-safe JSON persistence
//! - [`cache`]: TTL key/value caching

pub mod ai;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod factory;
pub mod keyword;
pub mod loader;
pub mod state;
pub mod types;
pub mod validate;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::{ForgeError, Result, ValidationError};

// Pipeline
pub use factory::{AgentFactory, AgentFactoryBuilder, GenerationResult};

// Collaborators
pub use cache::Cache;
pub use catalog::{TechnologyRegistry, TriggerCatalog};
pub use keyword::{AgentLifecycle, KeywordManager};
pub use loader::{AgentCompiler, CompiledAgent, PythonCompiler};
pub use state::StateManager;
pub use types::{AgentInfo, AgentStatus, GenerationOptions, TriggerInfo};
pub use validate::{AgentValidator, CodeValidator, StructureValidator};

// AI
pub use ai::{LlmProvider, RetryPolicy, create_provider};
