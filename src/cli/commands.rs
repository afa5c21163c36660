//! Command Entry Points
//!
//! Each function backs one CLI subcommand: load config, assemble the
//! collaborators, run the operation, print the outcome.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::ai::create_provider;
use crate::catalog::{FileRegistry, TriggerCatalog};
use crate::config::{Config, ConfigLoader};
use crate::factory::AgentFactory;
use crate::keyword::KeywordManager;
use crate::loader::PythonCompiler;
use crate::state::StateManager;
use crate::types::{GenerationOptions, Result, ValidationError};

/// Initialize the project directory with a default config
pub fn init() -> Result<()> {
    let dir = ConfigLoader::init_project()?;
    println!("Initialized AgentForge project in {}", dir.display());
    Ok(())
}

/// Generate (or retrieve) the agent for a technology keyword
pub async fn generate(technology: &str, raw_options: &[String], as_json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let factory = build_factory(&config)?;
    let options = parse_options(raw_options)?;

    let result = factory.generate(technology, options).await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result.to_report())?);
    } else if result.is_success() {
        println!(
            "Generated {} for '{}' in {}ms{}",
            result.metadata.class_name.as_deref().unwrap_or("agent"),
            technology,
            result.metadata.duration_ms,
            if result.metadata.cache_hit {
                " (cached)"
            } else {
                ""
            },
        );
    } else {
        println!(
            "Generation failed for '{}': {} [{}]",
            technology,
            result.error.as_deref().unwrap_or("unknown error"),
            result.error_type.as_deref().unwrap_or("UnknownError"),
        );
    }
    Ok(())
}

/// Detect the best-matching known technology in free text
pub fn detect(text: &str) -> Result<()> {
    let config = ConfigLoader::load()?;
    let keywords = open_keywords(&config)?;
    match keywords.detect(text) {
        Some(keyword) => println!("{keyword}"),
        None => println!("No known technology detected"),
    }
    Ok(())
}

/// List known keywords, optionally filtered by a regex
pub fn keywords_list(pattern: Option<&str>) -> Result<()> {
    let config = ConfigLoader::load()?;
    let keywords = open_keywords(&config)?;
    let table = keywords.list_keywords(pattern);
    if table.is_empty() {
        println!("No keywords match");
        return Ok(());
    }
    for (keyword, description) in table {
        println!("{keyword:<20} {description}");
    }
    Ok(())
}

/// Register a new keyword
pub fn keywords_add(keyword: &str, description: &str) -> Result<()> {
    let config = ConfigLoader::load()?;
    let keywords = open_keywords(&config)?;
    keywords.add_keyword(keyword, description)?;
    println!("Added keyword '{keyword}'");
    Ok(())
}

/// Remove a keyword and its agent record
pub fn keywords_remove(keyword: &str) -> Result<()> {
    let config = ConfigLoader::load()?;
    let keywords = open_keywords(&config)?;
    keywords.remove_keyword(keyword)?;
    println!("Removed keyword '{keyword}'");
    Ok(())
}

/// Show agent records, optionally with error histories
pub fn agents(history: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let keywords = open_keywords(&config)?;
    let view = keywords.show_agents(history);
    println!("{}", serde_json::to_string_pretty(&json!(view))?);
    Ok(())
}

/// Refresh dynamic triggers from the technology registry
pub fn refresh() -> Result<()> {
    let config = ConfigLoader::load()?;
    let catalog = open_catalog(&config)?;
    let count = catalog.refresh()?;
    println!("Catalog refreshed: {count} dynamic triggers");
    Ok(())
}

/// Check whether the configured LLM provider is reachable
pub async fn health() -> Result<()> {
    let config = ConfigLoader::load()?;
    let provider = create_provider(&config.llm)?;
    let healthy = provider.health_check().await?;
    if healthy {
        println!("{} ({}) is available", provider.name(), provider.model());
    } else {
        println!("{} ({}) is unreachable", provider.name(), provider.model());
    }
    Ok(())
}

/// Show the current effective configuration
pub fn config_show(as_json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!(
            "{}",
            toml::to_string_pretty(&config)
                .map_err(|e| crate::types::ForgeError::Config(e.to_string()))?
        );
    }
    Ok(())
}

// =============================================================================
// Assembly
// =============================================================================

fn open_catalog(config: &Config) -> Result<Arc<TriggerCatalog>> {
    let registry = FileRegistry::open(config.state.registry_path())?;
    let catalog = TriggerCatalog::new(Some(Arc::new(registry)), config.cache.catalog_ttl());
    // Best effort: an empty or missing registry still leaves the static
    // triggers usable
    catalog.refresh()?;
    Ok(Arc::new(catalog))
}

fn open_keywords(config: &Config) -> Result<Arc<KeywordManager>> {
    let catalog = open_catalog(config)?;
    seeded_keywords(config, &catalog)
}

fn seeded_keywords(config: &Config, catalog: &TriggerCatalog) -> Result<Arc<KeywordManager>> {
    let store = StateManager::new(config.state.keywords_path())?;
    let seed = catalog.keywords();
    let manager =
        KeywordManager::with_seed(store, seed.iter().map(|(k, d)| (k.as_str(), d.as_str())))?;
    Ok(Arc::new(manager))
}

fn build_factory(config: &Config) -> Result<AgentFactory> {
    let catalog = open_catalog(config)?;
    let keywords = seeded_keywords(config, &catalog)?;
    let provider = create_provider(&config.llm)?;
    info!(provider = provider.name(), model = provider.model(), "Provider ready");

    AgentFactory::builder()
        .catalog(catalog)
        .keywords(keywords)
        .provider(provider)
        .compiler(Arc::new(PythonCompiler::new(
            config.loader.compiler_config(),
        )))
        .retry(config.retry.policy())
        .cache_ttl(config.cache.ttl())
        .build()
}

/// Parse `key=value` pairs into generation options. Values that parse as
/// JSON are kept typed; everything else becomes a string.
fn parse_options(raw: &[String]) -> Result<GenerationOptions> {
    let mut options = GenerationOptions::new();
    for pair in raw {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(ValidationError::input(
                "option",
                format!("Expected key=value, got '{pair}'"),
            )
            .into());
        };
        let value = serde_json::from_str(value).unwrap_or_else(|_| json!(value));
        options.insert(key.to_string(), value);
    }
    Ok(options)
}
