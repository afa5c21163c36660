//! LLM Provider Abstraction
//!
//! Defines the `LlmProvider` trait for chat-based code generation. The
//! factory only ever talks to `SharedProvider`, so tests inject scripted
//! providers and the OpenAI implementation stays behind the seam.

mod openai;

pub use openai::OpenAiProvider;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{ForgeError, Result};

// =============================================================================
// Chat Messages
// =============================================================================

/// One message of a chat-completion conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Completed chat response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Raw assistant content, possibly fenced in markdown
    pub content: String,
    /// Model that produced the response
    pub model: String,
    /// Wall-clock time of the API call in milliseconds
    pub duration_ms: u64,
}

/// Shared provider handle for concurrent use across the pipeline
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for LLM providers
///
/// API keys are never serialized and are redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type, currently "openai" (or any compatible endpoint)
    pub provider: String,
    /// Model name (provider-specific)
    pub model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,
    /// API key; falls back to the provider's env var when absent
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL for custom endpoints
    #[serde(default)]
    pub api_base: Option<String>,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn default_max_tokens() -> usize {
    4096
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: 120,
            temperature: 0.7,
            api_key: None,
            api_base: None,
            max_tokens: 4096,
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// Chat-completion provider
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one chat completion over the given messages
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        other => Err(ForgeError::Config(format!(
            "Unknown provider: {other}. Supported: openai"
        ))),
    }
}
