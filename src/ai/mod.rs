//! AI Layer
//!
//! Everything between the factory and the LLM:
//!
//! - `provider`: chat-completion providers behind the `LlmProvider` trait
//! - `prompt`: prompt assembly, response extraction, cache keys
//! - `retry`: exponential backoff for transient provider failures

pub mod prompt;
pub mod provider;
pub mod retry;

pub use provider::{
    ChatMessage, ChatResponse, LlmProvider, OpenAiProvider, ProviderConfig, SharedProvider,
    create_provider,
};
pub use retry::RetryPolicy;
