//! Survey Synth LLM
//!
//! Provides a unified interface for the generative text providers the engine
//! talks to:
//! - Anthropic Claude (Messages API)
//! - OpenAI and OpenAI-compatible chat completion endpoints
//!
//! Also includes the HTTP client factory and a provider factory keyed by
//! `ProviderType`.

pub mod anthropic;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

use std::sync::Arc;

// Re-export main types
pub use anthropic::AnthropicProvider;
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;

/// Create an LLM provider from a ProviderConfig.
///
/// Maps ProviderType to the concrete provider implementation. Credential
/// checks are the caller's concern; this only fails if the HTTP client
/// cannot be built.
pub fn create_provider(config: ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderType::Anthropic => Arc::new(AnthropicProvider::new(config)?),
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(config)?),
    };
    Ok(provider)
}
