//! Anthropic Claude Provider
//!
//! Implementation of the LlmProvider trait for Anthropic's Messages API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::http_client::{build_http_client, map_transport_error};
use crate::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use crate::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole, ProviderConfig,
    StopReason, UsageStats,
};

/// Default Anthropic API endpoint
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Current API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(
            config.proxy.as_ref(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(ANTHROPIC_API_URL)
    }

    fn api_key(&self) -> LlmResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| missing_api_key_error("anthropic"))
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request_options
                .max_tokens_override
                .unwrap_or(self.config.max_tokens),
            "temperature": request_options
                .temperature_override
                .unwrap_or(self.config.temperature),
        });

        if let Some(sys) = system {
            body["system"] = serde_json::json!(sys);
        }

        // System is a separate field in the Messages API
        let claude_messages: Vec<serde_json::Value> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| {
                serde_json::json!({
                    "role": if m.role == MessageRole::Assistant { "assistant" } else { "user" },
                    "content": m.content,
                })
            })
            .collect();
        body["messages"] = serde_json::json!(claude_messages);

        body
    }

    /// Parse a response from Claude API
    fn parse_response(&self, response: ClaudeResponse) -> LlmResponse {
        let mut content: Option<String> = None;
        let mut thinking = None;

        for block in response.content {
            match block {
                ContentBlock::Text { text } => match content.as_mut() {
                    Some(existing) => existing.push_str(&text),
                    None => content = Some(text),
                },
                ContentBlock::Thinking { thinking: t } => thinking = Some(t),
                ContentBlock::Other => {}
            }
        }

        LlmResponse {
            content,
            thinking,
            stop_reason: response
                .stop_reason
                .as_deref()
                .map(StopReason::from)
                .unwrap_or(StopReason::EndTurn),
            usage: UsageStats {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
                thinking_tokens: None,
            },
            model: response.model,
        }
    }

    async fn post(&self, body: &serde_json::Value) -> LlmResult<(u16, String)> {
        let response = self
            .client
            .post(self.base_url())
            .header("x-api-key", self.api_key()?)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout_secs))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout_secs))?;
        Ok((status, text))
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let body = self.build_request_body(&messages, system.as_deref(), &request_options);
        let (status, body_text) = self.post(&body).await?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "anthropic"));
        }

        let claude_response: ClaudeResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        debug!(
            model = %claude_response.model,
            output_tokens = claude_response.usage.output_tokens,
            "anthropic: message complete"
        );
        Ok(self.parse_response(claude_response))
    }

    async fn health_check(&self) -> LlmResult<()> {
        // Minimal request to verify the API key
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 1,
            "messages": [{"role": "user", "content": "Hi"}]
        });

        let (status, body_text) = self.post(&body).await?;
        if status == 200 {
            Ok(())
        } else {
            Err(parse_http_error(status, &body_text, "anthropic"))
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// Claude API response format
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: ResponseUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    input_tokens: u32,
    output_tokens: u32,
}
