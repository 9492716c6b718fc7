//! OpenAI Provider
//!
//! Implementation of the LlmProvider trait for OpenAI chat completions. Any
//! OpenAI-compatible endpoint can be targeted through `base_url`.

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

/// Default OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(
            config.proxy.as_ref(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }

    /// Check if model is a reasoning model (o1/o3/o4 families)
    fn model_supports_reasoning(&self) -> bool {
        let model = self.config.model.to_lowercase();
        model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4")
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let max_tokens = request_options
            .max_tokens_override
            .unwrap_or(self.config.max_tokens);

        let mut body = serde_json::json!({ "model": self.config.model });

        // Reasoning models reject temperature and use a different token field
        if self.model_supports_reasoning() {
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
            body["temperature"] = serde_json::json!(request_options
                .temperature_override
                .unwrap_or(self.config.temperature));
        }

        let mut openai_messages: Vec<serde_json::Value> = Vec::with_capacity(messages.len() + 1);
        if let Some(sys) = system {
            openai_messages.push(serde_json::json!({ "role": "system", "content": sys }));
        }
        for msg in messages {
            let role = match msg.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            openai_messages.push(serde_json::json!({ "role": role, "content": msg.content }));
        }
        body["messages"] = serde_json::json!(openai_messages);

        body
    }

    /// Parse a response from OpenAI API
    fn parse_response(&self, response: OpenAIResponse) -> LlmResponse {
        let choice = response.choices.into_iter().next();

        let stop_reason = choice
            .as_ref()
            .and_then(|c| c.finish_reason.as_deref())
            .map(StopReason::from)
            .unwrap_or(StopReason::EndTurn);

        let (content, thinking) = choice
            .and_then(|c| c.message)
            .map(|m| (m.content, m.reasoning_content))
            .unwrap_or((None, None));

        let usage = response
            .usage
            .map(|u| UsageStats {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                thinking_tokens: u.reasoning_tokens,
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            thinking,
            stop_reason,
            usage,
            model: response.model,
        }
    }

    async fn post(&self, body: &serde_json::Value) -> LlmResult<(u16, String)> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("openai"))?;

        let response = self
            .client
            .post(self.base_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
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
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
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
            return Err(parse_http_error(status, &body_text, "openai"));
        }

        let openai_response: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        debug!(model = %openai_response.model, "openai: completion received");
        Ok(self.parse_response(openai_response))
    }

    async fn health_check(&self) -> LlmResult<()> {
        let mut body = self.build_request_body(
            &[Message::user("Hi")],
            None,
            &LlmRequestOptions::default(),
        );
        let token_field = if self.model_supports_reasoning() {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };
        body[token_field] = serde_json::json!(1);

        let (status, body_text) = self.post(&body).await?;
        if status == 200 {
            Ok(())
        } else {
            Err(parse_http_error(status, &body_text, "openai"))
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    #[serde(default)]
    reasoning_tokens: Option<u32>,
}
