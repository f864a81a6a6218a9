use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest, ResponseFormat,
        ResponseFormatJsonSchema,
    },
    Client as OpenAiClient,
};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use super::retry::RetryPolicy;
use crate::error::SignalError;

/// Configuration for the LLM client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub requests_per_minute: u32,
    pub timeout_seconds: u64,
    /// Attempt budget for one structured request
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.2,
            requests_per_minute: 30,
            timeout_seconds: 60,
            max_retries: 5,
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, PartialEq)]
pub enum LlmProvider {
    OpenAI,
}

/// A structured-output request: instructions, prompt and the schema the
/// answer must follow
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub schema_name: String,
    pub schema: Value,
}

/// Response from the LLM with metadata
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub raw_response: String,
    pub model: String,
    pub tokens_used: Option<u32>,
    pub provider: LlmProvider,
}

/// Backend that turns a `GenerationRequest` into raw response text.
///
/// One call is one attempt; retrying and contract checks live in
/// `SignalRequester`.
#[async_trait]
pub trait SignalGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse, SignalError>;
}

#[async_trait]
impl<T: SignalGenerator + ?Sized> SignalGenerator for Arc<T> {
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse, SignalError> {
        (**self).generate(request).await
    }
}

/// LLM client with rate limiting and a per-call timeout
pub struct LlmClient {
    openai_client: OpenAiClient<OpenAIConfig>,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>>,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client from configuration
    ///
    /// # Arguments
    /// * `config` - LLM configuration
    /// * `api_key` - API key for the LLM provider
    pub fn new(config: LlmConfig, api_key: String) -> Result<Self, SignalError> {
        tracing::info!(
            "Initializing LLM client: provider={:?}, model={}, rate_limit={}/min, timeout={}s",
            config.provider,
            config.model,
            config.requests_per_minute,
            config.timeout_seconds
        );

        if api_key.trim().is_empty() {
            return Err(SignalError::Config("LLM API key is empty".to_string()));
        }

        let openai_client = match config.provider {
            LlmProvider::OpenAI => {
                OpenAiClient::with_config(OpenAIConfig::new().with_api_key(api_key))
            }
        };

        let requests_per_minute = NonZeroU32::new(config.requests_per_minute)
            .ok_or_else(|| SignalError::Config("requests_per_minute must be > 0".to_string()))?;

        let quota = Quota::per_minute(requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            openai_client,
            rate_limiter,
            config,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Retry policy matching this client's attempt budget
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.config.max_retries)
    }

    /// Call the OpenAI chat completions API with a strict JSON schema
    async fn call_openai(&self, request: &GenerationRequest) -> Result<LlmResponse, SignalError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.clone())
                .build()?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            response_format: Some(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: request.schema_name.clone(),
                    schema: Some(request.schema.clone()),
                    strict: Some(true),
                },
            }),
            ..Default::default()
        };

        let response = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.openai_client.chat().create(chat_request),
        )
        .await
        .map_err(|_| SignalError::Timeout(self.config.timeout_seconds))??;

        let response_text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(SignalError::EmptyResponse)?;

        Ok(LlmResponse {
            raw_response: response_text,
            model: response.model.clone(),
            tokens_used: response.usage.map(|u| u.total_tokens),
            provider: LlmProvider::OpenAI,
        })
    }
}

#[async_trait]
impl SignalGenerator for LlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse, SignalError> {
        self.rate_limiter.until_ready().await;

        tracing::debug!(
            "Sending request to LLM (system: {} chars, user: {} chars)",
            request.system.len(),
            request.user.len()
        );

        match self.config.provider {
            LlmProvider::OpenAI => self.call_openai(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(config.requests_per_minute, 30);
    }

    #[test]
    fn test_rejects_empty_api_key() {
        let result = LlmClient::new(LlmConfig::default(), "  ".to_string());
        assert!(matches!(result, Err(SignalError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_rate_limit() {
        let config = LlmConfig {
            requests_per_minute: 0,
            ..Default::default()
        };
        let result = LlmClient::new(config, "sk-test".to_string());
        assert!(matches!(result, Err(SignalError::Config(_))));
    }

    #[test]
    fn test_client_creation() {
        let client = LlmClient::new(LlmConfig::default(), "sk-test".to_string()).unwrap();
        assert_eq!(client.config().model, "gpt-4o-mini");
        assert_eq!(client.retry_policy().max_attempts, 5);
    }
}
