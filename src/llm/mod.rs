//! Chat completion client for OpenAI-compatible providers
//!
//! One [`ChatCompletionClient`] per upstream. The client holds its endpoint
//! configuration and the injected API key; it performs exactly one HTTP call
//! per `complete()` with no retries.

pub mod types;

pub use types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Role, Sampling};

use crate::config::CompletionEndpoint;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ChatCompletionClient {
    /// Provider label used in errors, logs and metrics
    provider: &'static str,
    endpoint: CompletionEndpoint,
    api_key: Option<String>,
    /// Environment variable the key came from, for error messages
    api_key_env: String,
    http: reqwest::Client,
}

impl ChatCompletionClient {
    pub fn new(
        provider: &'static str,
        endpoint: CompletionEndpoint,
        api_key: Option<String>,
        api_key_env: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            provider,
            endpoint,
            api_key,
            api_key_env: api_key_env.into(),
            http,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn endpoint(&self) -> &CompletionEndpoint {
        &self.endpoint
    }

    /// Fail with `MissingCredential` unless an API key was injected
    pub fn require_api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::MissingCredential(self.api_key_env.clone()))
    }

    /// Send `messages` and return the first choice's text
    ///
    /// `Ok(None)` means the provider answered successfully but without a
    /// usable choice; callers decide whether that is a fallback or an error.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        sampling: Sampling,
    ) -> AppResult<Option<String>> {
        let url = format!(
            "{}/chat/completions",
            self.endpoint.base_url().trim_end_matches('/')
        );

        let body = ChatCompletionRequest {
            model: self.endpoint.model(),
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(
            provider = self.provider,
            model = self.endpoint.model(),
            message_count = messages.len(),
            "Sending chat completion request"
        );

        let response = request
            .send()
            .await
            .map_err(|e| AppError::UpstreamRequest {
                provider: self.provider.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(
                provider = self.provider,
                status = status.as_u16(),
                body = %detail,
                "Chat completion returned non-success status"
            );
            return Err(AppError::UpstreamStatus {
                provider: self.provider.to_string(),
                status: status.as_u16(),
            });
        }

        let parsed: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::UpstreamResponse {
                    provider: self.provider.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(parsed.first_content())
    }
}

impl std::fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}
