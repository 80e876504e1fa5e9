//! Configuration management for Lorekeeper
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Secrets never live in the file: each upstream names the environment
//! variable holding its key, and [`Credentials::from_env`] resolves them
//! once at startup.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub universe_chat: UniverseChatConfig,
    pub lore_assistant: LoreAssistantConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Relational store (PostgREST) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Project URL; `/rest/v1/<table>` is appended per lookup
    pub url: String,
    #[serde(default = "default_store_key_env")]
    pub api_key_env: String,
}

fn default_store_key_env() -> String {
    "SUPABASE_SERVICE_ROLE_KEY".to_string()
}

/// Upstream chat-completion endpoint shared by both handlers
///
/// Fields are private; instances come from deserialization and are checked
/// by `Config::validate()`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompletionEndpoint {
    base_url: String,
    model: String,
}

impl CompletionEndpoint {
    /// Get the endpoint base URL (`/chat/completions` is appended)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the model identifier sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Universe chat (AI gateway) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniverseChatConfig {
    #[serde(flatten)]
    pub endpoint: CompletionEndpoint,
    #[serde(default = "default_gateway_key_env")]
    pub api_key_env: String,
    /// Reply used when the gateway returns no choice
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

fn default_gateway_key_env() -> String {
    "LOVABLE_API_KEY".to_string()
}

fn default_fallback_reply() -> String {
    "I'm sorry, I couldn't generate a response.".to_string()
}

/// Lore assistant (second LLM provider) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoreAssistantConfig {
    #[serde(flatten)]
    pub endpoint: CompletionEndpoint,
    #[serde(default = "default_provider_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// API keys resolved from the environment
///
/// Built once in `main` and injected into `AppState`; handlers never read
/// the process environment themselves.
#[derive(Clone, Default)]
pub struct Credentials {
    pub store_key: Option<String>,
    pub gateway_key: Option<String>,
    pub provider_key: Option<String>,
}

impl Credentials {
    /// Read each configured key variable, treating empty values as absent
    pub fn from_env(config: &Config) -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let credentials = Self {
            store_key: read(&config.store.api_key_env),
            gateway_key: read(&config.universe_chat.api_key_env),
            provider_key: read(&config.lore_assistant.api_key_env),
        };

        for (env, present) in [
            (&config.store.api_key_env, credentials.store_key.is_some()),
            (
                &config.universe_chat.api_key_env,
                credentials.gateway_key.is_some(),
            ),
            (
                &config.lore_assistant.api_key_env,
                credentials.provider_key.is_some(),
            ),
        ] {
            if !present {
                tracing::warn!(env = %env, "Credential not set in environment");
            }
        }

        credentials
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("store_key", &mask(&self.store_key))
            .field("gateway_key", &mask(&self.gateway_key))
            .field("provider_key", &mask(&self.provider_key))
            .finish()
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            crate::error::AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        config
            .validate()
            .map_err(|e| crate::error::AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`; tests that build a `Config`
    /// through `toml::from_str` directly can call it explicitly.
    pub fn validate(&self) -> crate::error::AppResult<()> {
        check_url("store.url", &self.store.url)?;

        for (section, endpoint) in [
            ("universe_chat", &self.universe_chat.endpoint),
            ("lore_assistant", &self.lore_assistant.endpoint),
        ] {
            check_url(&format!("{}.base_url", section), &endpoint.base_url)?;
            if endpoint.model.trim().is_empty() {
                return Err(crate::error::AppError::Config(format!(
                    "{}.model cannot be empty",
                    section
                )));
            }
        }

        for (field, env) in [
            ("store.api_key_env", &self.store.api_key_env),
            ("universe_chat.api_key_env", &self.universe_chat.api_key_env),
            ("lore_assistant.api_key_env", &self.lore_assistant.api_key_env),
        ] {
            if env.trim().is_empty() {
                return Err(crate::error::AppError::Config(format!(
                    "{} cannot be empty",
                    field
                )));
            }
        }

        if self.universe_chat.fallback_reply.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "universe_chat.fallback_reply cannot be empty".to_string(),
            ));
        }

        let temperature = self.lore_assistant.temperature;
        if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
            return Err(crate::error::AppError::Config(format!(
                "lore_assistant.temperature must be a finite number between 0.0 and 2.0, got {}",
                temperature
            )));
        }

        if self.lore_assistant.max_tokens == 0 {
            return Err(crate::error::AppError::Config(
                "lore_assistant.max_tokens must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_url(field: &str, url: &str) -> crate::error::AppResult<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(crate::error::AppError::Config(format!(
            "{} has invalid value '{}'. It must start with 'http://' or 'https://'.",
            field, url
        )));
    }
    Ok(())
}

impl FromStr for Config {
    type Err = crate::error::AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(toml_str).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            }
        })?;

        config.validate()?;
        Ok(config)
    }
}
