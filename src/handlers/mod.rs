//! HTTP request handlers for the Lorekeeper API

use crate::config::{Config, Credentials};
use crate::error::{AppError, AppResult};
use crate::llm::ChatCompletionClient;
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::store::{RestStore, UniverseStore};
use axum::{
    Router,
    http::{HeaderName, Method, header},
    middleware,
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod health;
pub mod lore_assistant;
pub mod metrics;
pub mod universe_chat;

/// Provider label for the universe chat AI gateway
pub const GATEWAY_PROVIDER: &str = "ai-gateway";
/// Provider label for the lore assistant LLM provider
pub const ASSISTANT_PROVIDER: &str = "lore-provider";

/// Application state shared across all handlers
///
/// Immutable after construction; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn UniverseStore>,
    gateway: ChatCompletionClient,
    assistant: ChatCompletionClient,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create state backed by the configured PostgREST store
    pub fn new(config: Arc<Config>, credentials: Credentials) -> AppResult<Self> {
        let http = build_http_client()?;
        let store = Arc::new(RestStore::new(
            &config.store.url,
            credentials.store_key.clone(),
            http.clone(),
        ));
        Self::with_store(config, credentials, store, http)
    }

    /// Create state with an explicit store implementation
    pub fn with_store(
        config: Arc<Config>,
        credentials: Credentials,
        store: Arc<dyn UniverseStore>,
        http: reqwest::Client,
    ) -> AppResult<Self> {
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("Failed to create metrics: {}", e)))?;

        let gateway = ChatCompletionClient::new(
            GATEWAY_PROVIDER,
            config.universe_chat.endpoint.clone(),
            credentials.gateway_key,
            config.universe_chat.api_key_env.clone(),
            http.clone(),
        );
        let assistant = ChatCompletionClient::new(
            ASSISTANT_PROVIDER,
            config.lore_assistant.endpoint.clone(),
            credentials.provider_key,
            config.lore_assistant.api_key_env.clone(),
            http,
        );

        Ok(Self {
            config,
            store,
            gateway,
            assistant,
            metrics: Arc::new(metrics),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn UniverseStore {
        self.store.as_ref()
    }

    /// Client for the universe chat AI gateway
    pub fn gateway(&self) -> &ChatCompletionClient {
        &self.gateway
    }

    /// Client for the lore assistant provider
    pub fn assistant(&self) -> &ChatCompletionClient {
        &self.assistant
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Shared HTTP client with reqwest's default timeouts
pub fn build_http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("lorekeeper/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Build the full application router
///
/// The CORS layer is outermost and answers every `OPTIONS` request itself
/// with an empty 200, so the chat routes only register `POST`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/universe-chat", post(universe_chat::handler))
        .route("/lore-assistant", post(lore_assistant::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Parse a JSON request body, mapping any failure to `MalformedRequest`
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|e| AppError::MalformedRequest(e.to_string()))
}
