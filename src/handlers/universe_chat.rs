//! Universe chat endpoint
//!
//! Handles `POST /universe-chat`: loads the universe's entities, builds a
//! context-laden system prompt and forwards the conversation to the AI
//! gateway.

use crate::context::{ContextUsed, load_snapshot};
use crate::error::{AppError, AppResult};
use crate::handlers::{AppState, parse_body};
use crate::llm::{ChatMessage, Sampling};
use crate::metrics::Handler;
use crate::middleware::RequestId;
use axum::{Extension, Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};

/// Universe chat request from client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniverseChatRequest {
    pub universe_id: String,
    pub message: String,
    #[serde(default)]
    pub conversation_history: Option<Vec<ChatMessage>>,
}

/// Universe chat response to client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniverseChatResponse {
    pub success: bool,
    pub reply: String,
    pub context_used: ContextUsed,
}

/// Assemble the message sequence: system prompt, prior turns, new message
pub fn build_messages(
    system_prompt: String,
    history: Vec<ChatMessage>,
    message: String,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history);
    messages.push(ChatMessage::user(message));
    messages
}

/// POST /universe-chat handler
///
/// Store lookups run sequentially, followed by a single gateway call.
/// Every failure is returned as HTTP 500 with `{ "error": ... }`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<UniverseChatResponse>, AppError> {
    let result = respond(&state, request_id, &body).await;

    match &result {
        Ok(_) => state
            .metrics()
            .record_request(Handler::UniverseChat, "success"),
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                kind = e.kind(),
                "Universe chat request failed"
            );
            state.metrics().record_request(Handler::UniverseChat, e.kind());
        }
    }

    result.map(Json)
}

async fn respond(
    state: &AppState,
    request_id: RequestId,
    body: &[u8],
) -> AppResult<UniverseChatResponse> {
    let request: UniverseChatRequest = parse_body(body)?;

    tracing::debug!(
        request_id = %request_id,
        universe_id = %request.universe_id,
        message_length = request.message.len(),
        history_length = request.conversation_history.as_ref().map_or(0, Vec::len),
        "Received universe chat request"
    );

    let snapshot = load_snapshot(state.store(), &request.universe_id, state.metrics()).await;
    let context_used = snapshot.counts();
    let context = snapshot.render_context();

    tracing::info!(
        request_id = %request_id,
        universe_id = %request.universe_id,
        characters = context_used.characters,
        locations = context_used.locations,
        events = context_used.events,
        objects = context_used.objects,
        relationships = context_used.relationships,
        "Assembled universe context"
    );

    let messages = build_messages(
        snapshot.system_prompt(&context),
        request.conversation_history.unwrap_or_default(),
        request.message,
    );

    let gateway = state.gateway();
    let started = std::time::Instant::now();
    let completion = gateway.complete(&messages, Sampling::default()).await;
    state.metrics().record_upstream_duration(
        gateway.provider(),
        started.elapsed().as_secs_f64() * 1000.0,
    );

    let reply = match completion {
        Ok(Some(reply)) if !reply.trim().is_empty() => reply,
        Ok(_) => {
            tracing::warn!(
                request_id = %request_id,
                "Gateway response had no usable choice, using fallback reply"
            );
            state.config().universe_chat.fallback_reply.clone()
        }
        Err(e) => {
            state.metrics().record_upstream_failure(gateway.provider());
            return Err(e);
        }
    };

    Ok(UniverseChatResponse {
        success: true,
        reply,
        context_used,
    })
}
