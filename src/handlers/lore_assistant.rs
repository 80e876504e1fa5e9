//! Lore assistant endpoint
//!
//! Handles `POST /lore-assistant`: answers a question from caller-supplied
//! universe context using the second LLM provider.

use crate::error::{AppError, AppResult};
use crate::handlers::{AppState, parse_body};
use crate::llm::{ChatMessage, Sampling};
use crate::metrics::Handler;
use crate::middleware::RequestId;
use axum::{Extension, Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};

/// Lore assistant request from client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoreAssistantRequest {
    pub question: String,
    pub context: String,
}

/// Lore assistant response to client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoreAssistantResponse {
    pub answer: String,
}

/// Fixed encyclopedic system prompt with the context embedded verbatim
pub fn system_prompt(context: &str) -> String {
    format!(
        "You are the encyclopedia of a fictional universe. Answer the user's question \
        using only the universe information provided below, in the voice of a thorough \
        encyclopedia entry.\n\n\
        Format every answer in Markdown: use headings for major topics, bullet lists for \
        enumerations, and **bold** for the names of characters, locations, events and \
        objects. If the information needed is not in the context, say that it is not \
        recorded for this universe instead of inventing it.\n\n\
        Universe information:\n{}",
        context
    )
}

/// POST /lore-assistant handler
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<LoreAssistantResponse>, AppError> {
    let result = respond(&state, request_id, &body).await;

    match &result {
        Ok(_) => state
            .metrics()
            .record_request(Handler::LoreAssistant, "success"),
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                kind = e.kind(),
                "Lore assistant request failed"
            );
            state
                .metrics()
                .record_request(Handler::LoreAssistant, e.kind());
        }
    }

    result.map(Json)
}

async fn respond(
    state: &AppState,
    request_id: RequestId,
    body: &[u8],
) -> AppResult<LoreAssistantResponse> {
    let assistant = state.assistant();

    // No outbound call may happen without a key.
    assistant.require_api_key()?;

    let request: LoreAssistantRequest = parse_body(body)?;

    tracing::debug!(
        request_id = %request_id,
        question_length = request.question.len(),
        context_length = request.context.len(),
        "Received lore assistant request"
    );

    let messages = [
        ChatMessage::system(system_prompt(&request.context)),
        ChatMessage::user(request.question),
    ];
    let settings = &state.config().lore_assistant;
    let sampling = Sampling {
        temperature: Some(settings.temperature),
        max_tokens: Some(settings.max_tokens),
    };

    let started = std::time::Instant::now();
    let completion = assistant.complete(&messages, sampling).await;
    state.metrics().record_upstream_duration(
        assistant.provider(),
        started.elapsed().as_secs_f64() * 1000.0,
    );

    let answer = completion
        .and_then(|content| {
            content.ok_or_else(|| AppError::UpstreamResponse {
                provider: assistant.provider().to_string(),
                reason: "response contained no choices".to_string(),
            })
        })
        .inspect_err(|_| state.metrics().record_upstream_failure(assistant.provider()))?;

    tracing::info!(
        request_id = %request_id,
        answer_length = answer.len(),
        "Lore assistant answered"
    );

    Ok(LoreAssistantResponse { answer })
}
