//! Chat handler: one visitor message in, one persona reply out. Completion and
//! notification failures are absorbed by the dialogue, so this never returns an HTTP error
//! for them.

use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct ChatRequest {
    pub(crate) message: String,
    /// Prior turns as sent by the front end; rendered into the prompt as-is.
    #[serde(default)]
    pub(crate) history: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatResponse {
    pub(crate) reply: String,
}

/// POST /chat
pub(crate) async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Json<ChatResponse> {
    tracing::info!(
        target: "folio::gateway",
        message_chars = req.message.chars().count(),
        history_turns = req.history.len(),
        "Chat request received"
    );
    let reply = state.dialogue.handle_turn(&req.message, &req.history).await;
    Json(ChatResponse { reply })
}
