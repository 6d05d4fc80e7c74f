use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Free-form passthrough to the chat model; the reply comes back verbatim.
#[instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<ChatRequest>, ApiError>,
) -> ApiResult<Json<ChatReply>> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::validation("Message is required"));
    }
    let reply = state.ai.chat(&payload.message).await?;
    Ok(Json(ChatReply { reply }))
}
