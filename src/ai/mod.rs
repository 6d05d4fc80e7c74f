use async_trait::async_trait;
use axum::{routing::post, Router};
use thiserror::Error;

use crate::state::AppState;

pub mod analysis;
pub mod gemini;
pub mod handlers;

pub use analysis::{AiAnalysis, MealItem, RawMeals};
pub use gemini::GeminiClient;

/// Upstream AI failure. Clients only ever see [`AiError::public_message`];
/// the variant detail goes to the server log.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("request to gemini failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gemini returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("gemini reply had no text content")]
    EmptyReply,
    #[error("gemini reply was not valid JSON: {0}")]
    MalformedReply(#[source] serde_json::Error),
}

impl AiError {
    pub fn public_message(&self) -> &'static str {
        match self {
            AiError::EmptyReply | AiError::MalformedReply(_) => {
                "AI service returned malformed data"
            }
            AiError::Transport(_) | AiError::Api { .. } => "AI request failed",
        }
    }
}

/// Seam between handlers and the Gemini transport, injected through app
/// state so tests can swap in a canned implementation.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn analyze_meals(&self, meals: &RawMeals) -> Result<AiAnalysis, AiError>;
    async fn chat(&self, message: &str) -> Result<String, AiError>;
}

pub fn router() -> Router<AppState> {
    Router::new().route("/gemini", post(handlers::chat))
}
