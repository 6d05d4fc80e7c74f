use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Gemini credentials and model selection. Analysis and chat may run on
/// different models and keys; the chat key falls back to the analysis key.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub chat_api_key: String,
    pub base_url: String,
    pub analysis_model: String,
    pub chat_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub environment: String,
    pub client_origin: String,
    pub jwt: JwtConfig,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let client_origin =
            std::env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".into());

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutrack".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutrack-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };

        let api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?;
        let gemini = GeminiConfig {
            chat_api_key: std::env::var("GEMINI_CHAT_API_KEY").unwrap_or_else(|_| api_key.clone()),
            api_key,
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into()),
            analysis_model: std::env::var("GEMINI_ANALYSIS_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".into()),
            chat_model: std::env::var("GEMINI_CHAT_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-pro".into()),
        };

        Ok(Self {
            database_url,
            environment,
            client_origin,
            jwt,
            gemini,
        })
    }

    /// Production toggles `Secure` + `SameSite=Strict` on the session cookie.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
