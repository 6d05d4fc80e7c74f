//! Client for the Gemini `generateContent` REST endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::analysis::{AiAnalysis, RawMeals};
use super::{AiClient, AiError};
use crate::config::GeminiConfig;

/// System instruction pinned on every analysis call. The model's only
/// permitted output is the JSON shape mirrored by [`AiAnalysis`].
const ANALYSIS_SYSTEM_INSTRUCTION: &str = r#"You are a nutrition assistant. Your ONLY allowed output is JSON in this format:
{
  "perItemBreakdown": [
    { "food": "string", "quantity": "string", "estimatedCalories": number, "protein": number, "carbs": number, "fats": number }
  ],
  "totals": { "calories": number, "protein": number, "carbs": number, "fats": number },
  "suggestions": ["string"],
  "motivation": "string",
  "workoutPlan": {
    "monday": ["string"],
    "tuesday": ["string"],
    "wednesday": ["string"],
    "thursday": ["string"],
    "friday": ["string"],
    "saturday": ["string"]
  }
}
Return ONLY this JSON with no explanation or markdown."#;

const ANALYSIS_PROMPT_PREFIX: &str =
    "Strictly analyze this meal log and return only the JSON. Meal log:\n";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

impl Content {
    fn user(text: String) -> Self {
        Self {
            role: Some("user".into()),
            parts: vec![Part { text }],
        }
    }

    fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

impl GenerationConfig {
    /// Low temperature and a forced JSON mime type keep analysis replies
    /// machine-parseable.
    fn analysis() -> Self {
        Self {
            temperature: 0.4,
            top_p: 0.9,
            max_output_tokens: 4096,
            response_mime_type: "application/json",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn analysis_request(meals: &RawMeals) -> GenerateContentRequest {
    let meal_log = serde_json::to_string(meals).unwrap_or_default();
    GenerateContentRequest {
        contents: vec![Content::user(format!("{ANALYSIS_PROMPT_PREFIX}{meal_log}"))],
        system_instruction: Some(Content::system(ANALYSIS_SYSTEM_INSTRUCTION)),
        generation_config: Some(GenerationConfig::analysis()),
    }
}

fn chat_request(message: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(message.to_string())],
        system_instruction: None,
        generation_config: None,
    }
}

/// Pull a human-readable message out of a Gemini error body, falling back to
/// a clipped copy of the raw body.
fn extract_api_error(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|e| e.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

pub struct GeminiClient {
    http: Client,
    api_key: String,
    chat_api_key: String,
    base_url: String,
    analysis_model: String,
    chat_model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            http: Client::new(),
            api_key: config.api_key.clone(),
            chat_api_key: config.chat_api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            analysis_model: config.analysis_model.clone(),
            chat_model: config.chat_model.clone(),
        }
    }

    /// One `generateContent` round trip, returning the first candidate's text.
    #[instrument(skip(self, api_key, request))]
    async fn generate(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(%status, model, "gemini call failed");
            return Err(AiError::Api {
                status: status.as_u16(),
                message: extract_api_error(&body),
            });
        }

        let reply: GenerateContentResponse =
            serde_json::from_str(&body).map_err(AiError::MalformedReply)?;
        reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(AiError::EmptyReply)
    }
}

#[async_trait]
impl AiClient for GeminiClient {
    async fn analyze_meals(&self, meals: &RawMeals) -> Result<AiAnalysis, AiError> {
        let request = analysis_request(meals);
        let text = self
            .generate(&self.analysis_model, &self.api_key, &request)
            .await?;
        debug!(chars = text.len(), "gemini analysis reply received");
        AiAnalysis::from_reply(&text)
    }

    async fn chat(&self, message: &str) -> Result<String, AiError> {
        let request = chat_request(message);
        self.generate(&self.chat_model, &self.chat_api_key, &request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::analysis::MealItem;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            api_key: "analysis-key".into(),
            chat_api_key: "chat-key".into(),
            base_url: base_url.into(),
            analysis_model: "gemini-1.5-flash".into(),
            chat_model: "gemini-1.5-pro".into(),
        })
    }

    fn reply_with_text(text: &str) -> serde_json::Value {
        json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": text }] } }
            ]
        })
    }

    fn sample_meals() -> RawMeals {
        let mut meals = RawMeals::new();
        meals.insert(
            "breakfast".into(),
            vec![MealItem {
                food: "oats".into(),
                quantity: "60g".into(),
            }],
        );
        meals
    }

    #[tokio::test]
    async fn analyze_meals_sends_the_analysis_contract() {
        let server = MockServer::start().await;
        let meals = sample_meals();
        let expected_prompt = format!(
            "{ANALYSIS_PROMPT_PREFIX}{}",
            serde_json::to_string(&meals).unwrap()
        );
        let analysis = json!({
            "perItemBreakdown": [{
                "food": "oats", "quantity": "60g",
                "estimatedCalories": 230, "protein": 8, "carbs": 40, "fats": 4
            }],
            "totals": { "calories": 230, "protein": 8, "carbs": 40, "fats": 4 },
            "suggestions": ["add a protein source"],
            "motivation": "keep going",
            "workoutPlan": {
                "monday": ["30m walk"], "tuesday": [], "wednesday": [],
                "thursday": [], "friday": [], "saturday": []
            }
        });

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "analysis-key"))
            .and(body_partial_json(json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": expected_prompt }] }
                ],
                "generationConfig": {
                    "temperature": 0.4,
                    "topP": 0.9,
                    "maxOutputTokens": 4096,
                    "responseMimeType": "application/json"
                }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(reply_with_text(&analysis.to_string())),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .analyze_meals(&meals)
            .await
            .expect("analysis should succeed");
        assert_eq!(result.totals.calories, 230.0);
        assert_eq!(result.per_item_breakdown.len(), 1);
        assert_eq!(result.per_item_breakdown[0].food, "oats");
        assert_eq!(result.workout_plan.monday, vec!["30m walk"]);
    }

    #[tokio::test]
    async fn analyze_meals_pins_the_json_only_system_instruction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(body_partial_json(json!({
                "systemInstruction": { "parts": [{ "text": ANALYSIS_SYSTEM_INSTRUCTION }] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_with_text("{}")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .analyze_meals(&sample_meals())
            .await
            .expect("analysis should succeed");
        assert_eq!(result, AiAnalysis::default());
    }

    #[tokio::test]
    async fn chat_uses_the_chat_model_and_key_and_returns_the_reply_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .and(query_param("key", "chat-key"))
            .and(body_partial_json(json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "how much protein is in an egg?" }] }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reply_with_text("About 6g per large egg.")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let reply = client
            .chat("how much protein is in an egg?")
            .await
            .expect("chat should succeed");
        assert_eq!(reply, "About 6g per large egg.");
    }

    #[tokio::test]
    async fn prose_analysis_reply_is_a_malformed_reply_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reply_with_text("Sorry, I cannot help with that.")),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.analyze_meals(&sample_meals()).await.unwrap_err();
        assert!(matches!(err, AiError::MalformedReply(_)));
    }

    #[tokio::test]
    async fn upstream_error_status_surfaces_the_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({ "error": { "message": "quota exceeded" } })),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.chat("hello").await.unwrap_err();
        match err {
            AiError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reply_without_candidates_is_an_empty_reply_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.chat("hello").await.unwrap_err();
        assert!(matches!(err, AiError::EmptyReply));
    }
}
