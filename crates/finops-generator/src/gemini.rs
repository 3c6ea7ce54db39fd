//! Gemini payload generator
//!
//! Asks a Gemini model to write a realistic compute request for the current
//! simulated time and parses its answer as a JSON object.
//!
//! Models sometimes wrap JSON in markdown fences even when told not to;
//! those are stripped here before parsing.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use finops_core::{GenerationError, Payload, PayloadGenerator};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// LLM calls are slow; keep them well away from the tick cadence
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Build the job-request prompt for a simulated instant
pub fn build_prompt(sim_time: NaiveDateTime) -> String {
    format!(
        r#"You are an autonomous FinOps simulation engine representing diverse machine learning job requests from multiple teams around the world.
The current simulated time is {now}.

Please generate a realistic machine learning compute request that sounds like it was written by an engineer.
The request should specify:
- Tier (e.g. Tier 1, Tier 2, Tier 3)
- Priority (e.g. Critical, High, Normal, Low)
- Resource requirements (e.g. GPU counts like 1x, 4x, 8x, or cluster sizes using A100, H100, TPU v4)
- Duration in hours (between 1 and 720)
- A deadline/SLA depending on the priority relative to the current time.
- Region (e.g. us-east, eu-west, global)
- Compliance (e.g. HIPAA, GDPR, None)
- SLA percentage (e.g. 99.9%, 99.99%)
- Minimum Quality (e.g. standard, high, premium)
- Minimum Availability (e.g. low, medium, high)

Output strictly as a valid JSON object matching this exact schema:
{{
  "tier": "String",
  "priority": "String",
  "resources": {{"gpus": "Integer", "type": "String", "description": "String details"}},
  "duration_hours": "Integer",
  "sla_deadline": "ISO 8601 Timestamp",
  "region": "String",
  "compliance": "String",
  "sla": "String",
  "min_quality": "String",
  "min_availability": "String",
  "description": "String containing the realistic natural language request."
}}

Return ONLY JSON. Do not include markdown code block formatting like ```json or ```."#,
        now = sim_time.format("%Y-%m-%dT%H:%M:%S")
    )
}

/// Remove a leading ```json / ``` fence and a trailing ``` fence
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Concatenate the text parts of the first candidate
fn extract_text(body: &Value) -> Option<String> {
    let text = body["candidates"]
        .as_array()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate["content"]["parts"].as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })?;

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Gemini-backed [`PayloadGenerator`]
pub struct GeminiGenerator {
    /// HTTP client
    client: reqwest::Client,

    /// API base URL
    base_url: String,

    /// Model name
    model: String,

    /// API key; requests fail without one
    api_key: Option<String>,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl GeminiGenerator {
    /// Create a generator for `model`
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GenerationError::transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    /// Point at a different API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl PayloadGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, sim_time: NaiveDateTime) -> Result<Payload, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::MissingApiKey(API_KEY_ENV.to_string()))?;

        let request = json!({
            "contents": [
                {
                    "parts": [
                        { "text": build_prompt(sim_time) }
                    ]
                }
            ],
            "generationConfig": {
                "responseMimeType": "application/json"
            }
        });

        debug!(model = %self.model, sim_time = %sim_time, "Requesting job payload from Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: body.chars().take(320).collect(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::transport(format!("invalid response body: {}", e)))?;

        let text = extract_text(&body).ok_or(GenerationError::EmptyResponse)?;
        Payload::from_json_str(strip_code_fences(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sim_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn candidate(text: &str) -> Value {
        json!({
            "candidates": [
                { "content": { "parts": [ { "text": text } ] }, "finishReason": "STOP" }
            ]
        })
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_prompt_mentions_sim_time() {
        let prompt = build_prompt(sim_time());
        assert!(prompt.contains("2026-02-20T12:00:00"));
        assert!(prompt.contains("\"sla_deadline\""));
    }

    #[tokio::test]
    async fn test_generate_job_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{}:generateContent", DEFAULT_MODEL)))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate(
                "```json\n{\"tier\": \"Tier 1\", \"priority\": \"Critical\", \"description\": \"Need GPUs.\"}\n```",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(DEFAULT_MODEL, Some("test-key".to_string()))
            .unwrap()
            .with_base_url(server.uri());

        let payload = generator.generate(sim_time()).await.unwrap();

        assert_eq!(payload.get("tier"), Some(&json!("Tier 1")));
        assert!(payload.get("description").is_some());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(DEFAULT_MODEL, Some("  ".to_string()))
            .unwrap()
            .with_base_url(server.uri());

        let err = generator.generate(sim_time()).await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey(_)));
    }

    #[tokio::test]
    async fn test_error_status_and_bad_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate("Sure! Here is a job")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new(DEFAULT_MODEL, Some("test-key".to_string()))
            .unwrap()
            .with_base_url(server.uri());

        let first = generator.generate(sim_time()).await.unwrap_err();
        assert!(matches!(first, GenerationError::Status { status: 429, .. }));

        let second = generator.generate(sim_time()).await.unwrap_err();
        assert!(matches!(second, GenerationError::Json(_)));

        let third = generator.generate(sim_time()).await.unwrap_err();
        assert!(matches!(third, GenerationError::EmptyResponse));
    }
}
