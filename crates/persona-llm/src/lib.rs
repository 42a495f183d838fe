//! Generation service client
//!
//! Implements `LlmClient` for the Google Generative Language API
//! (`models/{model}:generateContent`). Responses are awaited in full;
//! every failure is tagged with an `UpstreamKind` for operator logs.

use async_trait::async_trait;
use persona_core::{LlmClient, LlmConfig, PersonaError, Result, UpstreamKind};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated in order
    fn into_text(self) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(PersonaError::upstream(
                UpstreamKind::Empty,
                format!("No response generated: {reason}"),
            ));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(PersonaError::upstream(
                UpstreamKind::Empty,
                format!("Candidate has no text (finish reason: {reason})"),
            ));
        }

        Ok(text)
    }
}

// ============================================================================
// Gemini Client
// ============================================================================

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a new Gemini client with the default HTTP client settings
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: LlmConfig::default().base_url,
            model: model.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key()?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| PersonaError::Other(e.into()))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Set custom base URL (for proxies or a local stub)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Calling generateContent");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PersonaError::upstream(UpstreamKind::Network, format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PersonaError::upstream(UpstreamKind::Network, format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let result: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            PersonaError::upstream(UpstreamKind::Parse, format!("Failed to parse response: {e}"))
        })?;

        result.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Map a non-success response to a tagged upstream error
fn classify_failure(status: StatusCode, body: &str) -> PersonaError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let google_status = parsed.as_ref().map(|e| e.error.status.as_str()).unwrap_or("");

    let kind = match (status, google_status) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => UpstreamKind::Auth,
        (_, "UNAUTHENTICATED" | "PERMISSION_DENIED") => UpstreamKind::Auth,
        (StatusCode::TOO_MANY_REQUESTS, _) | (_, "RESOURCE_EXHAUSTED") => UpstreamKind::Quota,
        // An invalid key is reported as 400 INVALID_ARGUMENT
        (StatusCode::BAD_REQUEST, _) if body.contains("API_KEY_INVALID") => UpstreamKind::Auth,
        _ => UpstreamKind::Status,
    };

    let detail = match parsed {
        Some(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.to_string(),
    };

    PersonaError::upstream(kind, format!("Gemini error {status}: {detail}"))
}

// ============================================================================
// Factory function
// ============================================================================

/// Create the generation client from config
pub fn create_llm_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    Ok(Box::new(GeminiClient::from_config(config)?))
}

// ============================================================================
// Tests
// ============================================================================
