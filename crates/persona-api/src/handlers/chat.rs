//! Persona chat handler

use crate::error::AppError;
use crate::state::AppState;
use axum::{body::Bytes, extract::State, Json};
use persona_core::{compose, LlmClient, PersonaTemplate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Chat request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The user's question to the bot
    #[schema(example = "What is your superpower?", min_length = 1)]
    pub question: String,
}

impl ChatRequest {
    /// Decode and validate a request body.
    ///
    /// The body is read as JSON whatever its `Content-Type`; any decoding
    /// problem is a validation failure.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        let req: Self = serde_json::from_slice(body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?;
        req.validate()?;
        Ok(req)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.question.trim().is_empty() {
            return Err(AppError::Validation(
                "question: must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Chat response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    /// Model-generated text, unmodified
    pub response: String,
}

/// Compose the persona prompt and make exactly one generation call.
///
/// Any failure is logged with its kind and collapsed into `AppError::Upstream`.
pub async fn handle_chat(
    template: &PersonaTemplate,
    llm: &dyn LlmClient,
    question: &str,
) -> Result<String, AppError> {
    let prompt = compose(template, question);

    match llm.generate(&prompt).await {
        Ok(text) => {
            tracing::debug!(model = llm.model(), response_len = text.len(), "Model responded");
            Ok(text)
        }
        Err(e) => {
            let kind = e.upstream_kind().map(|k| k.as_str()).unwrap_or("other");
            tracing::error!(model = llm.model(), kind, error = %e, "An error occurred while calling the model");
            Err(AppError::Upstream)
        }
    }
}

/// Answer a question in persona
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Model answered", body = ChatResponse),
        (status = 422, description = "Malformed body or missing/empty question", body = crate::error::ApiError),
        (status = 500, description = "Generation service failed", body = crate::error::ApiError)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ChatResponse>, AppError> {
    let req = ChatRequest::from_body(&body)?;

    let response = handle_chat(&state.template, state.llm.as_ref(), &req.question).await?;

    Ok(Json(ChatResponse { response }))
}
