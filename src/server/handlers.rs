use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use super::error::ApiError;
use super::state::AppState;
use crate::models::{GenerateRequest, GenerateResponse};

/// POST /api/generate
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let prompt = match body {
        Ok(Json(GenerateRequest {
            prompt: Some(prompt),
        })) if !prompt.is_empty() => prompt,
        Ok(_) => return Err(ApiError::MissingPrompt),
        Err(rejection) => {
            tracing::debug!("Rejected generate body: {}", rejection);
            return Err(ApiError::MissingPrompt);
        }
    };

    tracing::info!(prompt_len = prompt.len(), "Generating content");

    match state.generator.generate(&prompt).await {
        Ok(response) => Ok(Json(GenerateResponse { response })),
        Err(e) => {
            tracing::error!("Error generating content: {}", e);
            Err(ApiError::GenerationFailed)
        }
    }
}
