use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::models::*;
use crate::providers::traits::TextGenerator;
use crate::providers::types::ProviderError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Single-turn client for Gemini's `generateContent` endpoint.
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    system_instruction: Option<String>,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            system_instruction: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Parse an API error response body into a user-friendly message.
    fn parse_error_message(status: StatusCode, body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(msg) = parsed["error"]["message"].as_str() {
                return format!("HTTP {}: {}", status.as_u16(), msg);
            }
        }
        format!("HTTP {}: Request failed", status.as_u16())
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent::text(Some("user"), prompt)],
            system_instruction: self
                .system_instruction
                .as_deref()
                .map(|instruction| GeminiContent::text(None, instruction)),
        }
    }

    /// Concatenated text parts of the first candidate.
    fn response_text(response: GeminiResponse) -> Result<String, ProviderError> {
        if let Some(error) = response.error {
            return Err(ProviderError::RequestFailed(
                error.message.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        let parts = response
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "No content in response".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::AuthError("GEMINI_API_KEY is not set".to_string()))?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::AuthError("Invalid API key".to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::RequestFailed(Self::parse_error_message(
                status, &body,
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Self::response_text(gemini_response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::providers::spawn_test_server;

    #[derive(Clone, Default)]
    struct Seen {
        calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn generate_content(
        State(seen): State<Seen>,
        Path(action): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let key = headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.calls.lock().unwrap().push((action, key, body));
        Json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "A stack is "}, {"text": "LIFO."}]}
            }]
        }))
    }

    #[tokio::test]
    async fn test_generate_sends_persona_and_joins_parts() {
        let seen = Seen::default();
        let router = Router::new()
            .route("/models/{action}", post(generate_content))
            .with_state(seen.clone());
        let base = spawn_test_server(router).await;

        let provider = GeminiProvider::new(Some("test-key".to_string()), DEFAULT_MODEL)
            .with_base_url(format!("{}/", base))
            .with_system_instruction("You are Nexora.");
        let text = provider.generate("What is a stack?").await.unwrap();
        assert_eq!(text, "A stack is LIFO.");

        let calls = seen.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (action, key, body) = &calls[0];
        assert_eq!(action, "gemini-1.5-flash:generateContent");
        assert_eq!(key.as_deref(), Some("test-key"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "What is a stack?");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are Nexora.");
    }

    #[tokio::test]
    async fn test_upstream_error_is_request_failed() {
        let router = Router::new().route(
            "/models/{action}",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"message": "model not found"}})),
                )
            }),
        );
        let base = spawn_test_server(router).await;

        let provider = GeminiProvider::new(Some("k".to_string()), "missing-model").with_base_url(base);
        match provider.generate("hi").await {
            Err(ProviderError::RequestFailed(msg)) => assert_eq!(msg, "HTTP 400: model not found"),
            other => panic!("Expected RequestFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let provider = GeminiProvider::new(None, DEFAULT_MODEL).with_base_url("http://127.0.0.1:9");
        assert!(matches!(
            provider.generate("hi").await,
            Err(ProviderError::AuthError(_))
        ));
    }

    #[test]
    fn test_empty_candidates_are_invalid() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            GeminiProvider::response_text(response),
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
