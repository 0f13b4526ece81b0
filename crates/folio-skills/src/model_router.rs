//! Model Router: sends the composed prompt to the Gemini `generateContent` endpoint and
//! hands back the raw payload as a [`CompletionResult`].

use folio_core::{CompletionGateway, CompletionResult, CoreConfig, GatewayError};
use serde_json::{json, Value};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Sampling settings sent with every request. The token cap is raised to avoid truncation.
const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.95;
const TOP_K: u32 = 40;
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Routes a prompt to the live completion API. No explicit timeout and no retry:
/// the service's own defaults apply.
pub struct ModelRouter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ModelRouter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.gemini_api_base.clone(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "topP": TOP_P,
                "topK": TOP_K,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        })
    }
}

#[async_trait::async_trait]
impl CompletionGateway for ModelRouter {
    async fn complete(&self, prompt: &str) -> Result<CompletionResult, GatewayError> {
        tracing::debug!(
            target: "folio::chat",
            model = %self.model,
            prompt_len = prompt.len(),
            "Sending completion request"
        );
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        if let Some(reason) = CompletionResult::finish_reason(&body) {
            let upper = reason.to_uppercase();
            if upper.contains("MAX_TOKENS") || upper.contains("LENGTH") {
                tracing::warn!(
                    target: "folio::chat",
                    finish_reason = %reason,
                    "Response may be truncated due to token limit"
                );
            }
        }

        Ok(CompletionResult::from_gemini(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Seen {
        path: Arc<Mutex<Option<String>>>,
        key: Arc<Mutex<Option<String>>>,
        body: Arc<Mutex<Option<Value>>>,
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn posts_prompt_and_decodes_text() {
        let seen = Seen::default();
        let router = Router::new()
            .fallback(
                |State(seen): State<Seen>, uri: Uri, headers: HeaderMap, Json(body): Json<Value>| async move {
                    *seen.path.lock().unwrap() = Some(uri.path().to_string());
                    *seen.key.lock().unwrap() = headers
                        .get(API_KEY_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    *seen.body.lock().unwrap() = Some(body);
                    Json(json!({
                        "candidates": [{
                            "content": { "role": "model", "parts": [{ "text": "Hi, I'm Ada." }] },
                            "finishReason": "STOP"
                        }]
                    }))
                },
            )
            .with_state(seen.clone());
        let base = spawn(router).await;

        let router = ModelRouter::new("secret", "gemini-test", base);
        let result = router.complete("Who are you?").await.unwrap();

        assert_eq!(result, CompletionResult::Text("Hi, I'm Ada.".to_string()));
        assert_eq!(
            seen.path.lock().unwrap().as_deref(),
            Some("/models/gemini-test:generateContent")
        );
        assert_eq!(seen.key.lock().unwrap().as_deref(), Some("secret"));
        let body = seen.body.lock().unwrap().clone().unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Who are you?");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().fallback(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") });
        let base = spawn(router).await;

        let err = ModelRouter::new("secret", "gemini-test", base)
            .complete("hello")
            .await
            .unwrap_err();

        match err {
            GatewayError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn payload_without_text_is_passed_through() {
        let router = Router::new().fallback(|| async {
            Json(json!({ "candidates": [{ "finishReason": "SAFETY" }], "modelVersion": "x" }))
        });
        let base = spawn(router).await;

        let result = ModelRouter::new("secret", "gemini-test", base)
            .complete("hello")
            .await
            .unwrap();

        assert_eq!(result, CompletionResult::Candidates(vec![Default::default()]));
    }
}
