use async_trait::async_trait;
use serde::Deserialize;

use super::config::ChatConfig;
use super::relay::{CompletionBackend, Content, GenerateRequest, RelayError};

/// `generateContent` client for the Google generative-language API
#[derive(Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiBackend {
    pub fn new(config: &ChatConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    async fn complete(&self, request: &GenerateRequest) -> Result<String, RelayError> {
        let api_key = self.api_key.as_deref().ok_or(RelayError::MissingApiKey)?;

        tracing::info!(model = %self.model, turns = request.contents.len(), "Calling chat API");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), "Chat API rejected request");
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(RelayError::EmptyResponse);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::relay::{build_request, ChatMessage, ChatRole};
    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(base_url: String, api_key: Option<&str>) -> ChatConfig {
        ChatConfig {
            base_url,
            api_key: api_key.map(str::to_string),
            ..ChatConfig::default()
        }
    }

    fn ping() -> GenerateRequest {
        build_request(&[ChatMessage::new(ChatRole::User, "ping")], None).unwrap()
    }

    #[tokio::test]
    async fn extracts_candidate_text() {
        let router = Router::new().route(
            "/v1beta/models/:model",
            post(
                |Path(model): Path<String>,
                 Query(query): Query<HashMap<String, String>>,
                 Json(body): Json<Value>| async move {
                    assert_eq!(model, "gemini-1.5-flash:generateContent");
                    assert_eq!(query.get("key").map(String::as_str), Some("test-key"));
                    assert_eq!(body["contents"][0]["parts"][0]["text"], "ping");
                    Json(json!({
                        "candidates": [{
                            "content": {"role": "model", "parts": [{"text": "po"}, {"text": "ng"}]}
                        }]
                    }))
                },
            ),
        );
        let base_url = spawn_upstream(router).await;

        let backend = GeminiBackend::new(&config(base_url, Some("test-key"))).unwrap();
        let reply = backend.complete(&ping()).await.unwrap();
        assert_eq!(reply, "pong");
    }

    #[tokio::test]
    async fn surfaces_upstream_error_message() {
        let router = Router::new().route(
            "/v1beta/models/:model",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"code": 400, "message": "API key not valid"}})),
                )
            }),
        );
        let base_url = spawn_upstream(router).await;

        let backend = GeminiBackend::new(&config(base_url, Some("bad"))).unwrap();
        match backend.complete(&ping()).await {
            Err(RelayError::Upstream { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let backend =
            GeminiBackend::new(&config("http://127.0.0.1:9".to_string(), None)).unwrap();
        assert!(matches!(
            backend.complete(&ping()).await,
            Err(RelayError::MissingApiKey)
        ));
    }
}
