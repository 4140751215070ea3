//! Stateless chat relay.
//!
//! Takes a chat history in the `{ role, content }` shape the front-end
//! speaks, reshapes it into the generative-text API's `contents` layout and
//! hands it to a [`CompletionBackend`]. Nothing is stored and nothing is
//! retried; a failure is reported once and the caller decides what to show.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::errors::CoreError;

/// Who authored a message in the front-end's vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "model")]
    Assistant,
    System,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" | "model" => Ok(ChatRole::Assistant),
            "system" => Ok(ChatRole::System),
            other => Err(RelayError::InvalidRequest(format!("unknown role '{other}'"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RelayRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelayReply {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RelayFailure {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Chat API key is not configured")]
    MissingApiKey,

    #[error("Chat API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Chat API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Chat API returned no text")]
    EmptyResponse,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Chat relay failed");
        }
        (
            status,
            Json(RelayFailure {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// Relay failures inside stored conversations surface as service errors
impl From<RelayError> for CoreError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidRequest(message) => CoreError::validation(message),
            other => CoreError::unavailable(other.to_string()).with_source(other),
        }
    }
}

/// A single text part of a turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One turn in the upstream API's history; role is `user` or `model`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

/// Anything that can turn a reshaped history into reply text
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &GenerateRequest) -> Result<String, RelayError>;
}

/// Reshape a front-end chat history into the upstream request.
///
/// System messages are folded into the system instruction (after
/// `system_prompt`, when given). Consecutive turns from the same speaker are
/// merged into one turn with several parts, and leading assistant turns are
/// dropped since the upstream history has to open with the user. The final
/// turn must come from the user.
pub fn build_request(
    messages: &[ChatMessage],
    system_prompt: Option<&str>,
) -> Result<GenerateRequest, RelayError> {
    if messages.is_empty() {
        return Err(RelayError::InvalidRequest(
            "messages must be a non-empty array".to_string(),
        ));
    }

    if let Some(index) = messages.iter().position(|m| m.content.trim().is_empty()) {
        return Err(RelayError::InvalidRequest(format!(
            "message {index} has empty content"
        )));
    }

    let mut system_parts: Vec<Part> = system_prompt
        .filter(|prompt| !prompt.trim().is_empty())
        .map(|prompt| Part {
            text: prompt.to_string(),
        })
        .into_iter()
        .collect();

    let mut contents: Vec<Content> = Vec::new();
    for message in messages {
        let role = match message.role {
            ChatRole::System => {
                system_parts.push(Part {
                    text: message.content.clone(),
                });
                continue;
            }
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
        };

        if contents.is_empty() && role == "model" {
            continue;
        }

        let part = Part {
            text: message.content.clone(),
        };
        match contents.last_mut() {
            Some(last) if last.role.as_deref() == Some(role) => last.parts.push(part),
            _ => contents.push(Content {
                role: Some(role.to_string()),
                parts: vec![part],
            }),
        }
    }

    match contents.last() {
        Some(last) if last.role.as_deref() == Some("user") => {}
        Some(_) => {
            return Err(RelayError::InvalidRequest(
                "the last message must come from the user".to_string(),
            ))
        }
        None => {
            return Err(RelayError::InvalidRequest(
                "messages must include at least one user message".to_string(),
            ))
        }
    }

    let system_instruction = (!system_parts.is_empty()).then(|| Content {
        role: None,
        parts: system_parts,
    });

    Ok(GenerateRequest {
        contents,
        system_instruction,
    })
}

/// Relays chat histories to a completion backend
#[derive(Clone)]
pub struct ChatRelay {
    backend: Arc<dyn CompletionBackend>,
    system_prompt: Option<String>,
}

impl ChatRelay {
    pub fn new(backend: Arc<dyn CompletionBackend>, system_prompt: Option<String>) -> Self {
        Self {
            backend,
            system_prompt,
        }
    }

    pub async fn relay(&self, messages: &[ChatMessage]) -> Result<String, RelayError> {
        let request = build_request(messages, self.system_prompt.as_deref())?;

        tracing::debug!(
            turns = request.contents.len(),
            has_system = request.system_instruction.is_some(),
            "Relaying chat history"
        );

        let reply = self.backend.complete(&request).await?;
        if reply.trim().is_empty() {
            return Err(RelayError::EmptyResponse);
        }

        Ok(reply)
    }
}
