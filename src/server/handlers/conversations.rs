use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::database::entities::conversations;
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::{ChatTurn, ConversationHistory};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameConversationRequest {
    pub title: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

#[utoipa::path(
    get,
    path = "/api/conversations",
    responses(
        (status = 200, description = "Conversations, most recently active first")
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<conversations::Model>>, CoreError> {
    Ok(Json(state.conversations.list_conversations(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/conversations",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created")
    )
)]
pub async fn create_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<conversations::Model>), CoreError> {
    let conversation = state
        .conversations
        .create_conversation(user.id, payload.title.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{id}",
    params(
        ("id" = i32, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation with its messages", body = ConversationHistory),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ConversationHistory>, CoreError> {
    Ok(Json(state.conversations.get_history(user.id, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/conversations/{id}",
    params(
        ("id" = i32, Path, description = "Conversation ID")
    ),
    request_body = RenameConversationRequest,
    responses(
        (status = 200, description = "Conversation renamed"),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn rename_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<RenameConversationRequest>,
) -> Result<Json<conversations::Model>, CoreError> {
    Ok(Json(
        state
            .conversations
            .rename(user.id, id, &payload.title)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/conversations/{id}",
    params(
        ("id" = i32, Path, description = "Conversation ID")
    ),
    responses(
        (status = 204, description = "Conversation deleted"),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn delete_conversation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    state.conversations.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/conversations/{id}/messages",
    params(
        ("id" = i32, Path, description = "Conversation ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Stored user message and assistant reply", body = ChatTurn),
        (status = 404, description = "Conversation not found"),
        (status = 503, description = "Chat API unavailable; the user message is kept")
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<ChatTurn>, CoreError> {
    let turn = state
        .conversations
        .send_message(user.id, id, &payload.content, &state.relay)
        .await?;
    Ok(Json(turn))
}
