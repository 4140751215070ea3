use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};

use crate::chat::relay::{RelayFailure, RelayReply, RelayRequest};
use crate::chat::RelayError;
use crate::server::app::AppState;

/// Stateless relay to the chat-completion API. No session required.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = RelayRequest,
    responses(
        (status = 200, description = "Assistant reply", body = RelayReply),
        (status = 400, description = "Malformed request body", body = RelayFailure),
        (status = 500, description = "Chat API or configuration failure", body = RelayFailure)
    )
)]
pub async fn relay_chat(
    State(state): State<AppState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<RelayReply>, RelayError> {
    let Json(request) = payload.map_err(|rejection| RelayError::InvalidRequest(rejection.body_text()))?;

    let content = state.relay.relay(&request.messages).await?;
    tracing::info!(
        messages = request.messages.len(),
        reply_chars = content.chars().count(),
        "Chat relay answered"
    );

    Ok(Json(RelayReply { content }))
}
