use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::database::entities::profiles;
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::server::auth::{CurrentUser, SessionToken};
use crate::services::AuthSession;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = AuthSession),
        (status = 400, description = "Invalid email, password or name"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthSession>), CoreError> {
    let session = state
        .auth
        .sign_up(&payload.email, &payload.password, &payload.full_name)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthSession),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<AuthSession>, CoreError> {
    let session = state.auth.sign_in(&payload.email, &payload.password).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "No bearer token")
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<StatusCode, CoreError> {
    state.auth.sign_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Profile of the current session"),
        (status = 401, description = "Missing, unknown or expired session")
    )
)]
pub async fn session(CurrentUser(profile): CurrentUser) -> Json<profiles::Model> {
    Json(profile)
}
