use axum::{extract::State, response::Json};

use crate::database::entities::profiles;
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::ProfileUpdate;

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Current profile"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<profiles::Model>, CoreError> {
    Ok(Json(state.profiles.get_profile(user.id).await?))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile"),
        (status = 400, description = "Invalid field"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<profiles::Model>, CoreError> {
    Ok(Json(state.profiles.update_profile(user.id, update).await?))
}
