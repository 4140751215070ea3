use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::database::entities::notes;
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::{NoteInput, NoteUpdate};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NoteFilter {
    pub lesson_id: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/notes",
    params(NoteFilter),
    responses(
        (status = 200, description = "The caller's notes, newest first")
    )
)]
pub async fn list_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<NoteFilter>,
) -> Result<Json<Vec<notes::Model>>, CoreError> {
    Ok(Json(state.notes.list_notes(user.id, filter.lesson_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/notes",
    request_body = NoteInput,
    responses(
        (status = 201, description = "Note created"),
        (status = 400, description = "Empty or oversized body"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<NoteInput>,
) -> Result<(StatusCode, Json<notes::Model>), CoreError> {
    let note = state.notes.create_note(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

#[utoipa::path(
    put,
    path = "/api/notes/{id}",
    params(
        ("id" = i32, Path, description = "Note ID")
    ),
    request_body = NoteUpdate,
    responses(
        (status = 200, description = "Note updated"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(update): Json<NoteUpdate>,
) -> Result<Json<notes::Model>, CoreError> {
    Ok(Json(state.notes.update_note(user.id, id, update).await?))
}

#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    params(
        ("id" = i32, Path, description = "Note ID")
    ),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    state.notes.delete_note(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
