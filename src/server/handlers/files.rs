use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};

use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::StoredFile;

const FILE_FIELD: &str = "file";

#[utoipa::path(
    get,
    path = "/api/files",
    responses(
        (status = 200, description = "The caller's uploads, newest first", body = [StoredFile])
    )
)]
pub async fn list_files(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<StoredFile>>, CoreError> {
    Ok(Json(state.storage.list_files(user.id).await?))
}

/// Multipart upload; the blob is read from the `file` field
#[utoipa::path(
    post,
    path = "/api/files",
    request_body(content = String, content_type = "multipart/form-data", description = "Form with a `file` field"),
    responses(
        (status = 201, description = "File stored", body = StoredFile),
        (status = 400, description = "Missing, empty or oversized file")
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFile>), CoreError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CoreError::validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| CoreError::validation(format!("Failed to read upload: {}", e)))?;

        let stored = state
            .storage
            .upload(user.id, &file_name, content_type.as_deref(), &bytes)
            .await?;
        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(CoreError::invalid_field(
        FILE_FIELD,
        "Multipart field 'file' is required",
    ))
}

#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    params(
        ("id" = i32, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found")
    )
)]
pub async fn delete_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    state.storage.delete_file(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
