use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::database::entities::enrollments;
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::EnrollmentSummary;

#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Enrolled; repeated calls return the same enrollment"),
        (status = 404, description = "Course not found or not published")
    )
)]
pub async fn enroll(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<i32>,
) -> Result<Json<enrollments::Model>, CoreError> {
    Ok(Json(state.enrollments.enroll(user.id, course_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}/enroll",
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 204, description = "Enrollment and its progress removed"),
        (status = 404, description = "Not enrolled")
    )
)]
pub async fn unenroll(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    state.enrollments.unenroll(user.id, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/enrollments",
    responses(
        (status = 200, description = "Enrolled courses with progress", body = [EnrollmentSummary])
    )
)]
pub async fn list_enrollments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<EnrollmentSummary>>, CoreError> {
    Ok(Json(state.enrollments.list_enrollments(user.id).await?))
}
