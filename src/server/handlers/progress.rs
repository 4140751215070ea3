use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::{CourseProgress, LessonSummary, LessonView, ProgressUpdate};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressReport {
    pub position_seconds: i32,
    /// Mark the lesson finished regardless of position
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResumePoint {
    /// `None` when the course has no lessons
    pub lesson: Option<LessonSummary>,
}

#[utoipa::path(
    get,
    path = "/api/lessons/{id}",
    params(
        ("id" = i32, Path, description = "Lesson ID")
    ),
    responses(
        (status = 200, description = "Lesson with progress and neighbours", body = LessonView),
        (status = 403, description = "Not enrolled and not a preview"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn lesson_view(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<i32>,
) -> Result<Json<LessonView>, CoreError> {
    Ok(Json(state.progress.lesson_view(&user, lesson_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/lessons/{id}/progress",
    params(
        ("id" = i32, Path, description = "Lesson ID")
    ),
    request_body = ProgressReport,
    responses(
        (status = 200, description = "Progress recorded", body = ProgressUpdate),
        (status = 403, description = "Not enrolled"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn record_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<i32>,
    Json(report): Json<ProgressReport>,
) -> Result<Json<ProgressUpdate>, CoreError> {
    let update = state
        .progress
        .record_progress(&user, lesson_id, report.position_seconds, report.completed)
        .await?;
    Ok(Json(update))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/progress",
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Completion summary", body = CourseProgress),
        (status = 404, description = "Course not found")
    )
)]
pub async fn course_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<i32>,
) -> Result<Json<CourseProgress>, CoreError> {
    Ok(Json(state.progress.course_progress(&user, course_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/resume",
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Where to continue watching", body = ResumePoint),
        (status = 404, description = "Course not found")
    )
)]
pub async fn resume_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<i32>,
) -> Result<Json<ResumePoint>, CoreError> {
    let lesson = state.progress.resume_lesson(&user, course_id).await?;
    Ok(Json(ResumePoint { lesson }))
}
