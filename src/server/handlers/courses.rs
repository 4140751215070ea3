use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::database::entities::{courses, lessons, sections};
use crate::errors::CoreError;
use crate::server::app::AppState;
use crate::server::auth::{CurrentUser, OptionalUser};
use crate::services::{
    CatalogQuery, CourseInput, CourseOutline, CoursePage, CourseUpdate, LessonInput,
    LessonUpdate, SectionInput,
};

#[utoipa::path(
    get,
    path = "/api/courses",
    params(CatalogQuery),
    responses(
        (status = 200, description = "One page of published courses", body = CoursePage)
    )
)]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CoursePage>, CoreError> {
    Ok(Json(state.catalog.list_courses(&query).await?))
}

#[utoipa::path(
    get,
    path = "/api/courses/categories",
    responses(
        (status = 200, description = "Categories of published courses", body = [String])
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, CoreError> {
    Ok(Json(state.catalog.categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(
        ("id" = String, Path, description = "Course id or slug")
    ),
    responses(
        (status = 200, description = "Course with its sections and lessons", body = CourseOutline),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Path(key): Path<String>,
) -> Result<Json<CourseOutline>, CoreError> {
    let outline = state.catalog.get_course_outline(&key, viewer.as_ref()).await?;
    Ok(Json(outline))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CourseInput,
    responses(
        (status = 201, description = "Course created"),
        (status = 403, description = "Only instructors can create courses")
    )
)]
pub async fn create_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CourseInput>,
) -> Result<(StatusCode, Json<courses::Model>), CoreError> {
    let course = state.catalog.create_course(&user, input).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    request_body = CourseUpdate,
    responses(
        (status = 200, description = "Course updated"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn update_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(update): Json<CourseUpdate>,
) -> Result<Json<courses::Model>, CoreError> {
    Ok(Json(state.catalog.update_course(&user, id, update).await?))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn delete_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    state.catalog.delete_course(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/sections",
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    request_body = SectionInput,
    responses(
        (status = 201, description = "Section appended"),
        (status = 403, description = "Not the course instructor")
    )
)]
pub async fn add_section(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<SectionInput>,
) -> Result<(StatusCode, Json<sections::Model>), CoreError> {
    let section = state.catalog.add_section(&user, id, input).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

#[utoipa::path(
    post,
    path = "/api/sections/{id}/lessons",
    params(
        ("id" = i32, Path, description = "Section ID")
    ),
    request_body = LessonInput,
    responses(
        (status = 201, description = "Lesson appended"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Section not found")
    )
)]
pub async fn add_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<LessonInput>,
) -> Result<(StatusCode, Json<lessons::Model>), CoreError> {
    let lesson = state.catalog.add_lesson(&user, id, input).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

#[utoipa::path(
    put,
    path = "/api/lessons/{id}",
    params(
        ("id" = i32, Path, description = "Lesson ID")
    ),
    request_body = LessonUpdate,
    responses(
        (status = 200, description = "Lesson updated"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn update_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(update): Json<LessonUpdate>,
) -> Result<Json<lessons::Model>, CoreError> {
    Ok(Json(state.catalog.update_lesson(&user, id, update).await?))
}

#[utoipa::path(
    delete,
    path = "/api/lessons/{id}",
    params(
        ("id" = i32, Path, description = "Lesson ID")
    ),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn delete_lesson(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, CoreError> {
    state.catalog.delete_lesson(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
