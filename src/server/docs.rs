use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers;
use crate::chat::relay::{ChatMessage, ChatRole, RelayFailure, RelayReply, RelayRequest};
use crate::services::{
    AuthSession, CatalogSort, ChatTurn, ConversationHistory, CourseInput, CourseOutline,
    CoursePage, CourseProgress, CourseSummary, CourseUpdate, EnrollmentSummary, LessonInput,
    LessonSummary, LessonUpdate, LessonView, NoteInput, NoteUpdate, ProfileUpdate,
    ProgressUpdate, SectionInput, SectionOutline, StoredFile,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Lectern API", description = "Courses, lesson progress, notes, uploads and chat"),
    paths(
        handlers::health::health_check,
        handlers::auth::sign_up,
        handlers::auth::sign_in,
        handlers::auth::sign_out,
        handlers::auth::session,
        handlers::profile::get_profile,
        handlers::profile::update_profile,
        handlers::courses::list_courses,
        handlers::courses::list_categories,
        handlers::courses::get_course,
        handlers::courses::create_course,
        handlers::courses::update_course,
        handlers::courses::delete_course,
        handlers::courses::add_section,
        handlers::courses::add_lesson,
        handlers::courses::update_lesson,
        handlers::courses::delete_lesson,
        handlers::enrollments::enroll,
        handlers::enrollments::unenroll,
        handlers::enrollments::list_enrollments,
        handlers::progress::lesson_view,
        handlers::progress::record_progress,
        handlers::progress::course_progress,
        handlers::progress::resume_lesson,
        handlers::notes::list_notes,
        handlers::notes::create_note,
        handlers::notes::update_note,
        handlers::notes::delete_note,
        handlers::files::list_files,
        handlers::files::upload_file,
        handlers::files::delete_file,
        handlers::conversations::list_conversations,
        handlers::conversations::create_conversation,
        handlers::conversations::get_conversation,
        handlers::conversations::rename_conversation,
        handlers::conversations::delete_conversation,
        handlers::conversations::send_message,
        handlers::chat::relay_chat,
    ),
    components(schemas(
        handlers::auth::SignUpRequest,
        handlers::auth::SignInRequest,
        handlers::progress::ProgressReport,
        handlers::progress::ResumePoint,
        handlers::conversations::CreateConversationRequest,
        handlers::conversations::RenameConversationRequest,
        handlers::conversations::SendMessageRequest,
        AuthSession,
        ProfileUpdate,
        CatalogSort,
        CourseSummary,
        CoursePage,
        CourseOutline,
        SectionOutline,
        LessonSummary,
        CourseInput,
        CourseUpdate,
        SectionInput,
        LessonInput,
        LessonUpdate,
        EnrollmentSummary,
        CourseProgress,
        ProgressUpdate,
        LessonView,
        NoteInput,
        NoteUpdate,
        StoredFile,
        ConversationHistory,
        ChatTurn,
        ChatRole,
        ChatMessage,
        RelayRequest,
        RelayReply,
        RelayFailure,
    ))
)]
pub struct ApiDoc;

/// Swagger UI at `/docs`, backed by the generated OpenAPI document
pub fn swagger_ui() -> Router {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
