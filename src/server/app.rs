use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers::{
    auth, chat, conversations, courses, enrollments, files, health, notes, profile, progress,
};
use crate::chat::ChatRelay;
use crate::config::Config;
use crate::services::{
    AuthService, CatalogService, ConversationService, EnrollmentService, NoteService,
    ProfileService, ProgressService, StorageService,
};

// Room for multipart framing on top of the largest accepted file
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub profiles: ProfileService,
    pub catalog: CatalogService,
    pub enrollments: EnrollmentService,
    pub progress: ProgressService,
    pub notes: NoteService,
    pub storage: StorageService,
    pub conversations: ConversationService,
    pub relay: ChatRelay,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, relay: ChatRelay) -> Self {
        let auth = AuthService::new(db.clone())
            .with_session_ttl_hours(config.session_ttl_hours)
            .with_hash_cost(config.password_hash_cost);
        let storage = StorageService::new(
            db.clone(),
            config.storage_dir.clone(),
            config.max_upload_bytes,
        );

        Self {
            auth,
            storage,
            profiles: ProfileService::new(db.clone()),
            catalog: CatalogService::new(db.clone()),
            enrollments: EnrollmentService::new(db.clone()),
            progress: ProgressService::new(db.clone()),
            notes: NoteService::new(db.clone()),
            conversations: ConversationService::new(db.clone()),
            config: Arc::new(config),
            relay,
            db,
        }
    }
}

pub async fn create_app(db: DatabaseConnection, config: Config, relay: ChatRelay) -> Result<Router> {
    let cors = match config.allowed_origin() {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin '{}'", origin))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        None => open_cors(),
    };

    tokio::fs::create_dir_all(&config.storage_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create storage directory {}",
                config.storage_dir.display()
            )
        })?;

    let body_limit = usize::try_from(config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES)
        .unwrap_or(usize::MAX);
    let storage_dir = config.storage_dir.clone();
    let state = AppState::new(db, config, relay);

    // The relay keeps its own CORS policy so any origin can call it
    let chat_routes = Router::new()
        .route("/api/chat", post(chat::relay_chat))
        .layer(open_cors());

    let app = Router::new()
        .route("/health", get(health::health_check))
        .merge(api_routes().layer(cors))
        .merge(chat_routes)
        .nest_service("/storage", ServeDir::new(storage_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state);

    #[cfg(feature = "docs")]
    let app = app.merge(super::docs::swagger_ui());

    Ok(app)
}

fn open_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth and profile
        .route("/api/auth/signup", post(auth::sign_up))
        .route("/api/auth/signin", post(auth::sign_in))
        .route("/api/auth/signout", post(auth::sign_out))
        .route("/api/auth/session", get(auth::session))
        .route("/api/profile", get(profile::get_profile).put(profile::update_profile))

        // Catalog and authoring
        .route("/api/courses", get(courses::list_courses).post(courses::create_course))
        .route("/api/courses/categories", get(courses::list_categories))
        .route(
            "/api/courses/:id",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/api/courses/:id/sections", post(courses::add_section))
        .route("/api/sections/:id/lessons", post(courses::add_lesson))
        .route(
            "/api/lessons/:id",
            get(progress::lesson_view)
                .put(courses::update_lesson)
                .delete(courses::delete_lesson),
        )

        // Enrollment and progress
        .route(
            "/api/courses/:id/enroll",
            post(enrollments::enroll).delete(enrollments::unenroll),
        )
        .route("/api/enrollments", get(enrollments::list_enrollments))
        .route("/api/courses/:id/progress", get(progress::course_progress))
        .route("/api/courses/:id/resume", get(progress::resume_lesson))
        .route("/api/lessons/:id/progress", post(progress::record_progress))

        // Notes and files
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route("/api/notes/:id", put(notes::update_note).delete(notes::delete_note))
        .route("/api/files", get(files::list_files).post(files::upload_file))
        .route("/api/files/:id", axum::routing::delete(files::delete_file))

        // Stored conversations
        .route(
            "/api/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/api/conversations/:id",
            get(conversations::get_conversation)
                .put(conversations::rename_conversation)
                .delete(conversations::delete_conversation),
        )
        .route("/api/conversations/:id/messages", post(conversations::send_message))
}
