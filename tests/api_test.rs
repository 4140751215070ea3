//! API integration tests
//!
//! Exercise the HTTP surface end to end against a temporary SQLite file and
//! storage directory, with the chat backend replaced by a stub.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use lectern::chat::relay::GenerateRequest;
use lectern::chat::{ChatRelay, CompletionBackend, RelayError};
use lectern::config::Config;
use lectern::database::connection::setup_database;
use lectern::database::entities::profiles;
use lectern::server::app::create_app;
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::{json, Value};
use tempfile::TempDir;

// Lowest cost bcrypt accepts
const TEST_HASH_COST: u32 = 4;

/// Replies with the number of turns it was sent, or fails on demand
struct StubBackend;

#[async_trait]
impl CompletionBackend for StubBackend {
    async fn complete(&self, request: &GenerateRequest) -> Result<String, RelayError> {
        let last = request
            .contents
            .last()
            .and_then(|content| content.parts.last())
            .map(|part| part.text.clone())
            .unwrap_or_default();

        if last.contains("fail") {
            return Err(RelayError::Upstream {
                status: 500,
                message: "stub failure".into(),
            });
        }
        Ok(format!("{} turns, last: {}", request.contents.len(), last))
    }
}

struct TestApp {
    server: TestServer,
    db: DatabaseConnection,
    // Keeps the database file and uploads alive for the test
    _dir: TempDir,
}

/// Create a test server backed by a temporary database
async fn setup_test_app() -> Result<TestApp> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("lectern-test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    let config = Config {
        storage_dir: dir.path().join("storage"),
        max_upload_bytes: 1024,
        password_hash_cost: TEST_HASH_COST,
        cors_origin: Some("http://app.example".into()),
        ..Config::default()
    };
    let relay = ChatRelay::new(Arc::new(StubBackend), Some("You are a tutor.".into()));

    let app = create_app(db.clone(), config, relay).await?;
    let server = TestServer::new(app)?;

    Ok(TestApp {
        server,
        db,
        _dir: dir,
    })
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

async fn sign_up(server: &TestServer, email: &str) -> (String, i64) {
    let response = server
        .post("/api/auth/signup")
        .json(&json!({
            "email": email,
            "password": "password123",
            "full_name": "Test User"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body: Value = response.json();
    (
        body["token"].as_str().unwrap().to_string(),
        body["profile"]["id"].as_i64().unwrap(),
    )
}

async fn promote_to_instructor(db: &DatabaseConnection, email: &str) {
    let profile = profiles::Entity::find()
        .filter(profiles::Column::Email.eq(email))
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let mut active: profiles::ActiveModel = profile.into();
    active.role = Set(profiles::ROLE_INSTRUCTOR.to_string());
    active.update(db).await.unwrap();
}

/// Instructor-owned published course with two sections and three lessons
async fn create_course(app: &TestApp, token: &str, title: &str) -> (i64, Vec<i64>) {
    let (name, value) = bearer(token);
    let response = app
        .server
        .post("/api/courses")
        .add_header(name, value)
        .json(&json!({
            "title": title,
            "description": "A course for tests",
            "category": "Programming",
            "level": "beginner",
            "price_cents": 1500,
            "is_published": true
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let course_id = response.json::<Value>()["id"].as_i64().unwrap();

    let mut lesson_ids = Vec::new();
    for (section, lessons) in [("Basics", vec!["Intro", "Setup"]), ("Next", vec!["Deep dive"])] {
        let (name, value) = bearer(token);
        let section: Value = app
            .server
            .post(&format!("/api/courses/{}/sections", course_id))
            .add_header(name, value)
            .json(&json!({ "title": section }))
            .await
            .json();
        let section_id = section["id"].as_i64().unwrap();

        for (index, lesson) in lessons.into_iter().enumerate() {
            let (name, value) = bearer(token);
            let response = app
                .server
                .post(&format!("/api/sections/{}/lessons", section_id))
                .add_header(name, value)
                .json(&json!({
                    "title": lesson,
                    "video_url": "https://cdn.example.com/video.mp4",
                    "duration_seconds": 100,
                    "is_preview": lesson_ids.is_empty() && index == 0
                }))
                .await;
            assert_eq!(response.status_code(), StatusCode::CREATED);
            lesson_ids.push(response.json::<Value>()["id"].as_i64().unwrap());
        }
    }

    (course_id, lesson_ids)
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let app = setup_test_app().await?;

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["service"], "lectern");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "ok");
    assert!(body["version"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_auth_flow() -> Result<()> {
    let app = setup_test_app().await?;
    let (token, profile_id) = sign_up(&app.server, "learner@example.com").await;

    let (name, value) = bearer(&token);
    let response = app.server.get("/api/auth/session").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let profile: Value = response.json();
    assert_eq!(profile["id"], profile_id);
    assert!(profile.get("password_hash").is_none());

    // Duplicate email
    let response = app
        .server
        .post("/api/auth/signup")
        .json(&json!({
            "email": "LEARNER@example.com",
            "password": "password123",
            "full_name": "Again"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"], "CONFLICT");

    // Wrong password
    let response = app
        .server
        .post("/api/auth/signin")
        .json(&json!({ "email": "learner@example.com", "password": "nope-nope" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/api/auth/signin")
        .json(&json!({ "email": "learner@example.com", "password": "password123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Signing out invalidates the token
    let (name, value) = bearer(&token);
    let response = app.server.post("/api/auth/signout").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = bearer(&token);
    let response = app.server.get("/api/auth/session").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_protected_routes_require_session() -> Result<()> {
    let app = setup_test_app().await?;

    for path in ["/api/profile", "/api/enrollments", "/api/notes", "/api/files", "/api/conversations"] {
        let response = app.server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED, "{}", path);
        assert_eq!(response.json::<Value>()["error"], "UNAUTHORIZED");
    }

    Ok(())
}

#[tokio::test]
async fn test_profile_update() -> Result<()> {
    let app = setup_test_app().await?;
    let (token, _) = sign_up(&app.server, "profile@example.com").await;

    let (name, value) = bearer(&token);
    let response = app
        .server
        .put("/api/profile")
        .add_header(name, value)
        .json(&json!({ "full_name": "Renamed", "bio": "Learning Rust" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let profile: Value = response.json();
    assert_eq!(profile["full_name"], "Renamed");
    assert_eq!(profile["bio"], "Learning Rust");

    let (name, value) = bearer(&token);
    let response = app
        .server
        .put("/api/profile")
        .add_header(name, value)
        .json(&json!({ "full_name": "" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["fields"]["field"], "full_name");

    Ok(())
}

#[tokio::test]
async fn test_catalog_listing_and_outline() -> Result<()> {
    let app = setup_test_app().await?;
    let (author, _) = sign_up(&app.server, "author@example.com").await;

    // Students cannot author
    let (name, value) = bearer(&author);
    let response = app
        .server
        .post("/api/courses")
        .add_header(name, value)
        .json(&json!({ "title": "Nope", "category": "X", "level": "beginner" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    promote_to_instructor(&app.db, "author@example.com").await;
    let (course_id, lesson_ids) = create_course(&app, &author, "Rust for Testers").await;
    create_course(&app, &author, "Painting Basics").await;

    let response = app
        .server
        .get("/api/courses")
        .add_query_param("search", "rust")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let page: Value = response.json();
    assert_eq!(page["total"], 1);
    assert_eq!(page["page"], 1);
    assert_eq!(page["per_page"], 12);
    assert_eq!(page["items"][0]["slug"], "rust-for-testers");
    assert_eq!(page["items"][0]["lesson_count"], 3);
    assert_eq!(page["items"][0]["instructor_name"], "Test User");

    let page: Value = app
        .server
        .get("/api/courses")
        .add_query_param("sort", "title")
        .add_query_param("per_page", "1")
        .add_query_param("page", "2")
        .await
        .json();
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"][0]["title"], "Rust for Testers");

    let categories: Vec<String> = app.server.get("/api/courses/categories").await.json();
    assert_eq!(categories, vec!["Programming".to_string()]);

    // Outline by slug and by id
    let outline: Value = app.server.get("/api/courses/rust-for-testers").await.json();
    assert_eq!(outline["course"]["id"], course_id);
    assert_eq!(outline["sections"].as_array().unwrap().len(), 2);
    assert_eq!(outline["sections"][0]["lessons"][1]["id"], lesson_ids[1]);
    assert!(outline["sections"][0]["lessons"][0].get("video_url").is_none());

    let response = app.server.get(&format!("/api/courses/{}", course_id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app.server.get("/api/courses/does-not-exist").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_unpublished_course_visibility() -> Result<()> {
    let app = setup_test_app().await?;
    let (author, _) = sign_up(&app.server, "drafter@example.com").await;
    let (student, _) = sign_up(&app.server, "peeker@example.com").await;
    promote_to_instructor(&app.db, "drafter@example.com").await;
    let (course_id, _) = create_course(&app, &author, "Secret Draft").await;

    let (name, value) = bearer(&author);
    let response = app
        .server
        .put(&format!("/api/courses/{}", course_id))
        .add_header(name, value)
        .json(&json!({ "is_published": false }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let path = format!("/api/courses/{}", course_id);
    assert_eq!(app.server.get(&path).await.status_code(), StatusCode::NOT_FOUND);

    let (name, value) = bearer(&student);
    let response = app.server.get(&path).add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let (name, value) = bearer(&author);
    let response = app.server.get(&path).add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let page: Value = app.server.get("/api/courses").await.json();
    assert_eq!(page["total"], 0);

    // Progress routes hide the draft too
    for suffix in ["resume", "progress"] {
        let (name, value) = bearer(&student);
        let response = app
            .server
            .get(&format!("{}/{}", path, suffix))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{}", suffix);
    }
    let (name, value) = bearer(&student);
    let response = app
        .server
        .get("/api/courses/424242/progress")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // Another user cannot edit the course
    let (name, value) = bearer(&student);
    let response = app.server.delete(&path).add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn test_enrollment_and_lesson_player() -> Result<()> {
    let app = setup_test_app().await?;
    let (author, _) = sign_up(&app.server, "owner@example.com").await;
    promote_to_instructor(&app.db, "owner@example.com").await;
    let (course_id, lessons) = create_course(&app, &author, "Player Course").await;
    let (student, _) = sign_up(&app.server, "student@example.com").await;

    // Preview lesson is watchable without enrolling; others are not
    let (name, value) = bearer(&student);
    let response = app
        .server
        .get(&format!("/api/lessons/{}", lessons[0]))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let (name, value) = bearer(&student);
    let response = app
        .server
        .post(&format!("/api/lessons/{}/progress", lessons[1]))
        .add_header(name, value)
        .json(&json!({ "position_seconds": 10 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    for _ in 0..2 {
        let (name, value) = bearer(&student);
        let response = app
            .server
            .post(&format!("/api/courses/{}/enroll", course_id))
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let (name, value) = bearer(&student);
    let enrollments: Vec<Value> = app
        .server
        .get("/api/enrollments")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0]["progress"]["total_lessons"], 3);

    // Watching 95% completes the first lesson and points at the next one
    let (name, value) = bearer(&student);
    let update: Value = app
        .server
        .post(&format!("/api/lessons/{}/progress", lessons[0]))
        .add_header(name, value)
        .json(&json!({ "position_seconds": 95 }))
        .await
        .json();
    assert_eq!(update["progress"]["completed"], true);
    assert_eq!(update["next_lesson_id"], lessons[1]);
    assert_eq!(update["course_progress"]["percent"], 33);

    let (name, value) = bearer(&student);
    let resume: Value = app
        .server
        .get(&format!("/api/courses/{}/resume", course_id))
        .add_header(name, value)
        .await
        .json();
    assert_eq!(resume["lesson"]["id"], lessons[1]);

    // Next lesson crosses into the second section
    let (name, value) = bearer(&student);
    let view: Value = app
        .server
        .get(&format!("/api/lessons/{}", lessons[1]))
        .add_header(name, value)
        .await
        .json();
    assert_eq!(view["previous_lesson_id"], lessons[0]);
    assert_eq!(view["next_lesson_id"], lessons[2]);
    assert_eq!(view["lesson"]["video_url"], "https://cdn.example.com/video.mp4");

    for lesson in &lessons[1..] {
        let (name, value) = bearer(&student);
        app.server
            .post(&format!("/api/lessons/{}/progress", lesson))
            .add_header(name, value)
            .json(&json!({ "position_seconds": 0, "completed": true }))
            .await;
    }

    let (name, value) = bearer(&student);
    let progress: Value = app
        .server
        .get(&format!("/api/courses/{}/progress", course_id))
        .add_header(name, value)
        .await
        .json();
    assert_eq!(progress["completed_lessons"], 3);
    assert_eq!(progress["percent"], 100);

    let (name, value) = bearer(&student);
    let enrollments: Vec<Value> = app
        .server
        .get("/api/enrollments")
        .add_header(name, value)
        .await
        .json();
    assert!(enrollments[0]["completed_at"].is_string());

    let (name, value) = bearer(&student);
    let response = app
        .server
        .delete(&format!("/api/courses/{}/enroll", course_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn test_notes_crud() -> Result<()> {
    let app = setup_test_app().await?;
    let (author, _) = sign_up(&app.server, "notes-owner@example.com").await;
    promote_to_instructor(&app.db, "notes-owner@example.com").await;
    let (_, lessons) = create_course(&app, &author, "Notes Course").await;
    let (student, _) = sign_up(&app.server, "note-taker@example.com").await;
    let (other, _) = sign_up(&app.server, "snoop@example.com").await;

    let (name, value) = bearer(&student);
    let response = app
        .server
        .post("/api/notes")
        .add_header(name, value)
        .json(&json!({ "lesson_id": lessons[0], "body": "Remember this", "timestamp_seconds": 12 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let note_id = response.json::<Value>()["id"].as_i64().unwrap();

    let (name, value) = bearer(&student);
    let notes: Vec<Value> = app
        .server
        .get("/api/notes")
        .add_query_param("lesson_id", lessons[0])
        .add_header(name, value)
        .await
        .json();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["timestamp_seconds"], 12);

    let (name, value) = bearer(&other);
    let response = app
        .server
        .put(&format!("/api/notes/{}", note_id))
        .add_header(name, value)
        .json(&json!({ "body": "hijacked" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let (name, value) = bearer(&student);
    let response = app
        .server
        .post("/api/notes")
        .add_header(name, value)
        .json(&json!({ "lesson_id": lessons[0], "body": "x".repeat(5001) }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let (name, value) = bearer(&student);
    let response = app
        .server
        .delete(&format!("/api/notes/{}", note_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn test_file_upload_and_download() -> Result<()> {
    let app = setup_test_app().await?;
    let (token, _) = sign_up(&app.server, "uploader@example.com").await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"hello world".to_vec())
            .file_name("notes/../hello world.txt")
            .mime_type("text/plain"),
    );
    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/files")
        .add_header(name, value)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let stored: Value = response.json();
    assert_eq!(stored["file_name"], "hello_world.txt");
    assert_eq!(stored["content_type"], "text/plain");
    assert_eq!(stored["size_bytes"], 11);
    let url = stored["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/storage/"));

    let download = app.server.get(&url).await;
    assert_eq!(download.status_code(), StatusCode::OK);
    assert_eq!(download.text(), "hello world");

    // Over the configured 1 KiB limit
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![b'a'; 2048]).file_name("big.bin"),
    );
    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/files")
        .add_header(name, value)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let form = MultipartForm::new().add_text("other", "value");
    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/files")
        .add_header(name, value)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let (name, value) = bearer(&token);
    let files: Vec<Value> = app.server.get("/api/files").add_header(name, value).await.json();
    assert_eq!(files.len(), 1);

    let (name, value) = bearer(&token);
    let response = app
        .server
        .delete(&format!("/api/files/{}", stored["id"]))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(app.server.get(&url).await.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_conversations() -> Result<()> {
    let app = setup_test_app().await?;
    let (token, _) = sign_up(&app.server, "chatter@example.com").await;

    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/conversations")
        .add_header(name, value)
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let conversation: Value = response.json();
    assert_eq!(conversation["title"], "New chat");
    let id = conversation["id"].as_i64().unwrap();

    let (name, value) = bearer(&token);
    let turn: Value = app
        .server
        .post(&format!("/api/conversations/{}/messages", id))
        .add_header(name, value)
        .json(&json!({ "content": "What is ownership?" }))
        .await
        .json();
    assert_eq!(turn["reply"]["content"], "1 turns, last: What is ownership?");
    assert_eq!(turn["conversation"]["title"], "What is ownership?");

    // A failing relay keeps the user's message
    let (name, value) = bearer(&token);
    let response = app
        .server
        .post(&format!("/api/conversations/{}/messages", id))
        .add_header(name, value)
        .json(&json!({ "content": "please fail" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);

    let (name, value) = bearer(&token);
    let history: Value = app
        .server
        .get(&format!("/api/conversations/{}", id))
        .add_header(name, value)
        .await
        .json();
    let contents: Vec<&str> = history["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(
        contents,
        vec!["What is ownership?", "1 turns, last: What is ownership?", "please fail"]
    );

    let (name, value) = bearer(&token);
    let renamed: Value = app
        .server
        .put(&format!("/api/conversations/{}", id))
        .add_header(name, value)
        .json(&json!({ "title": "Ownership" }))
        .await
        .json();
    assert_eq!(renamed["title"], "Ownership");

    let (name, value) = bearer(&token);
    let response = app
        .server
        .delete(&format!("/api/conversations/{}", id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    Ok(())
}

#[tokio::test]
async fn test_chat_relay() -> Result<()> {
    let app = setup_test_app().await?;

    // No session needed
    let response = app
        .server
        .post("/api/chat")
        .json(&json!({
            "messages": [
                { "role": "user", "content": "Hi" },
                { "role": "assistant", "content": "Hello!" },
                { "role": "user", "content": "Explain traits" }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["content"], "3 turns, last: Explain traits");

    // Malformed body
    let response = app
        .server
        .post("/api/chat")
        .json(&json!({ "messages": "not a list" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());

    let response = app
        .server
        .post("/api/chat")
        .json(&json!({ "messages": [] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // Upstream failure
    let response = app
        .server
        .post("/api/chat")
        .json(&json!({ "messages": [{ "role": "user", "content": "make it fail" }] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .contains("stub failure"));

    Ok(())
}

#[tokio::test]
async fn test_chat_relay_cors_is_open() -> Result<()> {
    let app = setup_test_app().await?;

    let response = app
        .server
        .method(Method::OPTIONS, "/api/chat")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://elsewhere.example"),
        )
        .add_header(
            HeaderName::from_static("access-control-request-method"),
            HeaderValue::from_static("POST"),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("access-control-allow-origin"), "*");

    Ok(())
}
