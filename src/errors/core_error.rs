use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sea_orm::SqlErr;
use serde_json::json;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoreErrorKind {
    NotFound,
    Validation,
    Conflict,
    Forbidden,
    Unauthorized,
    Unavailable,
    Internal,
}

impl CoreErrorKind {
    /// Stable machine-readable code returned to API clients
    pub fn code(&self) -> &'static str {
        match self {
            CoreErrorKind::NotFound => "NOT_FOUND",
            CoreErrorKind::Validation => "VALIDATION_FAILED",
            CoreErrorKind::Conflict => "CONFLICT",
            CoreErrorKind::Forbidden => "FORBIDDEN",
            CoreErrorKind::Unauthorized => "UNAUTHORIZED",
            CoreErrorKind::Unavailable => "SERVICE_ERROR",
            CoreErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CoreErrorKind::NotFound => StatusCode::NOT_FOUND,
            CoreErrorKind::Validation => StatusCode::BAD_REQUEST,
            CoreErrorKind::Conflict => StatusCode::CONFLICT,
            CoreErrorKind::Forbidden => StatusCode::FORBIDDEN,
            CoreErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            CoreErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            CoreErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct CoreError {
    kind: CoreErrorKind,
    message: String,
    fields: Option<BTreeMap<String, String>>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            source: None,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("entity".to_string(), entity.into());
        fields.insert("id".to_string(), id.into());

        Self {
            kind: CoreErrorKind::NotFound,
            message: "Resource not found".to_string(),
            fields: Some(fields),
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Validation, message)
    }

    /// Validation failure tied to a single input field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("field".to_string(), field.into());
        Self::new(CoreErrorKind::Validation, message).with_fields(fields)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Conflict, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Forbidden, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Unauthorized, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Internal, message)
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> CoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        self.fields.as_ref()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        let mut core = CoreError::internal("Unhandled error");
        core.source = Some(err.into());
        core
    }
}

impl From<sea_orm::DbErr> for CoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                CoreError::conflict("Record already exists").with_source(err)
            }
            _ => CoreError::internal("Database error").with_source(err),
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.kind.status();

        if status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(error = %self, source = %source, "Request failed"),
                None => tracing::error!(error = %self, "Request failed"),
            }
        }

        let body = json!({
            "error": self.kind.code(),
            "message": self.message,
            "fields": self.fields,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_http_statuses() {
        assert_eq!(CoreError::validation("bad").kind().status(), StatusCode::BAD_REQUEST);
        assert_eq!(CoreError::conflict("dup").kind().status(), StatusCode::CONFLICT);
        assert_eq!(CoreError::forbidden("no").kind().status(), StatusCode::FORBIDDEN);
        assert_eq!(
            CoreError::unauthorized("who").kind().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CoreError::unavailable("down").kind().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            CoreError::internal("boom").kind().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_carries_entity_and_id() {
        let err = CoreError::not_found("Course", "7");
        assert_eq!(err.kind().code(), "NOT_FOUND");
        let fields = err.fields().expect("fields");
        assert_eq!(fields.get("entity").map(String::as_str), Some("Course"));
        assert_eq!(fields.get("id").map(String::as_str), Some("7"));
    }

    #[tokio::test]
    async fn unique_violations_become_conflicts() {
        use chrono::Utc;
        use sea_orm::{ActiveModelTrait, Set};

        use crate::database::entities::profiles;
        use crate::database::test_utils::setup_test_db;

        let db = setup_test_db().await;
        let profile = || {
            let now = Utc::now();
            profiles::ActiveModel {
                email: Set("same@example.com".into()),
                password_hash: Set("unused".into()),
                full_name: Set("Same".into()),
                role: Set(profiles::ROLE_STUDENT.into()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
        };

        profile().insert(&db).await.unwrap();
        let err = CoreError::from(profile().insert(&db).await.unwrap_err());

        assert_eq!(err.kind(), CoreErrorKind::Conflict);
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn into_response_uses_kind_status() {
        let response = CoreError::invalid_field("title", "Title is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
