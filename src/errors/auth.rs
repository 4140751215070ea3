//! Authentication error types
//!
//! Session and credential failures raised by the auth service. They collapse
//! into [`CoreError`] at the service boundary so handlers only deal with a
//! single error type.

use thiserror::Error;

use super::CoreError;

/// Authentication and authorisation errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    /// Missing bearer token
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("An account with this email already exists")]
    EmailExists,

    #[error("Insufficient permissions to {0}")]
    InsufficientPermissions(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl AuthError {
    /// Check if this is an authentication error (401)
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::SessionNotFound
                | AuthError::SessionExpired
                | AuthError::AuthenticationRequired
        )
    }
}

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(_) => CoreError::invalid_field("email", err.to_string()),
            AuthError::WeakPassword(_) => CoreError::invalid_field("password", err.to_string()),
            AuthError::EmailExists => CoreError::conflict(err.to_string()),
            AuthError::InsufficientPermissions(_) => CoreError::forbidden(err.to_string()),
            AuthError::Hashing(_) => CoreError::internal(err.to_string()),
            AuthError::Database(db_err) => {
                CoreError::internal("Database error").with_source(db_err)
            }
            other if other.is_authentication_error() => CoreError::unauthorized(other.to_string()),
            other => CoreError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreErrorKind;

    #[test]
    fn authentication_errors_become_unauthorized() {
        for err in [
            AuthError::InvalidCredentials,
            AuthError::SessionExpired,
            AuthError::SessionNotFound,
            AuthError::AuthenticationRequired,
        ] {
            assert!(err.is_authentication_error());
            assert_eq!(CoreError::from(err).kind(), CoreErrorKind::Unauthorized);
        }
    }

    #[test]
    fn signup_errors_map_to_client_errors() {
        let dup: CoreError = AuthError::EmailExists.into();
        assert_eq!(dup.kind(), CoreErrorKind::Conflict);

        let weak: CoreError = AuthError::WeakPassword("too short".into()).into();
        assert_eq!(weak.kind(), CoreErrorKind::Validation);
        assert_eq!(
            weak.fields().and_then(|f| f.get("field")).map(String::as_str),
            Some("password")
        );
    }
}
