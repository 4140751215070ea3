use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::database::entities::{profiles, user_sessions};
use crate::errors::{AuthError, AuthResult, CoreResult};
use crate::services::ValidationService;

const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// A signed-in session handed back to the client
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthSession {
    pub token: String,
    #[schema(value_type = String)]
    pub expires_at: DateTime<Utc>,
    #[schema(value_type = Object)]
    pub profile: profiles::Model,
}

/// Service for sign-up, sign-in and session resolution
#[derive(Clone)]
pub struct AuthService {
    db: DatabaseConnection,
    session_ttl: Duration,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            hash_cost: DEFAULT_COST,
        }
    }

    pub fn with_session_ttl_hours(mut self, hours: i64) -> Self {
        self.session_ttl = Duration::hours(hours.max(1));
        self
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Hash a password using bcrypt
    pub fn hash_password(password: &str, cost: u32) -> AuthResult<String> {
        Self::validate_password(password)?;
        hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
        verify(password, hash).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    pub fn validate_password(password: &str) -> AuthResult<()> {
        if password.is_empty() {
            return Err(AuthError::WeakPassword("password cannot be empty".into()));
        }

        if password.chars().count() < 8 {
            return Err(AuthError::WeakPassword(
                "must be at least 8 characters long".into(),
            ));
        }

        Ok(())
    }

    /// Validate email format
    pub fn validate_email(email: &str) -> AuthResult<()> {
        if email.is_empty() {
            return Err(AuthError::InvalidEmail("email cannot be empty".into()));
        }

        if email.len() > 254 {
            return Err(AuthError::InvalidEmail("email is too long".into()));
        }

        let (local_part, domain_part) = match email.split_once('@') {
            Some(parts) if !parts.1.contains('@') => parts,
            _ => {
                return Err(AuthError::InvalidEmail(
                    "must contain exactly one @".into(),
                ))
            }
        };

        if local_part.is_empty() || domain_part.is_empty() {
            return Err(AuthError::InvalidEmail(
                "local and domain parts are required".into(),
            ));
        }

        if !domain_part.contains('.') || domain_part.starts_with('.') || domain_part.ends_with('.')
        {
            return Err(AuthError::InvalidEmail(
                "domain must contain a dot and cannot start or end with one".into(),
            ));
        }

        if email.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidEmail("email cannot contain spaces".into()));
        }

        Ok(())
    }

    /// Check if session is expired
    pub fn is_session_expired(expires_at: DateTime<Utc>) -> bool {
        Utc::now() > expires_at
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> CoreResult<AuthSession> {
        let email = email.trim().to_lowercase();
        Self::validate_email(&email)?;
        let full_name = ValidationService::required_text("full_name", full_name, 100)?;
        let password_hash = Self::hash_password(password, self.hash_cost)?;

        let existing = profiles::Entity::find()
            .filter(profiles::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await
            .map_err(AuthError::from)?;
        if existing.is_some() {
            return Err(AuthError::EmailExists.into());
        }

        let now = Utc::now();
        let profile = profiles::ActiveModel {
            email: Set(email),
            password_hash: Set(password_hash),
            full_name: Set(full_name),
            role: Set(profiles::ROLE_STUDENT.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(AuthError::from)?;

        tracing::info!(profile_id = profile.id, "Profile created");
        Ok(self.start_session(profile).await?)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> CoreResult<AuthSession> {
        let email = email.trim().to_lowercase();

        let profile = profiles::Entity::find()
            .filter(profiles::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !Self::verify_password(password, &profile.password_hash)? {
            tracing::debug!(profile_id = profile.id, "Rejected sign-in");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(self.start_session(profile).await?)
    }

    /// Remove a session. Unknown tokens are ignored.
    pub async fn sign_out(&self, token: &str) -> CoreResult<()> {
        user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::SessionId.eq(token))
            .exec(&self.db)
            .await
            .map_err(AuthError::from)?;
        Ok(())
    }

    /// Look up the profile behind a session token
    pub async fn resolve_session(&self, token: &str) -> CoreResult<profiles::Model> {
        let session = user_sessions::Entity::find()
            .filter(user_sessions::Column::SessionId.eq(token))
            .one(&self.db)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::SessionNotFound)?;

        if Self::is_session_expired(session.expires_at) {
            user_sessions::Entity::delete_by_id(session.id)
                .exec(&self.db)
                .await
                .map_err(AuthError::from)?;
            return Err(AuthError::SessionExpired.into());
        }

        let profile = profiles::Entity::find_by_id(session.profile_id)
            .one(&self.db)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::SessionNotFound)?;

        Ok(profile)
    }

    /// Delete every expired session, returning how many were removed
    pub async fn purge_expired_sessions(&self) -> CoreResult<u64> {
        let result = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await
            .map_err(AuthError::from)?;
        Ok(result.rows_affected)
    }

    async fn start_session(&self, profile: profiles::Model) -> AuthResult<AuthSession> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        let token = Uuid::new_v4().to_string();

        user_sessions::ActiveModel {
            session_id: Set(token.clone()),
            profile_id: Set(profile.id),
            expires_at: Set(expires_at),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(AuthSession {
            token,
            expires_at,
            profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::{setup_test_db, TEST_HASH_COST};
    use crate::errors::CoreErrorKind;

    fn service(db: DatabaseConnection) -> AuthService {
        AuthService::new(db).with_hash_cost(TEST_HASH_COST)
    }

    #[test]
    fn test_password_hashing() {
        let hash = AuthService::hash_password("test_password_123", TEST_HASH_COST)
            .expect("Failed to hash password");

        assert!(AuthService::verify_password("test_password_123", &hash).unwrap());
        assert!(!AuthService::verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_password_validation() {
        assert!(AuthService::validate_password("short").is_err());
        assert!(AuthService::validate_password("").is_err());
        assert!(AuthService::validate_password("valid_password").is_ok());
    }

    #[test]
    fn test_email_validation() {
        assert!(AuthService::validate_email("test@example.com").is_ok());
        assert!(AuthService::validate_email("user.name+tag@domain.co.uk").is_ok());

        assert!(AuthService::validate_email("").is_err());
        assert!(AuthService::validate_email("notanemail").is_err());
        assert!(AuthService::validate_email("@example.com").is_err());
        assert!(AuthService::validate_email("test@").is_err());
        assert!(AuthService::validate_email("a@b@c.com").is_err());
        assert!(AuthService::validate_email("test@.com").is_err());
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let db = setup_test_db().await;
        let auth = service(db);

        let created = auth
            .sign_up("Ada@Example.com", "correct horse", "Ada Lovelace")
            .await
            .unwrap();
        assert_eq!(created.profile.email, "ada@example.com");
        assert_eq!(created.profile.role, profiles::ROLE_STUDENT);

        let session = auth.sign_in("ada@example.com", "correct horse").await.unwrap();
        assert_ne!(session.token, created.token);

        let profile = auth.resolve_session(&session.token).await.unwrap();
        assert_eq!(profile.id, created.profile.id);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let db = setup_test_db().await;
        let auth = service(db);

        auth.sign_up("dup@example.com", "password1", "One").await.unwrap();
        let err = auth
            .sign_up("DUP@example.com", "password2", "Two")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Conflict);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let db = setup_test_db().await;
        let auth = service(db);
        auth.sign_up("me@example.com", "password1", "Me").await.unwrap();

        let wrong = auth.sign_in("me@example.com", "password2").await.unwrap_err();
        let unknown = auth.sign_in("nobody@example.com", "password1").await.unwrap_err();

        assert_eq!(wrong.kind(), CoreErrorKind::Unauthorized);
        assert_eq!(wrong.message(), unknown.message());
    }

    #[tokio::test]
    async fn sign_out_invalidates_token() {
        let db = setup_test_db().await;
        let auth = service(db);
        let session = auth.sign_up("out@example.com", "password1", "Out").await.unwrap();

        auth.sign_out(&session.token).await.unwrap();
        auth.sign_out(&session.token).await.unwrap();

        let err = auth.resolve_session(&session.token).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected_and_purged() {
        let db = setup_test_db().await;
        let auth = service(db.clone());
        let session = auth.sign_up("old@example.com", "password1", "Old").await.unwrap();

        let stored = user_sessions::Entity::find()
            .filter(user_sessions::Column::SessionId.eq(session.token.as_str()))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let mut stale: user_sessions::ActiveModel = stored.into();
        stale.expires_at = Set(Utc::now() - Duration::hours(1));
        stale.update(&db).await.unwrap();

        let err = auth.resolve_session(&session.token).await.unwrap_err();
        assert_eq!(err.message(), "Session expired");
        assert_eq!(auth.purge_expired_sessions().await.unwrap(), 0);
    }
}
