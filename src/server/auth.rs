//! Session extractors for handlers
//!
//! Clients send `Authorization: Bearer <token>` with the token returned by
//! sign-up or sign-in.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::database::entities::profiles;
use crate::errors::{AuthError, CoreError};
use crate::server::app::AppState;

/// Raw bearer token of the request
pub struct SessionToken(pub String);

/// Profile behind a valid session; rejects with 401 otherwise
pub struct CurrentUser(pub profiles::Model);

/// Like [`CurrentUser`] but anonymous requests (and stale tokens) get `None`
pub struct OptionalUser(pub Option<profiles::Model>);

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for SessionToken {
    type Rejection = CoreError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        bearer_token(parts)
            .map(SessionToken)
            .ok_or_else(|| AuthError::AuthenticationRequired.into())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = CoreError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let SessionToken(token) = SessionToken::from_request_parts(parts, state).await?;
        let profile = state.auth.resolve_session(&token).await?;
        Ok(CurrentUser(profile))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = CoreError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(OptionalUser(None));
        };

        match state.auth.resolve_session(&token).await {
            Ok(profile) => Ok(OptionalUser(Some(profile))),
            Err(err) if err.kind() == crate::errors::CoreErrorKind::Unauthorized => {
                Ok(OptionalUser(None))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/profile");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))).as_deref(), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("bearer  abc "))).as_deref(), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
