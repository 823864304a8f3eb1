//! Session tokens issued by the external auth provider.
//!
//! Tokens are HS256 JWTs carrying the user (`sub`) and tenant (`org`). They
//! arrive either as `Authorization: Bearer <jwt>` or in the
//! [`SESSION_COOKIE`] cookie. The decoded identity is attached to the request
//! as a [`RequestContext`] extension.

use std::{collections::HashSet, sync::Arc};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, Cookie, HeaderMapExt, authorization::Bearer};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const SESSION_COOKIE: &str = "planner_session";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing session token")]
    MissingToken,
    #[error("invalid session token")]
    InvalidToken,
    #[error("session expired")]
    Expired,
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: Uuid,
    /// Organization (tenant) id
    pub org: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Identity of the caller for the current request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionVerifier {
    secret: Arc<SecretString>,
}

impl SessionVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret: Arc::new(secret),
        }
    }

    /// Sign a session token. The auth provider does this in production; the
    /// server uses it for tests and local tooling.
    pub fn issue(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id,
            org: organization_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
    }

    pub fn verify(&self, token: &str) -> Result<RequestContext, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from([
            "sub".to_string(),
            "exp".to_string(),
            "org".to_string(),
        ]);
        validation.leeway = 30;

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let claims = match decode::<SessionClaims>(token, &key, &validation) {
            Ok(data) => data.claims,
            Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
                return Err(AuthError::Expired);
            }
            Err(err) => return Err(err.into()),
        };

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?;

        Ok(RequestContext {
            user_id: claims.sub,
            organization_id: claims.org,
            expires_at,
        })
    }
}

/// Pull the session token from the bearer header, falling back to the cookie.
fn session_token(req: &Request<Body>) -> Option<String> {
    if let Some(Authorization(bearer)) = req.headers().typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_owned());
    }
    req.headers()
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_owned))
}

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = session_token(&req) else {
        return ApiError::Unauthorized(AuthError::MissingToken).into_response();
    };

    let ctx = match state.sessions.verify(&token) {
        Ok(ctx) => ctx,
        Err(err) => {
            debug!(?err, "session token rejected");
            return ApiError::Unauthorized(err).into_response();
        }
    };

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> SessionVerifier {
        SessionVerifier::new(SecretString::from("test-secret"))
    }

    #[test]
    fn test_issue_and_verify() {
        let user = Uuid::new_v4();
        let org = Uuid::new_v4();
        let token = verifier().issue(user, org, Duration::hours(1)).unwrap();

        let ctx = verifier().verify(&token).unwrap();
        assert_eq!(ctx.user_id, user);
        assert_eq!(ctx.organization_id, org);
        assert!(ctx.expires_at > Utc::now());
    }

    #[test]
    fn test_expired_token() {
        let token = verifier()
            .issue(Uuid::new_v4(), Uuid::new_v4(), Duration::hours(-2))
            .unwrap();
        assert!(matches!(verifier().verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = SessionVerifier::new(SecretString::from("other"))
            .issue(Uuid::new_v4(), Uuid::new_v4(), Duration::hours(1))
            .unwrap();
        assert!(matches!(verifier().verify(&token), Err(AuthError::Jwt(_))));
    }

    #[test]
    fn test_blank_token() {
        assert!(matches!(verifier().verify("  "), Err(AuthError::MissingToken)));
        assert!(matches!(verifier().verify("not.a.jwt"), Err(AuthError::Jwt(_))));
    }
}
