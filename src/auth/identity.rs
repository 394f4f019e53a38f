//! Request identity extractors.
//!
//! `Identity` rejects with 401, `MaybeIdentity` falls back to anonymous when
//! the token is missing or invalid, and `AdminIdentity` is the role-checked
//! admin gate (401 unauthenticated, 403 wrong role). Authorization always
//! re-derives the user from the token; nothing client-supplied is trusted.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::verify_token;
use crate::config;
use crate::error::ApiError;
use crate::repositories::users;

pub const ADMIN_ROLE: &str = "admin";

/// The resolved identity behind a validated bearer token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Optional identity for routes that serve anonymous callers too.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

/// Identity that must carry the admin role.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header"))?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use Bearer token"))?
        .trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized("Empty bearer token"));
    }
    Ok(token)
}

async fn resolve(headers: &HeaderMap, pool: &PgPool) -> Result<Identity, ApiError> {
    let token = bearer_token(headers)?;
    let claims = verify_token(token, &config::config().security.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    // Resolve the full user record so the identity reflects current state,
    // not whatever the token was minted with.
    let user = users::find_by_id(pool, claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;

    Ok(Identity {
        user_id: user.id,
        email: user.email,
        role: user.role,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    PgPool: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = PgPool::from_ref(state);
        resolve(&parts.headers, &pool).await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
    PgPool: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = PgPool::from_ref(state);
        // Silent fallback: a bad or missing token means anonymous, not an error
        Ok(MaybeIdentity(resolve(&parts.headers, &pool).await.ok()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminIdentity
where
    S: Send + Sync,
    PgPool: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = PgPool::from_ref(state);
        let identity = resolve(&parts.headers, &pool).await?;
        if !identity.is_admin() {
            return Err(ApiError::forbidden("Forbidden"));
        }
        Ok(AdminIdentity(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")).unwrap(), "abc.def");
        assert!(bearer_token(&HeaderMap::new()).is_err());
        assert!(bearer_token(&headers_with("Basic abc")).is_err());
        assert!(bearer_token(&headers_with("Bearer ")).is_err());
    }

    #[test]
    fn admin_check_is_exact() {
        let identity = Identity {
            user_id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            role: "user".to_string(),
        };
        assert!(!identity.is_admin());
        let admin = Identity {
            role: ADMIN_ROLE.to_string(),
            ..identity
        };
        assert!(admin.is_admin());
    }
}
