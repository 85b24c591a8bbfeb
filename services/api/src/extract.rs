use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chalani::auth::TokenKind;
use chalani::domain::User;
use chalani::store::StoreError;

use crate::error::ApiError;
use crate::infra::AppState;

/// Authenticated caller, resolved from the `Authorization: Bearer` header.
/// Verifies the access token and loads the live account so deactivations
/// take effect immediately.
pub(crate) struct AuthUser(pub(crate) User);

impl AuthUser {
    pub(crate) fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = parts
            .extensions
            .get::<AppState>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("service state unavailable".to_string()))?;

        let token = bearer_token(parts)?;
        let claims = state.signer.decode(token, TokenKind::Access)?;
        let user = state.store.get_user(claims.sub).map_err(|err| match err {
            StoreError::NotFound => {
                ApiError::Unauthorized("account no longer exists".to_string())
            }
            other => ApiError::Store(other),
        })?;
        if !user.is_active {
            return Err(ApiError::Unauthorized("account is deactivated".to_string()));
        }
        Ok(AuthUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("invalid authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("expected a bearer token".to_string()))
}
