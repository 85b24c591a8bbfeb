use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::json;

use chalani::auth::{hash_password, verify_password, TokenKind};
use chalani::domain::user::validate_password;
use chalani::domain::NewUser;
use chalani::store::StoreError;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::infra::AppState;

pub(crate) fn routes() -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/auth/verify-email", post(verify_email))
        .route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state
        .store
        .find_user_by_email(&payload.email)?
        .ok_or_else(invalid_credentials)?;
    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid_credentials());
    }
    if !user.is_active {
        return Err(ApiError::Unauthorized("account is deactivated".to_string()));
    }

    let pair = state.signer.issue_pair(&user);
    Ok(Json(json!({
        "access": pair.access,
        "refresh": pair.refresh,
        "user": user,
    })))
}

async fn signup(
    admin: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    admin.require_admin()?;
    payload.validate()?;

    let hash = hash_password(&payload.password);
    let user = state
        .store
        .create_user(&payload.email, &payload.name, payload.role, &hash)?;
    // No outbound mail; the verification token is handed back for manual
    // delivery.
    let verification_token = state
        .store
        .create_email_verification(user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": format!("User '{}' created successfully", user.email),
            "data": user,
            "verification_token": verification_token,
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh: String,
}

async fn logout(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claims = state.signer.decode(&payload.refresh, TokenKind::Refresh)?;
    let expires_at = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .unwrap_or_else(Utc::now);
    state.store.revoke_token(claims.jti, expires_at)?;
    // Opportunistic cleanup: blacklist rows past expiry can no longer
    // authenticate anyway.
    state.store.purge_expired_tokens()?;
    Ok(Json(json!({
        "status": "success",
        "message": "Logged out successfully",
    })))
}

async fn refresh(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let claims = state.signer.decode(&payload.refresh, TokenKind::Refresh)?;
    if state.store.is_token_revoked(claims.jti)? {
        return Err(ApiError::Unauthorized("token has been revoked".to_string()));
    }

    let user = state.store.get_user(claims.sub).map_err(|err| match err {
        StoreError::NotFound => ApiError::Unauthorized("account no longer exists".to_string()),
        other => ApiError::Store(other),
    })?;
    if !user.is_active {
        return Err(ApiError::Unauthorized("account is deactivated".to_string()));
    }

    // Rotation: the presented refresh token is retired with the old pair.
    let expires_at = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .unwrap_or_else(Utc::now);
    state.store.revoke_token(claims.jti, expires_at)?;

    let pair = state.signer.issue_pair(&user);
    Ok(Json(json!({
        "access": pair.access,
        "refresh": pair.refresh,
    })))
}

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

async fn change_password(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = user.0;
    if !verify_password(&payload.old_password, &user.password_hash)? {
        return Err(ApiError::BadRequest("old password is incorrect".to_string()));
    }
    validate_password(&payload.new_password)?;

    let hash = hash_password(&payload.new_password);
    state.store.set_user_password(user.id, &hash)?;

    let pair = state.signer.issue_pair(&user);
    Ok(Json(json!({
        "status": "success",
        "message": "Password changed successfully",
        "access": pair.access,
        "refresh": pair.refresh,
    })))
}

#[derive(Debug, Deserialize)]
struct ResetPasswordRequest {
    #[allow(dead_code)]
    email: String,
}

/// Always answers the same way so account existence cannot be probed.
async fn reset_password(
    Json(_payload): Json<ResetPasswordRequest>,
) -> Json<serde_json::Value> {
    Json(json!({
        "status": "success",
        "message": "If the account exists, password reset instructions have been issued",
    }))
}

#[derive(Debug, Deserialize)]
struct VerifyEmailRequest {
    token: String,
}

async fn verify_email(
    Extension(state): Extension<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.verify_email_token(&payload.token).map_err(|err| match err {
        StoreError::NotFound => {
            ApiError::BadRequest("verification token is invalid or expired".to_string())
        }
        other => ApiError::Store(other),
    })?;
    Ok(Json(json!({
        "status": "success",
        "message": "Email verified successfully",
    })))
}

async fn me(user: AuthUser) -> Json<serde_json::Value> {
    Json(json!({ "user": user.0 }))
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("invalid email or password".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::{body_json, request, test_state, token_for};
    use axum::body::Body;
    use axum::http::Request;
    use chalani::domain::UserRole;
    use tower::ServiceExt;

    #[tokio::test]
    async fn login_round_trip_and_me() {
        let (app, state) = test_state();
        let hash = hash_password("s3cure-pass");
        state
            .store
            .create_user("sita@nea.org.np", "Sita", UserRole::Viewer, &hash)
            .unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": "sita@nea.org.np", "password": "s3cure-pass" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let access = body["access"].as_str().unwrap().to_string();
        assert_eq!(body["user"]["email"], "sita@nea.org.np");
        assert!(body["user"]["password_hash"].is_null());

        let response = app
            .oneshot(request("GET", "/api/auth/me", Some(&access), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["user"]["role"], "viewer");
    }

    #[tokio::test]
    async fn login_rejects_bad_password_and_inactive_accounts() {
        let (app, state) = test_state();
        let hash = hash_password("s3cure-pass");
        let user = state
            .store
            .create_user("sita@nea.org.np", "Sita", UserRole::Viewer, &hash)
            .unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": "sita@nea.org.np", "password": "wrong" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        state
            .store
            .update_user(user.id, "Sita", UserRole::Viewer, false)
            .unwrap();
        let response = app
            .oneshot(request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": "sita@nea.org.np", "password": "s3cure-pass" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_replay() {
        let (app, state) = test_state();
        let hash = hash_password("s3cure-pass");
        let user = state
            .store
            .create_user("admin@nea.org.np", "Admin", UserRole::Admin, &hash)
            .unwrap();
        let pair = state.signer.issue_pair(&user);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/refresh",
                None,
                Some(json!({ "refresh": pair.refresh })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["access"].as_str().is_some());

        // The old refresh token was revoked by the rotation.
        let response = app
            .oneshot(request(
                "POST",
                "/api/auth/refresh",
                None,
                Some(json!({ "refresh": pair.refresh })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_revokes_and_purges_stale_blacklist_rows() {
        let (app, state) = test_state();
        let hash = hash_password("s3cure-pass");
        let user = state
            .store
            .create_user("admin@nea.org.np", "Admin", UserRole::Admin, &hash)
            .unwrap();
        let pair = state.signer.issue_pair(&user);

        // A long-expired revocation left over from an earlier session.
        let stale_jti = uuid::Uuid::new_v4();
        state
            .store
            .revoke_token(stale_jti, chrono::Utc::now() - chrono::Duration::days(30))
            .unwrap();
        assert!(state.store.is_token_revoked(stale_jti).unwrap());

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/logout",
                None,
                Some(json!({ "refresh": pair.refresh })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // The stale row was purged; the fresh revocation still holds.
        assert!(!state.store.is_token_revoked(stale_jti).unwrap());
        let response = app
            .oneshot(request(
                "POST",
                "/api/auth/refresh",
                None,
                Some(json!({ "refresh": pair.refresh })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signup_requires_admin() {
        let (app, state) = test_state();
        let viewer = token_for(&state, UserRole::Viewer);
        let body = json!({
            "email": "new@nea.org.np",
            "name": "New User",
            "password": "s3cure-pass",
            "password_confirm": "s3cure-pass",
            "role": "viewer",
        });

        let response = app
            .clone()
            .oneshot(request("POST", "/api/auth/signup", Some(&viewer), Some(body.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin = token_for(&state, UserRole::Admin);
        let response = app
            .oneshot(request("POST", "/api/auth/signup", Some(&admin), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert!(body["verification_token"].as_str().is_some());
    }

    #[tokio::test]
    async fn unauthenticated_me_is_rejected() {
        let (app, _state) = test_state();
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
