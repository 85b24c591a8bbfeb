use axum::extract::Path;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use chalani::domain::{User, UserRole};

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::infra::AppState;
use crate::routes::with_serial_numbers;

pub(crate) fn routes() -> Router {
    Router::new()
        .route("/api/users", get(list))
        .route("/api/users/:id", get(retrieve).put(update).delete(destroy))
}

async fn list(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let users = state.store.list_users()?;
    Ok(Json(json!({
        "status": "success",
        "count": users.len(),
        "results": with_serial_numbers(&users),
    })))
}

async fn retrieve(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.store.get_user(id)?))
}

#[derive(Debug, Deserialize)]
struct UpdateUserRequest {
    name: String,
    role: UserRole,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

async fn update(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    user.require_admin()?;
    let updated = state
        .store
        .update_user(id, &payload.name, payload.role, payload.is_active)?;
    Ok(Json(updated))
}

async fn destroy(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let target = state.store.get_user(id)?;
    state.store.delete_user(id)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("User '{}' deleted successfully", target.email),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::{body_json, request, test_state, token_for};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn admin_deactivates_and_deletes_accounts() {
        let (app, state) = test_state();
        let admin = token_for(&state, UserRole::Admin);
        let viewer_token = token_for(&state, UserRole::Viewer);
        let viewer = state
            .store
            .list_users()
            .unwrap()
            .into_iter()
            .find(|u| u.role == UserRole::Viewer)
            .unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/api/users/{}", viewer.id),
                Some(&admin),
                Some(json!({ "name": "Viewer", "role": "viewer", "is_active": false })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["is_active"], false);

        // A deactivated account's tokens stop working.
        let response = app
            .clone()
            .oneshot(request("GET", "/api/auth/me", Some(&viewer_token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("/api/users/{}", viewer.id),
                Some(&admin),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/users/{}", viewer.id),
                Some(&admin),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn viewer_cannot_update_accounts() {
        let (app, state) = test_state();
        let viewer_token = token_for(&state, UserRole::Viewer);
        let viewer = state
            .store
            .list_users()
            .unwrap()
            .into_iter()
            .next()
            .unwrap();

        let response = app
            .oneshot(request(
                "PUT",
                &format!("/api/users/{}", viewer.id),
                Some(&viewer_token),
                Some(json!({ "name": "Hacked", "role": "admin" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
