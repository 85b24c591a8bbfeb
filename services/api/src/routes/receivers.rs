use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

use chalani::domain::{Receiver, ReceiverPayload};
use chalani::export;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::infra::AppState;
use crate::routes::{csv_attachment, paginate, with_serial_numbers, ListQuery, Page};

// Receivers are a plain directory: no bin status, deletes are hard.
pub(crate) fn routes() -> Router {
    Router::new()
        .route("/api/receivers", get(list).post(create))
        .route("/api/receivers/export_csv", get(export_csv))
        .route("/api/receivers/all-active", get(all_active))
        .route(
            "/api/receivers/:id",
            get(retrieve).put(update).delete(destroy),
        )
}

async fn list(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page>, ApiError> {
    let receivers = state.store.list_receivers()?;
    Ok(Json(paginate(
        "/api/receivers",
        &query,
        with_serial_numbers(&receivers),
    )))
}

async fn create(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReceiverPayload>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    payload.validate()?;
    let receiver = state.store.create_receiver(&payload)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": format!("Receiver '{}' created successfully", receiver.name),
            "data": receiver,
        })),
    ))
}

async fn retrieve(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Receiver>, ApiError> {
    Ok(Json(state.store.get_receiver(id)?))
}

async fn update(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ReceiverPayload>,
) -> Result<Json<Receiver>, ApiError> {
    user.require_admin()?;
    payload.validate()?;
    Ok(Json(state.store.update_receiver(id, &payload)?))
}

async fn destroy(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let receiver = state.store.get_receiver(id)?;
    state.store.delete_receiver(id)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Receiver '{}' deleted successfully", receiver.name),
        "id": id,
    })))
}

async fn export_csv(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Response, ApiError> {
    let receivers = state.store.list_receivers()?;
    let bytes = export::receivers_csv(&receivers)?;
    Ok(csv_attachment(
        &export::timestamped_filename("receivers_export"),
        bytes,
    ))
}

async fn all_active(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let receivers = state.store.list_receivers()?;
    Ok(Json(json!({
        "status": "success",
        "message": "All receivers retrieved successfully",
        "data": with_serial_numbers(&receivers),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::{body_json, request, test_state, token_for};
    use chalani::domain::UserRole;
    use tower::ServiceExt;

    #[tokio::test]
    async fn create_normalizes_devanagari_digits() {
        let (app, state) = test_state();
        let admin = token_for(&state, UserRole::Admin);

        let response = app
            .oneshot(request(
                "POST",
                "/api/receivers",
                Some(&admin),
                Some(json!({
                    "name": "Gopal Thapa",
                    "id_card_type": "citizenship",
                    "id_card_number": "१२३४५",
                    "phone_number": "९८४१२३४५६७",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["id_card_number"], "12345");
        assert_eq!(body["data"]["phone_number"], "9841234567");
        assert_eq!(body["data"]["post"], "UNKNOWN");
    }

    #[tokio::test]
    async fn delete_is_hard() {
        let (app, state) = test_state();
        let admin = token_for(&state, UserRole::Admin);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/receivers",
                Some(&admin),
                Some(json!({ "name": "Gopal Thapa" })),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["data"]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("/api/receivers/{id}"),
                Some(&admin),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(
                "GET",
                &format!("/api/receivers/{id}"),
                Some(&admin),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
