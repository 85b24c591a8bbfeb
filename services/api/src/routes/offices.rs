use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;

use chalani::domain::{Office, OfficePayload, RecordStatus};
use chalani::export;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::infra::AppState;
use crate::routes::{csv_attachment, paginate, record_status_filter, with_serial_numbers, ListQuery, Page};

pub(crate) fn routes() -> Router {
    Router::new()
        .route("/api/offices", get(list).post(create))
        .route("/api/offices/export_csv", get(export_csv))
        .route("/api/offices/all-active", get(all_active))
        .route("/api/offices/:id", get(retrieve).put(update).delete(destroy))
        .route("/api/offices/:id/restore", post(restore))
}

async fn list(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page>, ApiError> {
    let status = record_status_filter(query.status.as_deref())?;
    let offices = state.store.list_offices(status)?;
    Ok(Json(paginate(
        "/api/offices",
        &query,
        with_serial_numbers(&offices),
    )))
}

async fn create(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<OfficePayload>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    payload.validate()?;
    let office = state.store.create_office(&payload)?;
    Ok((StatusCode::CREATED, Json(created_body(&office))))
}

async fn retrieve(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Office>, ApiError> {
    Ok(Json(state.store.get_office(id)?))
}

async fn update(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<OfficePayload>,
) -> Result<Json<Office>, ApiError> {
    user.require_admin()?;
    payload.validate()?;
    Ok(Json(state.store.update_office(id, &payload)?))
}

async fn destroy(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let office = state.store.set_office_status(id, RecordStatus::Bin)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Office '{}' moved to bin", office.name),
        "id": office.id,
    })))
}

async fn restore(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let office = state.store.get_office(id)?;
    if office.status != RecordStatus::Bin {
        return Err(ApiError::BadRequest(format!(
            "Office '{}' is not in the bin",
            office.name
        )));
    }
    let office = state.store.set_office_status(id, RecordStatus::Active)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Office '{}' restored", office.name),
        "data": office,
    })))
}

async fn export_csv(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let status = record_status_filter(query.status.as_deref())?;
    let offices = state.store.list_offices(status)?;
    let bytes = export::offices_csv(&offices)?;
    Ok(csv_attachment(
        &export::timestamped_filename("offices_export"),
        bytes,
    ))
}

async fn all_active(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let offices = state.store.list_offices(Some(RecordStatus::Active))?;
    Ok(Json(json!({
        "status": "success",
        "message": "All active offices retrieved successfully",
        "data": with_serial_numbers(&offices),
    })))
}

fn created_body(office: &Office) -> serde_json::Value {
    json!({
        "status": "success",
        "message": format!("Office '{}' created successfully", office.name),
        "data": office,
    })
}
