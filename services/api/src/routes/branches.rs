use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;

use chalani::domain::{Branch, BranchPayload, RecordStatus};
use chalani::export;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::infra::AppState;
use crate::routes::{csv_attachment, paginate, record_status_filter, with_serial_numbers, ListQuery, Page};

pub(crate) fn routes() -> Router {
    Router::new()
        .route("/api/branches", get(list).post(create))
        .route("/api/branches/export_csv", get(export_csv))
        .route("/api/branches/all-active", get(all_active))
        .route("/api/branches/:id", get(retrieve).put(update).delete(destroy))
        .route("/api/branches/:id/restore", post(restore))
}

async fn list(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page>, ApiError> {
    let status = record_status_filter(query.status.as_deref())?;
    let branches = state.store.list_branches(status)?;
    Ok(Json(paginate(
        "/api/branches",
        &query,
        with_serial_numbers(&branches),
    )))
}

async fn create(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<BranchPayload>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    payload.validate()?;
    let branch = state.store.create_branch(&payload)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": format!(
                "Branch '{}' created with organization id {}",
                branch.name, branch.organization_id
            ),
            "data": branch,
        })),
    ))
}

async fn retrieve(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Branch>, ApiError> {
    Ok(Json(state.store.get_branch(id)?))
}

async fn update(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BranchPayload>,
) -> Result<Json<Branch>, ApiError> {
    user.require_admin()?;
    payload.validate()?;
    Ok(Json(state.store.update_branch(id, &payload)?))
}

async fn destroy(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let branch = state.store.set_branch_status(id, RecordStatus::Bin)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Branch '{}' moved to bin", branch.name),
        "id": branch.id,
    })))
}

async fn restore(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let branch = state.store.get_branch(id)?;
    if branch.status != RecordStatus::Bin {
        return Err(ApiError::BadRequest(format!(
            "Branch '{}' is not in the bin",
            branch.name
        )));
    }
    let branch = state.store.set_branch_status(id, RecordStatus::Active)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Branch '{}' restored", branch.name),
        "data": branch,
    })))
}

async fn export_csv(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let status = record_status_filter(query.status.as_deref())?;
    let branches = state.store.list_branches(status)?;
    let bytes = export::branches_csv(&branches)?;
    Ok(csv_attachment(
        &export::timestamped_filename("branches_export"),
        bytes,
    ))
}

async fn all_active(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let branches = state.store.list_branches(Some(RecordStatus::Active))?;
    Ok(Json(json!({
        "status": "success",
        "message": "All active branches retrieved successfully",
        "data": with_serial_numbers(&branches),
    })))
}
