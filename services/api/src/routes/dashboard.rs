use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

use chalani::export;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::infra::AppState;
use crate::routes::csv_attachment;

pub(crate) fn routes() -> Router {
    Router::new()
        .route("/api/dashboard", get(snapshot))
        .route("/api/dashboard/export_csv", get(export_csv))
}

// Every read recomputes from the live tables; the persisted row is only
// a fallback for the last known figures.
async fn snapshot(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.store.refresh_dashboard()?;
    Ok(Json(json!({ "status": "success", "data": snapshot })))
}

async fn export_csv(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Response, ApiError> {
    let snapshot = state.store.refresh_dashboard()?;
    let bytes = export::dashboard_csv(&snapshot)?;
    Ok(csv_attachment(
        &export::timestamped_filename("dashboard_statistics"),
        bytes,
    ))
}
