mod auth;
mod branches;
mod dashboard;
mod employees;
mod letters;
mod offices;
mod products;
mod receivers;
mod users;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chalani::domain::RecordStatus;
use chalani::seed::seed_demo_data;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::infra::AppState;

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/seed-database", post(seed_database_endpoint))
        .merge(auth::routes())
        .merge(offices::routes())
        .merge(branches::routes())
        .merge(employees::routes())
        .merge(receivers::routes())
        .merge(products::routes())
        .merge(letters::routes())
        .merge(users::routes())
        .merge(dashboard::routes())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Unauthenticated: seeding must work before any account exists, and it
/// is a no-op once branches are present.
async fn seed_database_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = seed_demo_data(&state.store)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Database seeded successfully",
            "data": summary,
        })),
    ))
}

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

/// Listing controls shared by every collection endpoint.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    pub(crate) page: Option<usize>,
    pub(crate) page_size: Option<usize>,
    pub(crate) status: Option<String>,
}

/// Paged listing envelope: `{count, next, previous, results}`.
#[derive(Debug, Serialize)]
pub(crate) struct Page {
    pub(crate) count: usize,
    pub(crate) next: Option<String>,
    pub(crate) previous: Option<String>,
    pub(crate) results: Vec<serde_json::Value>,
}

/// Slice one page out of the full filtered listing. Serial numbers must
/// already be attached so they stay stable across pages.
pub(crate) fn paginate(path: &str, query: &ListQuery, rows: Vec<serde_json::Value>) -> Page {
    let count = rows.len();
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let last_page = count.div_ceil(page_size).max(1);
    let page = query.page.unwrap_or(1).clamp(1, last_page);

    let start = (page - 1) * page_size;
    let results = rows.into_iter().skip(start).take(page_size).collect();

    let link = |target: usize| format!("{path}?page={target}&page_size={page_size}");
    Page {
        count,
        next: (page < last_page).then(|| link(page + 1)),
        previous: (page > 1).then(|| link(page - 1)),
        results,
    }
}

/// Serialize rows and attach a 1-based `serial_number` to each.
pub(crate) fn with_serial_numbers<T: Serialize>(rows: &[T]) -> Vec<serde_json::Value> {
    rows.iter()
        .map(|row| serde_json::to_value(row).unwrap_or_default())
        .enumerate()
        .map(|(index, value)| numbered(index, value))
        .collect()
}

pub(crate) fn numbered(index: usize, mut value: serde_json::Value) -> serde_json::Value {
    if let Some(object) = value.as_object_mut() {
        object.insert("serial_number".to_string(), json!(index + 1));
    }
    value
}

/// `?status=` filter for soft-deletable listings. Absent means active.
pub(crate) fn record_status_filter(
    raw: Option<&str>,
) -> Result<Option<RecordStatus>, ApiError> {
    match raw {
        None => Ok(Some(RecordStatus::Active)),
        Some(value) => Ok(Some(RecordStatus::parse(value)?)),
    }
}

/// CSV download with a timestamped attachment filename.
pub(crate) fn csv_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
