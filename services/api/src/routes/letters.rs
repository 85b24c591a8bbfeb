use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;

use chalani::domain::{LetterPayload, LetterStatus};
use chalani::export;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::infra::AppState;
use crate::routes::{csv_attachment, numbered, paginate, ListQuery, Page};

pub(crate) fn routes() -> Router {
    Router::new()
        .route("/api/letters", get(list).post(create))
        .route("/api/letters/stats", get(stats))
        .route("/api/letters/export_csv", get(export_csv))
        .route(
            "/api/letters/:id",
            get(retrieve).put(update).delete(destroy),
        )
        .route("/api/letters/:id/send", post(send))
        .route("/api/letters/:id/draft", post(draft))
        .route("/api/letters/:id/restore", post(restore))
}

/// `?status=` narrows to one lifecycle state; absent lists everything,
/// bin included, matching the registry ledger view.
fn letter_status_filter(raw: Option<&str>) -> Result<Option<LetterStatus>, ApiError> {
    match raw {
        None => Ok(None),
        Some(value) => Ok(Some(LetterStatus::parse(value)?)),
    }
}

async fn list(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page>, ApiError> {
    let status = letter_status_filter(query.status.as_deref())?;
    let letters = state.store.list_letters(status)?;
    let rows = letters
        .iter()
        .enumerate()
        .map(|(index, letter)| numbered(index, letter.presentation()))
        .collect();
    Ok(Json(paginate("/api/letters", &query, rows)))
}

// Letter intake is day-to-day registry work, open to every signed-in
// operator.
async fn create(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<LetterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let letter = state.store.create_letter(&payload.normalized())?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": format!("Letter '{}' created successfully", letter.title()),
            "data": letter.presentation(),
        })),
    ))
}

async fn retrieve(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(state.store.get_letter(id)?.presentation()))
}

async fn update(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<LetterPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    payload.validate()?;
    let letter = state.store.update_letter(id, &payload.normalized())?;
    Ok(Json(letter.presentation()))
}

async fn destroy(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let letter = state.store.set_letter_status(id, LetterStatus::Bin)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Letter '{}' moved to bin", letter.title()),
        "id": letter.id,
    })))
}

async fn send(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let letter = state.store.get_letter(id)?;
    if letter.status == LetterStatus::Sent {
        return Err(ApiError::BadRequest(format!(
            "Letter '{}' is already sent",
            letter.title()
        )));
    }
    let letter = state.store.set_letter_status(id, LetterStatus::Sent)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Letter '{}' marked as sent", letter.title()),
        "data": letter.presentation(),
    })))
}

async fn draft(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let letter = state.store.get_letter(id)?;
    if letter.status == LetterStatus::Draft {
        return Err(ApiError::BadRequest(format!(
            "Letter '{}' is already a draft",
            letter.title()
        )));
    }
    let letter = state.store.set_letter_status(id, LetterStatus::Draft)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Letter '{}' moved back to draft", letter.title()),
        "data": letter.presentation(),
    })))
}

/// Restore out of the bin always lands on draft.
async fn restore(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let letter = state.store.get_letter(id)?;
    if letter.status != LetterStatus::Bin {
        return Err(ApiError::BadRequest(format!(
            "Letter '{}' is not in the bin",
            letter.title()
        )));
    }
    let letter = state.store.set_letter_status(id, LetterStatus::Draft)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Letter '{}' restored to draft", letter.title()),
        "data": letter.presentation(),
    })))
}

async fn stats(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.store.letter_stats()?;
    Ok(Json(json!({ "status": "success", "data": stats })))
}

async fn export_csv(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let status = letter_status_filter(query.status.as_deref())?;
    let letters = state.store.list_letters(status)?;
    if letters.is_empty() {
        return Err(ApiError::NotFound("No letters found to export".to_string()));
    }
    // Spreadsheet apps need the BOM to pick up the Devanagari text.
    let mut bytes = export::UTF8_BOM.to_vec();
    bytes.extend(export::letters_csv(&letters)?);
    Ok(csv_attachment(
        &export::timestamped_filename("letters_export"),
        bytes,
    ))
}
