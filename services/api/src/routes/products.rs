use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;

use chalani::domain::{Product, ProductPayload, RecordStatus};
use chalani::export;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::infra::AppState;
use crate::routes::{csv_attachment, paginate, record_status_filter, with_serial_numbers, ListQuery, Page};

pub(crate) fn routes() -> Router {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/export_csv", get(export_csv))
        .route("/api/products/export_csv_simple", get(export_csv_simple))
        .route("/api/products/company_stats", get(company_stats))
        .route("/api/products/active_count", get(active_count))
        .route("/api/products/bin_count", get(bin_count))
        .route("/api/products/bulk_delete", post(bulk_delete))
        .route("/api/products/import_csv", post(import_csv))
        .route("/api/products/import_template", get(import_template))
        .route("/api/products/all-active", get(all_active))
        .route(
            "/api/products/:id",
            get(retrieve).put(update).delete(destroy),
        )
        .route("/api/products/:id/restore", post(restore))
}

async fn list(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page>, ApiError> {
    let status = record_status_filter(query.status.as_deref())?;
    let products = state.store.list_products(status)?;
    Ok(Json(paginate(
        "/api/products",
        &query,
        with_serial_numbers(&products),
    )))
}

async fn create(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    payload.validate()?;
    let product = state.store.create_product(&payload)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": format!("Product '{}' created successfully", product.name),
            "data": product,
        })),
    ))
}

async fn retrieve(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.store.get_product(id)?))
}

async fn update(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<Product>, ApiError> {
    user.require_admin()?;
    payload.validate()?;
    Ok(Json(state.store.update_product(id, &payload)?))
}

async fn destroy(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let product = state.store.set_product_status(id, RecordStatus::Bin)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Product '{}' moved to bin", product.name),
        "id": product.id,
    })))
}

async fn restore(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let product = state.store.get_product(id)?;
    if product.status != RecordStatus::Bin {
        return Err(ApiError::BadRequest(format!(
            "Product '{}' is not in the bin",
            product.name
        )));
    }
    // The duplicate guard inside the store may still refuse the restore.
    let product = state.store.set_product_status(id, RecordStatus::Active)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Product '{}' restored", product.name),
        "data": product,
    })))
}

#[derive(Debug, Deserialize)]
struct BulkDeleteRequest {
    #[serde(default)]
    product_ids: Vec<i64>,
}

async fn bulk_delete(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    if payload.product_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "'product_ids' must be a non-empty array".to_string(),
        ));
    }
    let (moved, missing) = state.store.bulk_bin_products(&payload.product_ids)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("{moved} product(s) moved to bin"),
        "moved": moved,
        "missing_ids": missing,
    })))
}

#[derive(Debug, Deserialize)]
struct ImportCsvRequest {
    csv_data: String,
}

async fn import_csv(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<ImportCsvRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    if payload.csv_data.trim().is_empty() {
        return Err(ApiError::BadRequest("'csv_data' must not be empty".to_string()));
    }
    let report = state.store.import_products_csv(&payload.csv_data)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!(
            "Imported {} of {} row(s)",
            report.successful, report.total_rows
        ),
        "report": report,
    })))
}

async fn import_template(_user: AuthUser) -> Result<Response, ApiError> {
    let bytes = export::product_import_template_csv()?;
    Ok(csv_attachment("product_import_template.csv", bytes))
}

async fn export_csv(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let status = record_status_filter(query.status.as_deref())?;
    let products = state.store.list_products(status)?;
    let bytes = export::products_csv(&products)?;
    Ok(csv_attachment(
        &export::timestamped_filename("products_export"),
        bytes,
    ))
}

async fn export_csv_simple(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let status = record_status_filter(query.status.as_deref())?;
    let products = state.store.list_products(status)?;
    let bytes = export::products_simple_csv(&products)?;
    Ok(csv_attachment(
        &export::timestamped_filename("products_simple_export"),
        bytes,
    ))
}

async fn company_stats(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.store.product_company_stats()?;
    Ok(Json(json!({ "status": "success", "data": stats })))
}

async fn active_count(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.store.count_products(RecordStatus::Active)?;
    Ok(Json(json!({ "active_count": count })))
}

async fn bin_count(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.store.count_products(RecordStatus::Bin)?;
    Ok(Json(json!({ "bin_count": count })))
}

async fn all_active(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let products = state.store.list_products(Some(RecordStatus::Active))?;
    Ok(Json(json!({
        "status": "success",
        "message": "All active products retrieved successfully",
        "data": with_serial_numbers(&products),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::{body_json, request, test_state, token_for};
    use chalani::domain::UserRole;
    use tower::ServiceExt;

    fn product_body(name: &str, company: &str) -> serde_json::Value {
        json!({ "name": name, "company": company, "unit_of_measurement": "nos" })
    }

    #[tokio::test]
    async fn duplicate_active_pair_is_a_400() {
        let (app, state) = test_state();
        let admin = token_for(&state, UserRole::Admin);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/products",
                Some(&admin),
                Some(product_body("Meter", "Wasion")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["sku"].as_str().unwrap().len(), 13);

        let response = app
            .oneshot(request(
                "POST",
                "/api/products",
                Some(&admin),
                Some(product_body("METER", "wasion")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bulk_delete_requires_ids_and_reports_missing() {
        let (app, state) = test_state();
        let admin = token_for(&state, UserRole::Admin);
        let a = state
            .store
            .create_product(&serde_json::from_value(product_body("Meter", "Wasion")).unwrap())
            .unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/products/bulk_delete",
                Some(&admin),
                Some(json!({ "product_ids": [] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request(
                "POST",
                "/api/products/bulk_delete",
                Some(&admin),
                Some(json!({ "product_ids": [a.id, 999] })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["moved"], 1);
        assert_eq!(body["missing_ids"][0], 999);
    }

    #[tokio::test]
    async fn csv_import_returns_a_report() {
        let (app, state) = test_state();
        let admin = token_for(&state, UserRole::Admin);

        let csv_data = "name,company,remarks,unit_of_measurement\n\
                        Meter,Wasion,,nos\n\
                        ,NoName,missing name,set\n";
        let response = app
            .oneshot(request(
                "POST",
                "/api/products/import_csv",
                Some(&admin),
                Some(json!({ "csv_data": csv_data })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["report"]["total_rows"], 2);
        assert_eq!(body["report"]["successful"], 1);
        assert_eq!(body["report"]["failed"], 1);
    }
}
