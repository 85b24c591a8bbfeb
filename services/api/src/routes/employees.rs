use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;

use chalani::domain::{Employee, EmployeePayload, RecordStatus};
use chalani::export;
use chalani::store::StoreError;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::infra::AppState;
use crate::routes::{csv_attachment, paginate, record_status_filter, with_serial_numbers, ListQuery, Page};

pub(crate) fn routes() -> Router {
    Router::new()
        .route("/api/employees", get(list).post(create))
        .route("/api/employees/search", get(search))
        .route("/api/employees/export_csv", get(export_csv))
        .route("/api/employees/export_csv_simple", get(export_csv_simple))
        .route(
            "/api/employees/export-by-organization/:org",
            get(export_by_organization),
        )
        .route(
            "/api/employees/by-organization-id/:org",
            get(by_organization_id),
        )
        .route("/api/employees/role_stats", get(role_stats))
        .route("/api/employees/branch_stats", get(branch_stats))
        .route("/api/employees/active_count", get(active_count))
        .route("/api/employees/bin_count", get(bin_count))
        .route("/api/employees/all-active", get(all_active))
        .route(
            "/api/employees/:id",
            get(retrieve).put(update).delete(destroy),
        )
        .route("/api/employees/:id/restore", post(restore))
}

async fn list(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page>, ApiError> {
    let status = record_status_filter(query.status.as_deref())?;
    let employees = state.store.list_employees(status)?;
    Ok(Json(paginate(
        "/api/employees",
        &query,
        with_serial_numbers(&employees),
    )))
}

async fn create(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<EmployeePayload>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;
    let role = payload.validate()?;
    let employee = state
        .store
        .create_employee(&payload, role)
        .map_err(unknown_branch)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": format!("Employee '{}' created successfully", employee.full_name()),
            "data": employee,
        })),
    ))
}

async fn retrieve(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Employee>, ApiError> {
    Ok(Json(state.store.get_employee(id)?))
}

async fn update(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeePayload>,
) -> Result<Json<Employee>, ApiError> {
    user.require_admin()?;
    let role = payload.validate()?;
    // A missing employee is still a 404; only the branch lookup maps to 400.
    state.store.get_employee(id)?;
    let employee = state
        .store
        .update_employee(id, &payload, role)
        .map_err(unknown_branch)?;
    Ok(Json(employee))
}

async fn destroy(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let employee = state.store.set_employee_status(id, RecordStatus::Bin)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Employee '{}' moved to bin", employee.full_name()),
        "id": employee.id,
    })))
}

async fn restore(
    user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    user.require_admin()?;
    let employee = state.store.get_employee(id)?;
    if employee.status != RecordStatus::Bin {
        return Err(ApiError::BadRequest(format!(
            "Employee '{}' is not in the bin",
            employee.full_name()
        )));
    }
    let employee = state.store.set_employee_status(id, RecordStatus::Active)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Employee '{}' restored", employee.full_name()),
        "data": employee,
    })))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "query parameter 'q' is required".to_string(),
        ));
    }
    let employees = state.store.search_employees(&query.q)?;
    Ok(Json(json!({
        "status": "success",
        "count": employees.len(),
        "results": with_serial_numbers(&employees),
    })))
}

async fn by_organization_id(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(org): Path<u16>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let employees = state
        .store
        .list_employees_by_organization(org)
        .map_err(unknown_branch)?;
    Ok(Json(json!({
        "status": "success",
        "organization_id": org,
        "count": employees.len(),
        "results": with_serial_numbers(&employees),
    })))
}

async fn export_csv(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let status = record_status_filter(query.status.as_deref())?;
    let employees = state.store.list_employees(status)?;
    let bytes = export::employees_csv(&employees)?;
    Ok(csv_attachment(
        &export::timestamped_filename("employees_export"),
        bytes,
    ))
}

async fn export_csv_simple(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let status = record_status_filter(query.status.as_deref())?;
    let employees = state.store.list_employees(status)?;
    let bytes = export::employees_simple_csv(&employees)?;
    Ok(csv_attachment(
        &export::timestamped_filename("employees_simple_export"),
        bytes,
    ))
}

async fn export_by_organization(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
    Path(org): Path<u16>,
) -> Result<Response, ApiError> {
    let employees = state
        .store
        .list_employees_by_organization(org)
        .map_err(unknown_branch)?;
    let bytes = export::employees_by_organization_csv(&employees)?;
    Ok(csv_attachment(
        &export::timestamped_filename(&format!("employees_org_{org}_export")),
        bytes,
    ))
}

async fn role_stats(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.store.employee_role_stats()?;
    Ok(Json(json!({ "status": "success", "data": stats })))
}

async fn branch_stats(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.store.employee_branch_stats()?;
    Ok(Json(json!({ "status": "success", "data": stats })))
}

async fn active_count(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.store.count_employees(RecordStatus::Active)?;
    Ok(Json(json!({ "active_count": count })))
}

async fn bin_count(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.store.count_employees(RecordStatus::Bin)?;
    Ok(Json(json!({ "bin_count": count })))
}

async fn all_active(
    _user: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let employees = state.store.list_employees(Some(RecordStatus::Active))?;
    Ok(Json(json!({
        "status": "success",
        "message": "All active employees retrieved successfully",
        "data": with_serial_numbers(&employees),
    })))
}

/// A missing branch on create/lookup is a client error, not a 404 on the
/// employee resource itself.
fn unknown_branch(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => {
            ApiError::BadRequest("no branch exists for the given organization id".to_string())
        }
        other => ApiError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::{body_json, request, test_state, token_for};
    use chalani::domain::{BranchPayload, UserRole};
    use tower::ServiceExt;

    fn seeded_org(state: &crate::infra::AppState) -> u16 {
        state
            .store
            .create_branch(&BranchPayload {
                name: "Pokhara".to_string(),
                email: None,
                address: String::new(),
                phone_number: String::new(),
            })
            .unwrap()
            .organization_id
    }

    fn employee_body(first: &str, email: &str, org: u16) -> serde_json::Value {
        json!({
            "first_name": first,
            "last_name": "Shrestha",
            "email": email,
            "role": "3",
            "organization_id": org,
        })
    }

    #[tokio::test]
    async fn create_resolves_branch_by_organization_id() {
        let (app, state) = test_state();
        let admin = token_for(&state, UserRole::Admin);
        let org = seeded_org(&state);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/employees",
                Some(&admin),
                Some(employee_body("Hari", "hari@nea.org.np", org)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["branch_name"], "Pokhara");

        // Unknown organization ids are a 400, not a 404.
        let response = app
            .oneshot(request(
                "POST",
                "/api/employees",
                Some(&admin),
                Some(employee_body("Gita", "gita@nea.org.np", 999)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_maps_unknown_branch_to_400_and_missing_employee_to_404() {
        let (app, state) = test_state();
        let admin = token_for(&state, UserRole::Admin);
        let org = seeded_org(&state);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/employees",
                Some(&admin),
                Some(employee_body("Hari", "hari@nea.org.np", org)),
            ))
            .await
            .unwrap();
        let body = body_json(response).await;
        let id = body["data"]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/api/employees/{id}"),
                Some(&admin),
                Some(employee_body("Hari", "hari@nea.org.np", 999)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request(
                "PUT",
                "/api/employees/424242",
                Some(&admin),
                Some(employee_body("Hari", "hari@nea.org.np", org)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_requires_a_query() {
        let (app, state) = test_state();
        let viewer = token_for(&state, UserRole::Viewer);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/employees/search", Some(&viewer), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request(
                "GET",
                "/api/employees/search?q=hari",
                Some(&viewer),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn invalid_role_digit_rejected() {
        let (app, state) = test_state();
        let admin = token_for(&state, UserRole::Admin);
        let org = seeded_org(&state);

        let mut body = employee_body("Hari", "hari@nea.org.np", org);
        body["role"] = json!("12");
        let response = app
            .oneshot(request("POST", "/api/employees", Some(&admin), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
