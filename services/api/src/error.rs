use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chalani::auth::{PasswordError, TokenError};
use chalani::config::ConfigError;
use chalani::domain::ValidationError;
use chalani::export::ExportError;
use chalani::seed::SeedError;
use chalani::store::StoreError;
use chalani::telemetry::TelemetryError;
use serde_json::json;
use std::fmt;

/// Boundary error for the service. Startup failures surface on stderr;
/// handler failures map onto HTTP responses. Authentication problems use
/// an `{"error": ...}` body, resource problems use
/// `{"status": "error", "message": ...}`.
#[derive(Debug)]
pub enum ApiError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Store(StoreError),
    Validation(ValidationError),
    Token(TokenError),
    Password(PasswordError),
    Export(ExportError),
    Seed(SeedError),
    Unauthorized(String),
    Forbidden,
    BadRequest(String),
    NotFound(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Config(err) => write!(f, "configuration error: {err}"),
            ApiError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            ApiError::Io(err) => write!(f, "io error: {err}"),
            ApiError::Store(err) => write!(f, "storage error: {err}"),
            ApiError::Validation(err) => write!(f, "{err}"),
            ApiError::Token(err) => write!(f, "{err}"),
            ApiError::Password(err) => write!(f, "password error: {err}"),
            ApiError::Export(err) => write!(f, "export error: {err}"),
            ApiError::Seed(err) => write!(f, "seed error: {err}"),
            ApiError::Unauthorized(message) => write!(f, "{message}"),
            ApiError::Forbidden => write!(f, "admin privileges required"),
            ApiError::BadRequest(message) => write!(f, "{message}"),
            ApiError::NotFound(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Config(err) => Some(err),
            ApiError::Telemetry(err) => Some(err),
            ApiError::Io(err) => Some(err),
            ApiError::Store(err) => Some(err),
            ApiError::Validation(err) => Some(err),
            ApiError::Token(err) => Some(err),
            ApiError::Password(err) => Some(err),
            ApiError::Export(err) => Some(err),
            ApiError::Seed(err) => Some(err),
            ApiError::Unauthorized(_)
            | ApiError::Forbidden
            | ApiError::BadRequest(_)
            | ApiError::NotFound(_) => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Token(_) | ApiError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": self.to_string() }),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "error": self.to_string() }),
            ),
            ApiError::Validation(_) | ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "error", "message": self.to_string() }),
            ),
            ApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({ "status": "error", "message": self.to_string() }),
            ),
            ApiError::Store(StoreError::NotFound) => (
                StatusCode::NOT_FOUND,
                json!({ "status": "error", "message": "record not found" }),
            ),
            ApiError::Store(StoreError::Conflict(message)) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "error", "message": message }),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "status": "error", "message": self.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for ApiError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for ApiError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TokenError> for ApiError {
    fn from(value: TokenError) -> Self {
        Self::Token(value)
    }
}

impl From<PasswordError> for ApiError {
    fn from(value: PasswordError) -> Self {
        Self::Password(value)
    }
}

impl From<ExportError> for ApiError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<SeedError> for ApiError {
    fn from(value: SeedError) -> Self {
        Self::Seed(value)
    }
}
