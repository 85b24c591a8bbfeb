use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{validate_email, RecordStatus, ValidationError};

/// A head or regional office tracked for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct Office {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub email: Option<String>,
    pub phone_number: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for offices.
#[derive(Debug, Clone, Deserialize)]
pub struct OfficePayload {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: String,
}

impl OfficePayload {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "name is required"));
        }
        if let Some(email) = &self.email {
            if !email.trim().is_empty() {
                validate_email(email)?;
            }
        }
        Ok(())
    }
}
