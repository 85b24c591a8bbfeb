use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{validate_email, RecordStatus, ValidationError};

/// Highest organization id a branch may be assigned. Allocation is
/// sequential and never reuses freed ids.
pub const MAX_ORGANIZATION_ID: u16 = 9999;

/// A distribution branch. The `organization_id` is the public lookup key
/// employees reference.
#[derive(Debug, Clone, Serialize)]
pub struct Branch {
    pub id: i64,
    pub organization_id: u16,
    pub name: String,
    pub email: Option<String>,
    pub address: String,
    pub phone_number: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for branches. `organization_id` is allocated by
/// the store and never accepted from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchPayload {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
}

impl BranchPayload {
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
