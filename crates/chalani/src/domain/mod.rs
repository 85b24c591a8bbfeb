//! Entity types and input validation for the dispatch registry.

pub mod branch;
pub mod employee;
pub mod letter;
pub mod office;
pub mod product;
pub mod receiver;
pub mod user;

pub use branch::{Branch, BranchPayload, MAX_ORGANIZATION_ID};
pub use employee::{Employee, EmployeeLevel, EmployeePayload};
pub use letter::{
    Letter, LetterItem, LetterItemPayload, LetterPayload, LetterStats, LetterStatus,
    ReceiverSnapshot,
};
pub use office::{Office, OfficePayload};
pub use product::{Product, ProductPayload, UnitOfMeasurement};
pub use receiver::{IdCardType, Receiver, ReceiverPayload};
pub use user::{NewUser, User, UserRole};

use serde::{Deserialize, Serialize};

/// Archival status shared by soft-deletable records. `Bin` rows are hidden
/// from default listings and can be restored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Bin,
}

impl RecordStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Bin => "bin",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RecordStatus::Active => "Active",
            RecordStatus::Bin => "Bin",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(RecordStatus::Active),
            "bin" => Ok(RecordStatus::Bin),
            other => Err(ValidationError::new(
                "status",
                format!("'{other}' is not a valid status"),
            )),
        }
    }
}

/// Field-level rejection raised by payload validation.
#[derive(Debug, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Minimal shape check shared by user and employee email fields.
pub(crate) fn validate_email(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("email", "email is required"));
    }
    let mut parts = trimmed.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::new(
            "email",
            format!("'{trimmed}' is not a valid email address"),
        ));
    }
    Ok(())
}
