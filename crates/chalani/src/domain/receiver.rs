use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Identity document presented by a receiver when collecting a dispatch.
/// Labels are the Devanagari forms printed on gate passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdCardType {
    NationalId,
    Citizenship,
    VoterId,
    Passport,
    DriversLicense,
    PanCard,
    EmployeeId,
    #[default]
    Unknown,
}

impl IdCardType {
    pub const fn as_str(self) -> &'static str {
        match self {
            IdCardType::NationalId => "national_id",
            IdCardType::Citizenship => "citizenship",
            IdCardType::VoterId => "voter_id",
            IdCardType::Passport => "passport",
            IdCardType::DriversLicense => "drivers_license",
            IdCardType::PanCard => "pan_card",
            IdCardType::EmployeeId => "employee_id",
            IdCardType::Unknown => "unknown",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            IdCardType::NationalId => "राष्ट्रिय परिचयपत्र",
            IdCardType::Citizenship => "नागरिकता प्रमाणपत्र",
            IdCardType::VoterId => "मतदाता परिचयपत्र",
            IdCardType::Passport => "राहदानी / ई–राहदानी",
            IdCardType::DriversLicense => "सवारी चालक अनुमति पत्र",
            IdCardType::PanCard => "स्थायी लेखा नम्बर (प्यान)",
            IdCardType::EmployeeId => "कर्मचारी परिचयपत्र",
            IdCardType::Unknown => "अज्ञात",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "national_id" => Ok(IdCardType::NationalId),
            "citizenship" => Ok(IdCardType::Citizenship),
            "voter_id" => Ok(IdCardType::VoterId),
            "passport" => Ok(IdCardType::Passport),
            "drivers_license" => Ok(IdCardType::DriversLicense),
            "pan_card" => Ok(IdCardType::PanCard),
            "employee_id" => Ok(IdCardType::EmployeeId),
            "unknown" | "" => Ok(IdCardType::Unknown),
            other => Err(ValidationError::new(
                "id_card_type",
                format!("'{other}' is not a recognized id card type"),
            )),
        }
    }
}

/// A person authorized to collect dispatched goods. Receivers are plain
/// directory rows with no bin status.
#[derive(Debug, Clone, Serialize)]
pub struct Receiver {
    pub id: i64,
    pub name: String,
    pub post: String,
    pub id_card_number: String,
    pub id_card_type: IdCardType,
    pub office_name: String,
    pub office_address: String,
    pub phone_number: String,
    pub vehicle_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn unknown() -> String {
    "UNKNOWN".to_string()
}

/// Create/update payload for receivers. Unfilled fields fall back to the
/// UNKNOWN sentinel used throughout the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiverPayload {
    pub name: String,
    #[serde(default = "unknown")]
    pub post: String,
    #[serde(default = "unknown")]
    pub id_card_number: String,
    #[serde(default)]
    pub id_card_type: IdCardType,
    #[serde(default = "unknown")]
    pub office_name: String,
    #[serde(default = "unknown")]
    pub office_address: String,
    #[serde(default = "unknown")]
    pub phone_number: String,
    #[serde(default = "unknown")]
    pub vehicle_number: String,
}

impl ReceiverPayload {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "name is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_card_type_parse_and_label() {
        assert_eq!(IdCardType::parse("passport").unwrap(), IdCardType::Passport);
        assert_eq!(IdCardType::parse("").unwrap(), IdCardType::Unknown);
        assert!(IdCardType::parse("library_card").is_err());
        assert_eq!(IdCardType::Citizenship.label(), "नागरिकता प्रमाणपत्र");
    }

    #[test]
    fn payload_defaults_to_unknown_sentinels() {
        let payload: ReceiverPayload =
            serde_json::from_str(r#"{"name":"Gopal Thapa"}"#).expect("minimal payload");
        assert_eq!(payload.post, "UNKNOWN");
        assert_eq!(payload.id_card_type, IdCardType::Unknown);
        assert!(payload.validate().is_ok());
    }
}
