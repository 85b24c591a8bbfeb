use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{RecordStatus, ValidationError};

/// Stock-keeping units used on dispatch paperwork.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOfMeasurement {
    #[default]
    Nos,
    Set,
    Kg,
    Ltr,
    Pcs,
}

impl UnitOfMeasurement {
    pub const fn as_str(self) -> &'static str {
        match self {
            UnitOfMeasurement::Nos => "nos",
            UnitOfMeasurement::Set => "set",
            UnitOfMeasurement::Kg => "kg",
            UnitOfMeasurement::Ltr => "ltr",
            UnitOfMeasurement::Pcs => "pcs",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            UnitOfMeasurement::Nos => "Nos.",
            UnitOfMeasurement::Set => "Set",
            UnitOfMeasurement::Kg => "KG",
            UnitOfMeasurement::Ltr => "Ltr",
            UnitOfMeasurement::Pcs => "Pcs",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nos" => Ok(UnitOfMeasurement::Nos),
            "set" => Ok(UnitOfMeasurement::Set),
            "kg" => Ok(UnitOfMeasurement::Kg),
            "ltr" => Ok(UnitOfMeasurement::Ltr),
            "pcs" => Ok(UnitOfMeasurement::Pcs),
            other => Err(ValidationError::new(
                "unit_of_measurement",
                format!("'{other}' is not a valid unit"),
            )),
        }
    }

    /// Forgiving parser for CSV imports; common synonyms map onto the
    /// canonical units and anything unrecognized falls back to `Nos`.
    pub fn parse_loose(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "set" => UnitOfMeasurement::Set,
            "kg" | "kilogram" | "kilograms" => UnitOfMeasurement::Kg,
            "ltr" | "liter" | "liters" => UnitOfMeasurement::Ltr,
            "pcs" | "piece" | "pieces" => UnitOfMeasurement::Pcs,
            _ => UnitOfMeasurement::Nos,
        }
    }
}

/// An inventory product available for dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub remarks: String,
    pub unit_of_measurement: UnitOfMeasurement,
    pub sku: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for products. A blank SKU gets a generated one.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub unit_of_measurement: UnitOfMeasurement,
    #[serde(default)]
    pub sku: Option<String>,
}

impl ProductPayload {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "name is required"));
        }
        Ok(())
    }
}

/// Generate a 13-digit random SKU for products created without one.
pub fn generate_sku() -> String {
    let mut rng = rand::thread_rng();
    (0..13).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect()
}
