use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::receiver::IdCardType;
use super::ValidationError;
use crate::numerals::{to_ascii_digits, to_devanagari_digits};

/// Lifecycle of an outgoing dispatch letter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterStatus {
    #[default]
    Draft,
    Sent,
    Bin,
}

impl LetterStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            LetterStatus::Draft => "draft",
            LetterStatus::Sent => "sent",
            LetterStatus::Bin => "bin",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LetterStatus::Draft => "Draft",
            LetterStatus::Sent => "Sent",
            LetterStatus::Bin => "Bin",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(LetterStatus::Draft),
            "sent" => Ok(LetterStatus::Sent),
            "bin" => Ok(LetterStatus::Bin),
            other => Err(ValidationError::new(
                "status",
                format!("'{other}' is not a valid letter status"),
            )),
        }
    }
}

/// Receiver details captured on the letter itself. The letter keeps its own
/// snapshot so later edits to the receiver directory never rewrite history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverSnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub post: String,
    #[serde(default)]
    pub id_card_number: String,
    #[serde(default)]
    pub id_card_type: IdCardType,
    #[serde(default)]
    pub office_name: String,
    #[serde(default)]
    pub office_address: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub vehicle_number: String,
}

/// One dispatched line item.
#[derive(Debug, Clone, Serialize)]
pub struct LetterItem {
    pub id: i64,
    pub name: String,
    pub company: String,
    pub serial_number: String,
    pub unit_of_measurement: String,
    pub quantity: String,
    pub remarks: String,
}

/// Line item as submitted by clients.
#[derive(Debug, Clone, Deserialize)]
pub struct LetterItemPayload {
    pub name: String,
    #[serde(default)]
    pub company: String,
    pub serial_number: String,
    #[serde(default)]
    pub unit_of_measurement: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub remarks: String,
}

/// An outgoing dispatch letter with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct Letter {
    pub id: i64,
    pub letter_count: String,
    pub chalani_no: Option<String>,
    pub voucher_no: Option<String>,
    pub date: String,
    pub subject: String,
    pub office_name: String,
    pub sub_office_name: String,
    pub receiver_office_name: String,
    pub receiver_address: String,
    pub request_chalani_number: String,
    pub request_letter_count: String,
    pub request_date: String,
    pub gatepass_no: Option<String>,
    pub receiver: ReceiverSnapshot,
    pub status: LetterStatus,
    pub items: Vec<LetterItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Letter {
    /// Display title used in operator-facing messages.
    pub fn title(&self) -> String {
        if self.subject.trim().is_empty() {
            format!("Letter {}", self.id)
        } else {
            self.subject.clone()
        }
    }

    /// Response view with numeric fields rendered in Devanagari.
    pub fn presentation(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(object) = value.as_object_mut() {
            for field in [
                "letter_count",
                "chalani_no",
                "voucher_no",
                "gatepass_no",
                "request_chalani_number",
                "request_letter_count",
            ] {
                if let Some(serde_json::Value::String(text)) = object.get_mut(field) {
                    *text = to_devanagari_digits(text);
                }
            }
            if let Some(items) = object.get_mut("items").and_then(|v| v.as_array_mut()) {
                for item in items {
                    for field in ["serial_number", "quantity"] {
                        if let Some(serde_json::Value::String(text)) =
                            item.as_object_mut().and_then(|o| o.get_mut(field))
                        {
                            *text = to_devanagari_digits(text);
                        }
                    }
                }
            }
            if let Some(serde_json::Value::String(phone)) = object
                .get_mut("receiver")
                .and_then(|r| r.as_object_mut())
                .and_then(|r| r.get_mut("phone_number"))
            {
                *phone = to_devanagari_digits(phone);
            }
        }
        value
    }
}

/// Create/update payload for letters. All fields are optional strings so
/// drafts can be captured piecemeal; `normalized` converts Devanagari
/// numerals to ASCII before the payload reaches the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LetterPayload {
    #[serde(default)]
    pub letter_count: String,
    #[serde(default)]
    pub chalani_no: Option<String>,
    #[serde(default)]
    pub voucher_no: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub office_name: String,
    #[serde(default)]
    pub sub_office_name: String,
    #[serde(default)]
    pub receiver_office_name: String,
    #[serde(default)]
    pub receiver_address: String,
    #[serde(default)]
    pub request_chalani_number: String,
    #[serde(default)]
    pub request_letter_count: String,
    #[serde(default)]
    pub request_date: String,
    #[serde(default)]
    pub gatepass_no: Option<String>,
    #[serde(default)]
    pub receiver: Option<ReceiverSnapshot>,
    #[serde(default)]
    pub status: Option<LetterStatus>,
    #[serde(default)]
    pub items: Vec<LetterItemPayload>,
}

impl LetterPayload {
    /// Reject duplicate item serial numbers; they are the per-letter
    /// ordering key and unique by schema.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(ValidationError::new("items", "item name is required"));
            }
            let serial = to_ascii_digits(item.serial_number.trim());
            if serial.is_empty() {
                return Err(ValidationError::new(
                    "items",
                    "item serial_number is required",
                ));
            }
            if !seen.insert(serial.clone()) {
                return Err(ValidationError::new(
                    "items",
                    format!("duplicate item serial number '{serial}'"),
                ));
            }
        }
        Ok(())
    }

    /// Copy of the payload with every numeric field transcoded to ASCII.
    pub fn normalized(&self) -> LetterPayload {
        let mut payload = self.clone();
        payload.letter_count = to_ascii_digits(&payload.letter_count);
        payload.chalani_no = payload.chalani_no.as_deref().map(to_ascii_digits);
        payload.voucher_no = payload.voucher_no.as_deref().map(to_ascii_digits);
        payload.gatepass_no = payload.gatepass_no.as_deref().map(to_ascii_digits);
        payload.request_chalani_number = to_ascii_digits(&payload.request_chalani_number);
        payload.request_letter_count = to_ascii_digits(&payload.request_letter_count);
        for item in &mut payload.items {
            item.serial_number = to_ascii_digits(&item.serial_number);
            item.quantity = to_ascii_digits(&item.quantity);
        }
        if let Some(receiver) = &mut payload.receiver {
            receiver.id_card_number = to_ascii_digits(&receiver.id_card_number);
            receiver.phone_number = to_ascii_digits(&receiver.phone_number);
        }
        payload
    }
}

/// Aggregate letter counts served by `/api/letters/stats` and the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LetterStats {
    pub total_letters: u32,
    pub draft_letters: u32,
    pub sent_letters: u32,
    pub bin_letters: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(serial: &str) -> LetterItemPayload {
        LetterItemPayload {
            name: "Distribution box".to_string(),
            company: "Himal Suppliers".to_string(),
            serial_number: serial.to_string(),
            unit_of_measurement: "Nos.".to_string(),
            quantity: "५".to_string(),
            remarks: String::new(),
        }
    }

    #[test]
    fn duplicate_serials_rejected_across_scripts() {
        let payload = LetterPayload {
            items: vec![item("1"), item("१")],
            ..LetterPayload::default()
        };
        let err = payload.validate().unwrap_err();
        assert_eq!(err.field, "items");
    }

    #[test]
    fn normalization_transcodes_numeric_fields() {
        let payload = LetterPayload {
            letter_count: "३".to_string(),
            chalani_no: Some("४५६".to_string()),
            items: vec![item("१")],
            receiver: Some(ReceiverSnapshot {
                phone_number: "९८४१२३४५६७".to_string(),
                ..ReceiverSnapshot::default()
            }),
            ..LetterPayload::default()
        };
        let normalized = payload.normalized();
        assert_eq!(normalized.letter_count, "3");
        assert_eq!(normalized.chalani_no.as_deref(), Some("456"));
        assert_eq!(normalized.items[0].serial_number, "1");
        assert_eq!(normalized.items[0].quantity, "5");
        assert_eq!(normalized.receiver.unwrap().phone_number, "9841234567");
    }

    #[test]
    fn presentation_renders_devanagari() {
        let letter = Letter {
            id: 7,
            letter_count: "3".to_string(),
            chalani_no: Some("456".to_string()),
            voucher_no: None,
            date: "2081/05/01".to_string(),
            subject: String::new(),
            office_name: String::new(),
            sub_office_name: String::new(),
            receiver_office_name: String::new(),
            receiver_address: String::new(),
            request_chalani_number: String::new(),
            request_letter_count: String::new(),
            request_date: String::new(),
            gatepass_no: None,
            receiver: ReceiverSnapshot {
                phone_number: "9841234567".to_string(),
                ..ReceiverSnapshot::default()
            },
            status: LetterStatus::Draft,
            items: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(letter.title(), "Letter 7");
        let view = letter.presentation();
        assert_eq!(view["chalani_no"], "४५६");
        assert_eq!(view["receiver"]["phone_number"], "९८४१२३४५६७");
        // The free-form date field is stored verbatim.
        assert_eq!(view["date"], "2081/05/01");
    }
}
