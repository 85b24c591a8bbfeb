use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{validate_email, RecordStatus, ValidationError};

/// Seniority level 1 through 9, stored as a single digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmployeeLevel(u8);

impl EmployeeLevel {
    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if (1..=9).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ValidationError::new(
                "role",
                "role must be a digit between 1 and 9",
            ))
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let digit = value
            .trim()
            .parse::<u8>()
            .map_err(|_| ValidationError::new("role", "role must be a digit between 1 and 9"))?;
        Self::new(digit)
    }

    pub fn as_digit(self) -> u8 {
        self.0
    }

    pub fn label(self) -> String {
        format!("Level {}", self.0)
    }
}

impl TryFrom<String> for EmployeeLevel {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmployeeLevel> for String {
    fn from(level: EmployeeLevel) -> Self {
        level.0.to_string()
    }
}

/// A branch employee. Carries the branch name and organization id so list
/// and export views render without extra lookups.
#[derive(Debug, Clone, Serialize)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub role: EmployeeLevel,
    pub organization_id: u16,
    pub branch_name: String,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) if !middle.trim().is_empty() => {
                format!("{} {} {}", self.first_name, middle, self.last_name)
            }
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// Create/update payload for employees. The branch is addressed by its
/// organization id, not the internal row id.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeePayload {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub organization_id: u16,
}

impl EmployeePayload {
    pub fn validate(&self) -> Result<EmployeeLevel, ValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::new("first_name", "first name is required"));
        }
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::new("last_name", "last name is required"));
        }
        validate_email(&self.email)?;
        EmployeeLevel::parse(&self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_bounds_enforced() {
        assert!(EmployeeLevel::parse("1").is_ok());
        assert!(EmployeeLevel::parse("9").is_ok());
        assert!(EmployeeLevel::parse("0").is_err());
        assert!(EmployeeLevel::parse("10").is_err());
        assert!(EmployeeLevel::parse("x").is_err());
    }

    #[test]
    fn level_round_trips_as_string() {
        let level = EmployeeLevel::parse("7").unwrap();
        assert_eq!(String::from(level), "7");
        assert_eq!(level.label(), "Level 7");
    }

    #[test]
    fn full_name_skips_blank_middle_name() {
        let employee = Employee {
            id: 1,
            first_name: "Hari".to_string(),
            middle_name: Some(String::new()),
            last_name: "Adhikari".to_string(),
            email: "hari@nea.org.np".to_string(),
            role: EmployeeLevel::new(3).unwrap(),
            organization_id: 12,
            branch_name: "Pokhara".to_string(),
            status: RecordStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(employee.full_name(), "Hari Adhikari");
    }
}
