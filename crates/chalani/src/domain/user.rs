use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{validate_email, ValidationError};

/// Access role carried in JWT claims and checked by the permission guards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Viewer,
}

impl UserRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "viewer" => Ok(UserRole::Viewer),
            other => Err(ValidationError::new(
                "role",
                format!("'{other}' is not a valid role (admin or viewer)"),
            )),
        }
    }
}

/// Account able to authenticate against the API.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Signup payload. Password confirmation happens here so the store only
/// ever sees a finished hash.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub password_confirm: String,
    pub role: UserRole,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "name is required"));
        }
        validate_password(&self.password)?;
        if self.password != self.password_confirm {
            return Err(ValidationError::new(
                "password_confirm",
                "passwords do not match",
            ));
        }
        Ok(())
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < 8 {
        return Err(ValidationError::new(
            "password",
            "password must be at least 8 characters long",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup() -> NewUser {
        NewUser {
            email: "sita@nea.org.np".to_string(),
            name: "Sita Sharma".to_string(),
            password: "s3cure-pass".to_string(),
            password_confirm: "s3cure-pass".to_string(),
            role: UserRole::Viewer,
        }
    }

    #[test]
    fn valid_signup_passes() {
        assert!(signup().validate().is_ok());
    }

    #[test]
    fn mismatched_passwords_rejected() {
        let mut payload = signup();
        payload.password_confirm = "different".to_string();
        let err = payload.validate().unwrap_err();
        assert_eq!(err.field, "password_confirm");
    }

    #[test]
    fn short_password_rejected() {
        let mut payload = signup();
        payload.password = "short".to_string();
        payload.password_confirm = "short".to_string();
        assert_eq!(payload.validate().unwrap_err().field, "password");
    }

    #[test]
    fn role_parsing() {
        assert_eq!(UserRole::parse("Admin").unwrap(), UserRole::Admin);
        assert!(UserRole::parse("superuser").is_err());
    }
}
