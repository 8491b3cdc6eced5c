//! User records owned by the User Directory.

use serde::{Deserialize, Serialize};

use crate::types::UserId;
use crate::validation::{Validate, ValidationErrors};

/// Whether a user rents bikes or lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Customer,
    Vendor,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Customer => "customer",
            UserType::Vendor => "vendor",
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user as stored by the User Directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub email: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

impl User {
    pub fn is_customer(&self) -> bool {
        self.user_type == UserType::Customer
    }

    pub fn is_vendor(&self) -> bool {
        self.user_type == UserType::Vendor
    }

    /// Overwrites the profile fields with `update`.
    pub fn apply(&mut self, update: UserUpdate) {
        self.name = update.name;
        self.address = update.address;
        self.phone = update.phone;
        self.email = update.email;
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("id", self.id.as_str());
        check_profile(
            &mut errors,
            &self.name,
            &self.address,
            self.phone.as_deref(),
            &self.email,
        );
        errors.into_result()
    }
}

/// Full replacement of a user's profile fields. Id and type never change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserUpdate {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub email: String,
}

impl From<&User> for UserUpdate {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            address: user.address.clone(),
            phone: user.phone.clone(),
            email: user.email.clone(),
        }
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_profile(
            &mut errors,
            &self.name,
            &self.address,
            self.phone.as_deref(),
            &self.email,
        );
        errors.into_result()
    }
}

/// Partial update of a user's profile; absent or blank fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    pub fn merge_into(self, existing: &User) -> UserUpdate {
        let mut merged = UserUpdate::from(existing);
        if let Some(name) = non_blank(self.name) {
            merged.name = name;
        }
        if let Some(address) = non_blank(self.address) {
            merged.address = address;
        }
        if let Some(phone) = non_blank(self.phone) {
            merged.phone = Some(phone);
        }
        if let Some(email) = non_blank(self.email) {
            merged.email = email;
        }
        merged
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_profile(
    errors: &mut ValidationErrors,
    name: &str,
    address: &str,
    phone: Option<&str>,
    email: &str,
) {
    errors.require_non_empty("name", name);
    errors.require_non_empty("address", address);
    errors.require_non_empty("email", email);
    if phone.is_some_and(|p| !is_valid_phone(p)) {
        errors.push("phone", "must be 8 to 15 digits");
    }
}

/// Phone numbers are 8 to 15 ASCII digits with no separators.
pub fn is_valid_phone(phone: &str) -> bool {
    (8..=15).contains(&phone.len()) && phone.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> User {
        User {
            id: UserId::new("c1"),
            name: "Ada".to_string(),
            address: "2 Side St".to_string(),
            phone: Some("5551234567".to_string()),
            email: "ada@example.com".to_string(),
            user_type: UserType::Customer,
        }
    }

    #[test]
    fn valid_user_passes() {
        assert!(customer().validate().is_ok());
        assert!(customer().is_customer());
    }

    #[test]
    fn phone_length_is_checked() {
        assert!(is_valid_phone("12345678"));
        assert!(is_valid_phone("123456789012345"));
        assert!(!is_valid_phone("1234567"));
        assert!(!is_valid_phone("1234567890123456"));
        assert!(!is_valid_phone("555-123-4567"));

        let mut user = customer();
        user.phone = Some("12".to_string());
        assert!(user.validate().unwrap_err().has_field("phone"));
    }

    #[test]
    fn phone_is_optional_on_the_wire() {
        let user: User = serde_json::from_str(
            r#"{"id":"v1","name":"Bo","address":"x","email":"b@x","type":"vendor"}"#,
        )
        .unwrap();
        assert_eq!(user.phone, None);
        assert!(user.is_vendor());
        assert!(user.validate().is_ok());
    }

    #[test]
    fn patch_keeps_blank_fields() {
        let patch = UserPatch {
            name: Some("Grace".to_string()),
            email: Some("  ".to_string()),
            ..UserPatch::default()
        };
        let merged = patch.merge_into(&customer());
        assert_eq!(merged.name, "Grace");
        assert_eq!(merged.email, "ada@example.com");
    }
}
