//! Field-level payload validation.

use serde::{Deserialize, Serialize};

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All rejected fields of one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty error collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a rejected field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Rejects `field` if `value` is blank.
    pub fn require_non_empty(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        }
    }

    /// Rejects `field` unless `value` is a finite number greater than zero.
    pub fn require_positive(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value <= 0.0 {
            self.push(field, "must be greater than 0");
        }
    }

    /// Returns true if no field was rejected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `Ok(())` if nothing was rejected, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Returns true if `field` was rejected.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Folds the outcome of another validation into this one.
    pub fn merge(&mut self, result: Result<(), ValidationErrors>) {
        if let Err(other) = result {
            self.errors.extend(other.errors);
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{} {}", e.field, e.message))
            .collect();
        write!(f, "validation failed: {}", fields.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Payloads that can check their own fields before being stored.
pub trait Validate {
    /// Returns every rejected field, or `Ok(())` if the payload is acceptable.
    fn validate(&self) -> Result<(), ValidationErrors>;
}
