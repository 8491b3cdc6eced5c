//! Invoices and billing profiles owned by the Billing Service.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::types::{BikeId, RecordId, ReservationId, UserId};
use crate::validation::{Validate, ValidationErrors};

/// Charge raised once per completed reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: RecordId,
    pub reservation_id: ReservationId,
    pub customer_id: UserId,
    pub vendor_id: UserId,
    pub bike_id: BikeId,
    pub amount: f64,
}

/// Invoice payload as submitted by a caller; the service assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewInvoice {
    #[serde(skip_serializing)]
    pub id: Option<IgnoredAny>,
    pub reservation_id: String,
    pub customer_id: String,
    pub vendor_id: String,
    pub bike_id: String,
    pub amount: f64,
}

impl NewInvoice {
    pub fn into_invoice(self, id: RecordId) -> Result<Invoice, ValidationErrors> {
        self.validate()?;
        let bike_id = self.bike_id.trim().parse().map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.push("bikeId", "must be a valid bike id");
            errors
        })?;

        Ok(Invoice {
            id,
            reservation_id: ReservationId::new(self.reservation_id),
            customer_id: UserId::new(self.customer_id),
            vendor_id: UserId::new(self.vendor_id),
            bike_id,
            amount: self.amount,
        })
    }
}

impl Validate for NewInvoice {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.id.is_some() {
            errors.push("id", "cannot be provided");
        }
        errors.require_non_empty("reservationId", &self.reservation_id);
        errors.require_non_empty("customerId", &self.customer_id);
        errors.require_non_empty("vendorId", &self.vendor_id);
        if self.bike_id.trim().parse::<BikeId>().is_err() {
            errors.push("bikeId", "must be a valid bike id");
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            errors.push("amount", "must be a non-negative number");
        }
        errors.into_result()
    }
}

/// Payment card details for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub id: RecordId,
    pub user_id: UserId,
    pub cc_number: String,
    pub cc_expiry: String,
    #[serde(rename = "ccCCV")]
    pub cc_ccv: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCustomerProfile {
    pub user_id: String,
    pub cc_number: String,
    pub cc_expiry: String,
    #[serde(rename = "ccCCV")]
    pub cc_ccv: String,
}

impl NewCustomerProfile {
    pub fn into_profile(self, id: RecordId) -> CustomerProfile {
        CustomerProfile {
            id,
            user_id: UserId::new(self.user_id),
            cc_number: self.cc_number,
            cc_expiry: self.cc_expiry,
            cc_ccv: self.cc_ccv,
        }
    }
}

impl Validate for NewCustomerProfile {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("userId", &self.user_id);
        errors.require_non_empty("ccNumber", &self.cc_number);
        errors.require_non_empty("ccExpiry", &self.cc_expiry);
        errors.require_non_empty("ccCCV", &self.cc_ccv);
        errors.into_result()
    }
}

/// Payout account details for a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorProfile {
    pub id: RecordId,
    pub user_id: UserId,
    pub routing_number: String,
    pub account_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewVendorProfile {
    pub user_id: String,
    pub routing_number: String,
    pub account_number: String,
}

impl NewVendorProfile {
    pub fn into_profile(self, id: RecordId) -> VendorProfile {
        VendorProfile {
            id,
            user_id: UserId::new(self.user_id),
            routing_number: self.routing_number,
            account_number: self.account_number,
        }
    }
}

impl Validate for NewVendorProfile {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_empty("userId", &self.user_id);
        errors.require_non_empty("routingNumber", &self.routing_number);
        errors.require_non_empty("accountNumber", &self.account_number);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_requires_every_party() {
        let payload: NewInvoice = serde_json::from_str(r#"{"amount":3.0}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        for field in ["reservationId", "customerId", "vendorId", "bikeId"] {
            assert!(errors.has_field(field), "missing {field}");
        }
        assert!(!errors.has_field("amount"));
    }

    #[test]
    fn invoice_rejects_negative_amount_and_supplied_id() {
        let payload = NewInvoice {
            id: Some(IgnoredAny),
            reservation_id: "r1".to_string(),
            customer_id: "c1".to_string(),
            vendor_id: "v1".to_string(),
            bike_id: BikeId::new().to_string(),
            amount: -1.0,
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.has_field("id"));
        assert!(errors.has_field("amount"));
    }

    #[test]
    fn zero_amount_invoice_is_accepted() {
        let bike = BikeId::new();
        let invoice = NewInvoice {
            reservation_id: "r1".to_string(),
            customer_id: "c1".to_string(),
            vendor_id: "v1".to_string(),
            bike_id: bike.to_string(),
            amount: 0.0,
            ..NewInvoice::default()
        }
        .into_invoice(RecordId::new())
        .unwrap();
        assert_eq!(invoice.bike_id, bike);
        assert_eq!(invoice.amount, 0.0);
    }

    #[test]
    fn customer_profile_uses_ccv_wire_name() {
        let profile = NewCustomerProfile {
            user_id: "c1".to_string(),
            cc_number: "4111111111111111".to_string(),
            cc_expiry: "12/30".to_string(),
            cc_ccv: "123".to_string(),
        }
        .into_profile(RecordId::new());
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["ccCCV"], "123");
        assert_eq!(json["userId"], "c1");
    }

    #[test]
    fn vendor_profile_requires_account_details() {
        let errors = NewVendorProfile {
            user_id: "v1".to_string(),
            ..NewVendorProfile::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.has_field("routingNumber"));
        assert!(errors.has_field("accountNumber"));
    }
}
