use async_trait::async_trait;
use common::{
    CustomerProfile, Invoice, NewCustomerProfile, NewInvoice, NewVendorProfile, RecordId,
    ReservationId, UserId, VendorProfile,
};

use crate::error::Result;

/// Which side of an invoice a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Customer,
    Vendor,
}

/// Storage for invoices and billing profiles.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Stores a new invoice; a reservation can be invoiced once.
    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice>;

    async fn get_invoice(&self, id: RecordId) -> Result<Option<Invoice>>;

    async fn invoice_for_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Option<Invoice>>;

    /// Invoices where `user_id` is the given party.
    async fn invoices_for(&self, party: Party, user_id: &UserId) -> Result<Vec<Invoice>>;

    /// Stores a customer profile; a user has at most one.
    async fn create_customer(&self, profile: NewCustomerProfile) -> Result<CustomerProfile>;

    /// Replaces the card details of the profile owned by `profile.user_id`.
    async fn update_customer(&self, profile: NewCustomerProfile) -> Result<Option<CustomerProfile>>;

    async fn get_customer(&self, user_id: &UserId) -> Result<Option<CustomerProfile>>;

    /// Stores a vendor profile; a user has at most one.
    async fn create_vendor(&self, profile: NewVendorProfile) -> Result<VendorProfile>;

    /// Replaces the account details of the profile owned by `profile.user_id`.
    async fn update_vendor(&self, profile: NewVendorProfile) -> Result<Option<VendorProfile>>;

    async fn get_vendor(&self, user_id: &UserId) -> Result<Option<VendorProfile>>;
}
