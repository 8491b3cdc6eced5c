use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{
    CustomerProfile, Invoice, NewCustomerProfile, NewInvoice, NewVendorProfile, RecordId,
    ReservationId, UserId, Validate, VendorProfile,
};
use tokio::sync::RwLock;

use crate::error::{BillingError, Result};
use crate::store::{BillingStore, Party};

#[derive(Default)]
struct BillingState {
    invoices: HashMap<RecordId, Invoice>,
    customers: HashMap<UserId, CustomerProfile>,
    vendors: HashMap<UserId, VendorProfile>,
}

/// In-memory billing store used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct InMemoryBillingStore {
    state: Arc<RwLock<BillingState>>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn invoice_count(&self) -> usize {
        self.state.read().await.invoices.len()
    }
}

#[async_trait]
impl BillingStore for InMemoryBillingStore {
    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice> {
        let invoice = invoice.into_invoice(RecordId::new())?;
        let mut state = self.state.write().await;
        if state
            .invoices
            .values()
            .any(|i| i.reservation_id == invoice.reservation_id)
        {
            return Err(BillingError::DuplicateInvoice(invoice.reservation_id));
        }
        state.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn get_invoice(&self, id: RecordId) -> Result<Option<Invoice>> {
        Ok(self.state.read().await.invoices.get(&id).cloned())
    }

    async fn invoice_for_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Option<Invoice>> {
        Ok(self
            .state
            .read()
            .await
            .invoices
            .values()
            .find(|i| &i.reservation_id == reservation_id)
            .cloned())
    }

    async fn invoices_for(&self, party: Party, user_id: &UserId) -> Result<Vec<Invoice>> {
        let state = self.state.read().await;
        let mut invoices: Vec<Invoice> = state
            .invoices
            .values()
            .filter(|i| match party {
                Party::Customer => &i.customer_id == user_id,
                Party::Vendor => &i.vendor_id == user_id,
            })
            .cloned()
            .collect();
        invoices.sort_by(|a, b| a.reservation_id.cmp(&b.reservation_id));
        Ok(invoices)
    }

    async fn create_customer(&self, profile: NewCustomerProfile) -> Result<CustomerProfile> {
        profile.validate()?;
        let profile = profile.into_profile(RecordId::new());
        let mut state = self.state.write().await;
        if state.customers.contains_key(&profile.user_id) {
            return Err(BillingError::ProfileExists(profile.user_id));
        }
        state.customers.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn update_customer(
        &self,
        profile: NewCustomerProfile,
    ) -> Result<Option<CustomerProfile>> {
        profile.validate()?;
        let mut state = self.state.write().await;
        let user_id = UserId::new(profile.user_id.clone());
        Ok(state.customers.get_mut(&user_id).map(|existing| {
            *existing = profile.into_profile(existing.id);
            existing.clone()
        }))
    }

    async fn get_customer(&self, user_id: &UserId) -> Result<Option<CustomerProfile>> {
        Ok(self.state.read().await.customers.get(user_id).cloned())
    }

    async fn create_vendor(&self, profile: NewVendorProfile) -> Result<VendorProfile> {
        profile.validate()?;
        let profile = profile.into_profile(RecordId::new());
        let mut state = self.state.write().await;
        if state.vendors.contains_key(&profile.user_id) {
            return Err(BillingError::ProfileExists(profile.user_id));
        }
        state.vendors.insert(profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn update_vendor(&self, profile: NewVendorProfile) -> Result<Option<VendorProfile>> {
        profile.validate()?;
        let mut state = self.state.write().await;
        let user_id = UserId::new(profile.user_id.clone());
        Ok(state.vendors.get_mut(&user_id).map(|existing| {
            *existing = profile.into_profile(existing.id);
            existing.clone()
        }))
    }

    async fn get_vendor(&self, user_id: &UserId) -> Result<Option<VendorProfile>> {
        Ok(self.state.read().await.vendors.get(user_id).cloned())
    }
}
