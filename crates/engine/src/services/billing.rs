//! Billing Service collaborator.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::{Invoice, NewInvoice, RecordId};
use service_kit::{RequestContext, ServiceClient};

use crate::error::{EngineError, Result};

const SERVICE: &str = "billing";

/// Invoice creation as the workflow needs it.
#[async_trait]
pub trait BillingService: Send + Sync {
    /// Raises an invoice, returning it with its assigned id.
    async fn create_invoice(&self, ctx: &RequestContext, invoice: &NewInvoice) -> Result<Invoice>;
}

/// Billing Service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBillingService {
    client: ServiceClient,
}

impl HttpBillingService {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BillingService for HttpBillingService {
    async fn create_invoice(&self, ctx: &RequestContext, invoice: &NewInvoice) -> Result<Invoice> {
        Ok(self
            .client
            .post_json(ctx, "/api/invoice", invoice)
            .await?
            .into_json()?)
    }
}

#[derive(Debug, Default)]
struct InMemoryBillingState {
    invoices: Vec<Invoice>,
    fail_on_create: bool,
}

/// In-memory billing service for tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingService {
    state: Arc<Mutex<InMemoryBillingState>>,
}

impl InMemoryBillingService {
    /// Creates a new in-memory billing service.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryBillingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configures the service to fail every invoice creation.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.lock().fail_on_create = fail;
    }

    /// Every invoice raised so far.
    pub fn invoices(&self) -> Vec<Invoice> {
        self.lock().invoices.clone()
    }
}

#[async_trait]
impl BillingService for InMemoryBillingService {
    async fn create_invoice(&self, _ctx: &RequestContext, invoice: &NewInvoice) -> Result<Invoice> {
        let mut state = self.lock();
        if state.fail_on_create {
            return Err(EngineError::Unavailable {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }
        let invoice = invoice
            .clone()
            .into_invoice(RecordId::new())
            .map_err(|errors| EngineError::Rejected {
                service: SERVICE,
                reason: errors.to_string(),
            })?;
        state.invoices.push(invoice.clone());
        Ok(invoice)
    }
}
