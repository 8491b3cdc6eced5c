//! Billing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{
    CustomerProfile, Invoice, NewCustomerProfile, NewInvoice, NewVendorProfile, RecordId,
    ReservationId, UserId, VendorProfile,
};
use service_kit::JsonBody;

use crate::error::{BillingError, Result};
use crate::store::{BillingStore, Party};

/// Shared application state accessible from all handlers.
pub struct AppState<S: BillingStore> {
    pub store: S,
}

/// POST /api/invoice
#[tracing::instrument(skip(state, invoice))]
pub async fn create_invoice<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(invoice): JsonBody<NewInvoice>,
) -> Result<Json<Invoice>> {
    let invoice = state.store.create_invoice(invoice).await?;
    tracing::info!(
        invoice_id = %invoice.id,
        reservation_id = %invoice.reservation_id,
        amount = invoice.amount,
        "invoice created"
    );
    Ok(Json(invoice))
}

/// GET /api/invoice/{id}
#[tracing::instrument(skip(state))]
pub async fn get_invoice<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>> {
    let id: RecordId = id.trim().parse().map_err(|_| BillingError::InvalidId(id))?;
    state
        .store
        .get_invoice(id)
        .await?
        .map(Json)
        .ok_or_else(|| BillingError::NotFound("Invoice".to_string()))
}

/// GET /api/reservation/{id}/invoice
#[tracing::instrument(skip(state))]
pub async fn invoice_for_reservation<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(reservation_id): Path<String>,
) -> Result<Json<Invoice>> {
    state
        .store
        .invoice_for_reservation(&ReservationId::new(reservation_id))
        .await?
        .map(Json)
        .ok_or_else(|| BillingError::NotFound("Invoice".to_string()))
}

async fn invoices_for<S: BillingStore>(
    store: &S,
    party: Party,
    user_id: String,
) -> Result<Json<Vec<Invoice>>> {
    let invoices = store.invoices_for(party, &UserId::new(user_id)).await?;
    if invoices.is_empty() {
        return Err(BillingError::NotFound("Invoices".to_string()));
    }
    Ok(Json(invoices))
}

/// POST /api/customer
#[tracing::instrument(skip(state, profile))]
pub async fn create_customer<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(profile): JsonBody<NewCustomerProfile>,
) -> Result<Json<CustomerProfile>> {
    let profile = state.store.create_customer(profile).await?;
    tracing::info!(user_id = %profile.user_id, "customer billing profile created");
    Ok(Json(profile))
}

/// PATCH /api/customer
#[tracing::instrument(skip(state, profile))]
pub async fn update_customer<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(profile): JsonBody<NewCustomerProfile>,
) -> Result<Json<CustomerProfile>> {
    state
        .store
        .update_customer(profile)
        .await?
        .map(Json)
        .ok_or_else(|| BillingError::NotFound("Customer".to_string()))
}

/// GET /api/customer/{userId}
#[tracing::instrument(skip(state))]
pub async fn get_customer<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<CustomerProfile>> {
    state
        .store
        .get_customer(&UserId::new(user_id))
        .await?
        .map(Json)
        .ok_or_else(|| BillingError::NotFound("Customer".to_string()))
}

/// GET /api/customer/{userId}/invoices
#[tracing::instrument(skip(state))]
pub async fn customer_invoices<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Invoice>>> {
    invoices_for(&state.store, Party::Customer, user_id).await
}

/// POST /api/vendor
#[tracing::instrument(skip(state, profile))]
pub async fn create_vendor<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(profile): JsonBody<NewVendorProfile>,
) -> Result<Json<VendorProfile>> {
    let profile = state.store.create_vendor(profile).await?;
    tracing::info!(user_id = %profile.user_id, "vendor billing profile created");
    Ok(Json(profile))
}

/// PATCH /api/vendor
#[tracing::instrument(skip(state, profile))]
pub async fn update_vendor<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(profile): JsonBody<NewVendorProfile>,
) -> Result<Json<VendorProfile>> {
    state
        .store
        .update_vendor(profile)
        .await?
        .map(Json)
        .ok_or_else(|| BillingError::NotFound("Vendor".to_string()))
}

/// GET /api/vendor/{userId}
#[tracing::instrument(skip(state))]
pub async fn get_vendor<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<VendorProfile>> {
    state
        .store
        .get_vendor(&UserId::new(user_id))
        .await?
        .map(Json)
        .ok_or_else(|| BillingError::NotFound("Vendor".to_string()))
}

/// GET /api/vendor/{userId}/invoices
#[tracing::instrument(skip(state))]
pub async fn vendor_invoices<S: BillingStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Invoice>>> {
    invoices_for(&state.store, Party::Vendor, user_id).await
}
