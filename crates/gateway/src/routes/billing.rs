//! Billing endpoints, forwarded to the Billing Service.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{CustomerProfile, Invoice, NewInvoice, Validate, VendorProfile};
use service_kit::{JsonBody, RequestContext};

use super::{AppState, segment};
use crate::error::Result;

/// GET /api/billing/invoice/{id}
#[tracing::instrument(skip(state, ctx))]
pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Invoice>> {
    Ok(Json(
        state
            .billing
            .get(&ctx, &format!("/api/invoice/{}", segment(&id)))
            .await?
            .into_json()?,
    ))
}

/// POST /api/billing/invoice
#[tracing::instrument(skip(state, ctx, invoice))]
pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    JsonBody(invoice): JsonBody<NewInvoice>,
) -> Result<Json<Invoice>> {
    invoice.validate()?;
    Ok(Json(
        state
            .billing
            .post_json(&ctx, "/api/invoice", &invoice)
            .await?
            .into_json()?,
    ))
}

/// GET /api/billing/customer/{userId}
#[tracing::instrument(skip(state, ctx))]
pub async fn customer(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
) -> Result<Json<CustomerProfile>> {
    Ok(Json(
        state
            .billing
            .get(&ctx, &format!("/api/customer/{}", segment(&user_id)))
            .await?
            .into_json()?,
    ))
}

/// GET /api/billing/vendor/{userId}
#[tracing::instrument(skip(state, ctx))]
pub async fn vendor(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
) -> Result<Json<VendorProfile>> {
    Ok(Json(
        state
            .billing
            .get(&ctx, &format!("/api/vendor/{}", segment(&user_id)))
            .await?
            .into_json()?,
    ))
}

/// GET /api/billing/customer/{userId}/invoices
#[tracing::instrument(skip(state, ctx))]
pub async fn customer_invoices(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Invoice>>> {
    let path = format!("/api/customer/{}/invoices", segment(&user_id));
    invoices(&state, &ctx, &path).await
}

/// GET /api/billing/vendor/{userId}/invoices
#[tracing::instrument(skip(state, ctx))]
pub async fn vendor_invoices(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Invoice>>> {
    let path = format!("/api/vendor/{}/invoices", segment(&user_id));
    invoices(&state, &ctx, &path).await
}

async fn invoices(
    state: &AppState,
    ctx: &RequestContext,
    path: &str,
) -> Result<Json<Vec<Invoice>>> {
    Ok(Json(state.billing.get(ctx, path).await?.into_json()?))
}
