//! User endpoints, backed by the User Directory and the Billing Service.
//!
//! A customer or vendor is two records: the user itself and its billing
//! profile. Creation writes the user first; if the profile cannot be written
//! the user is left in place and the call fails with a 500.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{
    Bike, CustomerProfile, NewCustomerProfile, NewVendorProfile, User, UserId, UserPatch, UserType,
    Validate, ValidationErrors, VendorProfile,
};
use futures_util::future::join_all;
use serde::Deserialize;
use service_kit::{DownstreamResponse, JsonBody, RequestContext};

use super::{AppState, check_user_id, fetch_user, segment};
use crate::error::{ApiError, Result};

// -- Request types --

/// Profile fields shared by customer and vendor sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDetails {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: String,
}

impl UserDetails {
    fn into_user(self, user_type: UserType) -> User {
        User {
            id: UserId::generate(),
            name: self.name,
            address: self.address,
            phone: self.phone.filter(|p| !p.trim().is_empty()),
            email: self.email,
            user_type,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCustomerRequest {
    #[serde(flatten)]
    pub details: UserDetails,
    pub cc_number: String,
    pub cc_expiry: String,
    #[serde(rename = "ccCCV")]
    pub cc_ccv: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateVendorRequest {
    #[serde(flatten)]
    pub details: UserDetails,
    pub routing_number: String,
    pub account_number: String,
}

/// Partial update of a user and its billing profile.
///
/// Billing fields that do not belong to the user's type are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    #[serde(flatten)]
    pub profile: UserPatch,
    pub cc_number: Option<String>,
    pub cc_expiry: Option<String>,
    #[serde(rename = "ccCCV")]
    pub cc_ccv: Option<String>,
    pub routing_number: Option<String>,
    pub account_number: Option<String>,
}

fn pick(update: Option<String>, current: String) -> String {
    update.filter(|v| !v.trim().is_empty()).unwrap_or(current)
}

fn is_supplied(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl UpdateUserRequest {
    fn touches_customer_billing(&self) -> bool {
        is_supplied(&self.cc_number) || is_supplied(&self.cc_expiry) || is_supplied(&self.cc_ccv)
    }

    fn touches_vendor_billing(&self) -> bool {
        is_supplied(&self.routing_number) || is_supplied(&self.account_number)
    }
}

// -- Handlers --

/// GET /api/user/allUsers
#[tracing::instrument(skip(state, ctx))]
pub async fn all(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.users.get(&ctx, "/api/allUsers").await?.into_json()?))
}

/// GET /api/user/{id}
#[tracing::instrument(skip(state, ctx))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    check_user_id(&id)?;
    Ok(Json(fetch_user(&state, &ctx, &id).await?))
}

/// GET /api/user/{id}/bikes: bikes listed by the user.
#[tracing::instrument(skip(state, ctx))]
pub async fn bikes(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Vec<Bike>>> {
    check_user_id(&id)?;
    Ok(Json(owned_bikes(&state, &ctx, &id).await?))
}

/// POST /api/user: creates a customer and its payment details.
#[tracing::instrument(skip(state, ctx, request))]
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    JsonBody(request): JsonBody<CreateCustomerRequest>,
) -> Result<Json<User>> {
    let user = request.details.into_user(UserType::Customer);
    let profile = NewCustomerProfile {
        user_id: user.id.to_string(),
        cc_number: request.cc_number,
        cc_expiry: request.cc_expiry,
        cc_ccv: request.cc_ccv,
    };
    let mut errors = ValidationErrors::new();
    errors.merge(user.validate());
    errors.merge(profile.validate());
    errors.into_result()?;

    let user = create_user(&state, &ctx, &user).await?;
    let _: CustomerProfile = state
        .billing
        .post_json(&ctx, "/api/customer", &profile)
        .await
        .and_then(DownstreamResponse::into_json)
        .map_err(|e| {
            ApiError::Internal(format!(
                "Billing service could not create customer billing data: {e}"
            ))
        })?;

    tracing::info!(user_id = %user.id, "customer created");
    Ok(Json(user))
}

/// POST /api/user/vendor: creates a vendor and its payout details.
#[tracing::instrument(skip(state, ctx, request))]
pub async fn create_vendor(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    JsonBody(request): JsonBody<CreateVendorRequest>,
) -> Result<Json<User>> {
    let user = request.details.into_user(UserType::Vendor);
    let profile = NewVendorProfile {
        user_id: user.id.to_string(),
        routing_number: request.routing_number,
        account_number: request.account_number,
    };
    let mut errors = ValidationErrors::new();
    errors.merge(user.validate());
    errors.merge(profile.validate());
    errors.into_result()?;

    let user = create_user(&state, &ctx, &user).await?;
    let _: VendorProfile = state
        .billing
        .post_json(&ctx, "/api/vendor", &profile)
        .await
        .and_then(DownstreamResponse::into_json)
        .map_err(|e| {
            ApiError::Internal(format!(
                "Billing service could not create vendor billing data: {e}"
            ))
        })?;

    tracing::info!(user_id = %user.id, "vendor created");
    Ok(Json(user))
}

/// PATCH /api/user/{id}: blank or absent fields keep their stored value.
#[tracing::instrument(skip(state, ctx, request))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> Result<Json<User>> {
    check_user_id(&id)?;
    let existing = fetch_user(&state, &ctx, &id).await?;
    let touches_billing = match existing.user_type {
        UserType::Customer => request.touches_customer_billing(),
        UserType::Vendor => request.touches_vendor_billing(),
    };

    let merged = request.profile.clone().merge_into(&existing);
    merged.validate()?;
    let updated: User = state
        .users
        .put_json(&ctx, &format!("/api/users/{}", segment(&id)), &merged)
        .await?
        .into_json()?;

    if touches_billing {
        match updated.user_type {
            UserType::Customer => update_customer_billing(&state, &ctx, &id, request).await?,
            UserType::Vendor => update_vendor_billing(&state, &ctx, &id, request).await?,
        }
    }

    Ok(Json(updated))
}

/// DELETE /api/user/{id}: deletes the user's bikes, then the user.
#[tracing::instrument(skip(state, ctx))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<DownstreamResponse> {
    check_user_id(&id)?;
    fetch_user(&state, &ctx, &id).await?;

    let bikes = owned_bikes(&state, &ctx, &id).await?;
    let deletions = bikes.iter().map(|bike| {
        let path = format!("/api/bikes/{}", bike.id);
        let ctx = &ctx;
        let state = &state;
        async move {
            let outcome = state
                .bikes
                .delete(ctx, &path)
                .await
                .and_then(DownstreamResponse::error_for_status);
            if let Err(e) = outcome {
                tracing::warn!(
                    bike_id = %bike.id,
                    error = %e,
                    "could not delete bike of removed user"
                );
            }
        }
    });
    join_all(deletions).await;
    tracing::info!(user_id = %id, bikes = bikes.len(), "deleted bikes owned by user");

    Ok(state
        .users
        .delete(&ctx, &format!("/api/users/{}", segment(&id)))
        .await?
        .error_for_status()?)
}

// -- Helpers --

async fn create_user(state: &AppState, ctx: &RequestContext, user: &User) -> Result<User> {
    Ok(state
        .users
        .post_json(ctx, "/api/users", user)
        .await?
        .into_json()?)
}

async fn owned_bikes(state: &AppState, ctx: &RequestContext, user_id: &str) -> Result<Vec<Bike>> {
    let bikes: Vec<Bike> = state.bikes.get(ctx, "/api/allbikes").await?.into_json()?;
    Ok(bikes
        .into_iter()
        .filter(|bike| bike.owner_user_id.as_str().eq_ignore_ascii_case(user_id))
        .collect())
}

async fn update_customer_billing(
    state: &AppState,
    ctx: &RequestContext,
    user_id: &str,
    request: UpdateUserRequest,
) -> Result<()> {
    let current: CustomerProfile = state
        .billing
        .get(ctx, &format!("/api/customer/{}", segment(user_id)))
        .await
        .and_then(DownstreamResponse::into_json)
        .map_err(|e| ApiError::Internal(format!("Could not find customer billing details: {e}")))?;

    let profile = NewCustomerProfile {
        user_id: user_id.to_string(),
        cc_number: pick(request.cc_number, current.cc_number),
        cc_expiry: pick(request.cc_expiry, current.cc_expiry),
        cc_ccv: pick(request.cc_ccv, current.cc_ccv),
    };
    let _: CustomerProfile = state
        .billing
        .patch_json(ctx, "/api/customer", &profile)
        .await
        .and_then(DownstreamResponse::into_json)
        .map_err(|e| {
            ApiError::Internal(format!("Could not update customer billing details: {e}"))
        })?;
    Ok(())
}

async fn update_vendor_billing(
    state: &AppState,
    ctx: &RequestContext,
    user_id: &str,
    request: UpdateUserRequest,
) -> Result<()> {
    let current: VendorProfile = state
        .billing
        .get(ctx, &format!("/api/vendor/{}", segment(user_id)))
        .await
        .and_then(DownstreamResponse::into_json)
        .map_err(|e| ApiError::Internal(format!("Could not find vendor billing details: {e}")))?;

    let profile = NewVendorProfile {
        user_id: user_id.to_string(),
        routing_number: pick(request.routing_number, current.routing_number),
        account_number: pick(request.account_number, current.account_number),
    };
    let _: VendorProfile = state
        .billing
        .patch_json(ctx, "/api/vendor", &profile)
        .await
        .and_then(DownstreamResponse::into_json)
        .map_err(|e| ApiError::Internal(format!("Could not update vendor billing details: {e}")))?;
    Ok(())
}
