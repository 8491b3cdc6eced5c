//! Bike endpoints, backed by the Bike Directory.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, RawQuery, State};
use common::{Bike, BikeUpdate, NewBike, Validate};
use service_kit::{DownstreamResponse, JsonBody, RequestContext};

use super::{AppState, fetch_bike, fetch_user, segment, with_query};
use crate::error::{ApiError, Result};

/// GET /api/bike/availableBikes: filters are forwarded unchanged.
#[tracing::instrument(skip(state, ctx))]
pub async fn available(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<Bike>>> {
    let path = with_query("/api/availableBikes", query.as_deref());
    Ok(Json(state.bikes.get(&ctx, &path).await?.into_json()?))
}

/// GET /api/bike/{id}
#[tracing::instrument(skip(state, ctx))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Bike>> {
    Ok(Json(fetch_bike(&state, &ctx, &id).await?))
}

/// POST /api/bike: the owner must be an existing vendor.
#[tracing::instrument(skip(state, ctx, bike))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    JsonBody(bike): JsonBody<NewBike>,
) -> Result<Json<Bike>> {
    bike.validate()?;
    require_vendor(&state, &ctx, &bike.owner_user_id).await?;

    let created: Bike = state
        .bikes
        .post_json(&ctx, "/api/bikes", &bike)
        .await?
        .into_json()?;
    tracing::info!(bike_id = %created.id, owner = %created.owner_user_id, "bike added");
    Ok(Json(created))
}

/// PATCH /api/bike/{id}: supplied fields are merged over the stored bike.
#[tracing::instrument(skip(state, ctx, update))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<BikeUpdate>,
) -> Result<Json<Bike>> {
    let existing = fetch_bike(&state, &ctx, &id).await?;
    let merged = update.merge_into(&existing);
    merged.validate()?;

    let updated: Bike = state
        .bikes
        .put_json(&ctx, &format!("/api/bikes/{}", segment(&id)), &merged)
        .await?
        .into_json()?;
    Ok(Json(updated))
}

/// DELETE /api/bike/{id}
#[tracing::instrument(skip(state, ctx))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<DownstreamResponse> {
    Ok(state
        .bikes
        .delete(&ctx, &format!("/api/bikes/{}", segment(&id)))
        .await?
        .error_for_status()?)
}

async fn require_vendor(state: &AppState, ctx: &RequestContext, owner_user_id: &str) -> Result<()> {
    let owner = fetch_user(state, ctx, owner_user_id).await?;
    if !owner.is_vendor() {
        return Err(ApiError::BadRequest(
            "Owner user type must be Vendor".to_string(),
        ));
    }
    Ok(())
}
