//! Route handlers, one module per downstream service.

pub mod bikes;
pub mod billing;
pub mod reservations;
pub mod users;

use std::borrow::Cow;

use common::{Bike, User};
use service_kit::{RequestContext, ServiceClient};

use crate::error::{ApiError, Result};

/// Shared application state: one client per downstream service.
pub struct AppState {
    pub bikes: ServiceClient,
    pub users: ServiceClient,
    pub billing: ServiceClient,
    pub reservations: ServiceClient,
    pub engine: ServiceClient,
}

/// Appends a raw query string, if any, to `path`.
pub(crate) fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    }
}

/// Percent-encodes a caller-supplied value for use as one path segment.
pub(crate) fn segment(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}

pub(crate) async fn fetch_user(
    state: &AppState,
    ctx: &RequestContext,
    user_id: &str,
) -> Result<User> {
    Ok(state
        .users
        .get(ctx, &format!("/api/users/{}", segment(user_id)))
        .await?
        .into_json()?)
}

pub(crate) async fn fetch_bike(
    state: &AppState,
    ctx: &RequestContext,
    bike_id: &str,
) -> Result<Bike> {
    Ok(state
        .bikes
        .get(ctx, &format!("/api/bikes/{}", segment(bike_id)))
        .await?
        .into_json()?)
}

/// Rejects ids that are not 32 hex digits, the form the gateway mints.
pub(crate) fn check_user_id(user_id: &str) -> Result<()> {
    if user_id.len() == 32 && user_id.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ApiError::InvalidUserId)
    }
}
