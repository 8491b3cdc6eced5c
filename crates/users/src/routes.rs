//! User Directory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{User, UserId, UserUpdate};
use service_kit::JsonBody;

use crate::error::{Result, UserError};
use crate::store::UserStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: UserStore> {
    pub store: S,
}

/// GET /api/users/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    let id = UserId::new(id);
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or(UserError::NotFound(id))
}

/// GET /api/allUsers
#[tracing::instrument(skip(state))]
pub async fn all<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store.list_all().await?))
}

/// POST /api/users
#[tracing::instrument(skip(state, user))]
pub async fn create<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(user): JsonBody<User>,
) -> Result<Json<User>> {
    let user = state.store.insert(user).await?;
    tracing::info!(user_id = %user.id, user_type = %user.user_type, "user created");
    Ok(Json(user))
}

/// PUT /api/users/{id}
#[tracing::instrument(skip(state, update))]
pub async fn update<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<User>> {
    let id = UserId::new(id);
    state
        .store
        .update(&id, update)
        .await?
        .map(Json)
        .ok_or(UserError::NotFound(id))
}

/// DELETE /api/users/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = UserId::new(id);
    if !state.store.delete(&id).await? {
        return Err(UserError::NotFound(id));
    }
    tracing::info!(user_id = %id, "user deleted");
    Ok(StatusCode::ACCEPTED)
}
