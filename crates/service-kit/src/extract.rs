//! Request extractors with the services' error shape.

use axum::Json;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::Response;
use serde::de::DeserializeOwned;

use crate::error::error_response;

/// JSON body whose rejections are reported as 400 `{"error": ...}`.
///
/// `axum::Json` answers 415/422 for some malformed bodies; callers of these
/// services only ever see 400 for a bad payload.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(error_response(StatusCode::BAD_REQUEST, rejection.body_text())),
        }
    }
}
