//! Per-request correlation context.
//!
//! Every inbound call carries an `x-request-id` header. The gateway mints a
//! fresh id for each external request; the other services keep the id they
//! are given. Handlers receive a [`RequestContext`] and pass it to every
//! outbound call they make.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::HeaderValue;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use common::RequestId;

/// Header carrying the correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation data for one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: RequestId,
}

impl RequestContext {
    pub fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }

    /// Context with a freshly minted id, for work not triggered by a request.
    pub fn detached() -> Self {
        Self::new(RequestId::new())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = read_request_id(parts.headers.get(REQUEST_ID_HEADER))
            .unwrap_or_default();
        Ok(Self::new(request_id))
    }
}

fn read_request_id(value: Option<&HeaderValue>) -> Option<RequestId> {
    value?.to_str().ok()?.trim().parse().ok()
}

fn set_request_id(request: &mut Request, request_id: RequestId) {
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
}

async fn run_with_id(request: Request, next: Next, request_id: RequestId) -> Response {
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Middleware that keeps a valid incoming request id and mints one otherwise.
pub async fn propagate_request_id(mut request: Request, next: Next) -> Response {
    let request_id = match read_request_id(request.headers().get(REQUEST_ID_HEADER)) {
        Some(id) => id,
        None => {
            let id = RequestId::new();
            set_request_id(&mut request, id);
            id
        }
    };
    run_with_id(request, next, request_id).await
}

/// Middleware that replaces any client-supplied request id with a fresh one.
pub async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::new();
    set_request_id(&mut request, request_id);
    run_with_id(request, next, request_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware;
    use axum::routing::get;
    use tower::ServiceExt;

    async fn echo(ctx: RequestContext) -> String {
        ctx.request_id.to_string()
    }

    async fn call(app: Router, header: Option<&str>) -> (String, String) {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(REQUEST_ID_HEADER, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let echoed = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (String::from_utf8(bytes.to_vec()).unwrap(), echoed)
    }

    #[tokio::test]
    async fn test_propagate_keeps_valid_id() {
        let app = Router::new()
            .route("/", get(echo))
            .layer(middleware::from_fn(propagate_request_id));
        let id = RequestId::new().to_string();

        let (seen, echoed) = call(app, Some(&id)).await;
        assert_eq!(seen, id);
        assert_eq!(echoed, id);
    }

    #[tokio::test]
    async fn test_propagate_replaces_garbage() {
        let app = Router::new()
            .route("/", get(echo))
            .layer(middleware::from_fn(propagate_request_id));

        let (seen, echoed) = call(app, Some("not-a-uuid")).await;
        assert!(seen.parse::<RequestId>().is_ok());
        assert_eq!(seen, echoed);
    }

    #[tokio::test]
    async fn test_assign_overwrites_client_id() {
        let app = Router::new()
            .route("/", get(echo))
            .layer(middleware::from_fn(assign_request_id));
        let client_id = RequestId::new().to_string();

        let (seen, echoed) = call(app, Some(&client_id)).await;
        assert_ne!(seen, client_id);
        assert_eq!(seen, echoed);
    }
}
