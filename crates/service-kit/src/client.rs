//! Outbound calls to sibling services.
//!
//! [`ServiceClient`] is the only place requests to another service are
//! built. It stamps the correlation header, logs every call and records
//! the `downstream_*` metrics.

use std::time::{Duration, Instant};

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::context::{REQUEST_ID_HEADER, RequestContext};
use crate::error::{BootstrapError, error_response};

/// Builds the HTTP client shared by every [`ServiceClient`] of a process.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, BootstrapError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Errors from calling another service.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// The service answered with a non-2xx status.
    #[error("{service} service returned {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        content_type: Option<String>,
        body: String,
    },

    /// The service could not be reached or the body could not be read.
    #[error("{service} service is unavailable: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered 2xx with a body of the wrong shape.
    #[error("{service} service returned an unexpected payload: {source}")]
    UnexpectedPayload {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl DownstreamError {
    /// Status reported by the downstream service, if it answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DownstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

impl IntoResponse for DownstreamError {
    /// A non-2xx answer is relayed unchanged; anything else is a 500 naming the service.
    fn into_response(self) -> Response {
        match self {
            DownstreamError::Status {
                status,
                content_type,
                body,
                ..
            } => {
                let content_type = content_type
                    .and_then(|ct| HeaderValue::from_str(&ct).ok())
                    .unwrap_or_else(|| HeaderValue::from_static("text/plain; charset=utf-8"));
                (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
            }
            DownstreamError::Transport { service, .. } => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{service} service is unavailable"),
            ),
            DownstreamError::UnexpectedPayload { service, .. } => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{service} service returned an unexpected payload"),
            ),
        }
    }
}

/// A fully read response from another service.
#[derive(Debug, Clone)]
pub struct DownstreamResponse {
    pub service: &'static str,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl DownstreamResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turns a non-2xx response into [`DownstreamError::Status`].
    pub fn error_for_status(self) -> Result<Self, DownstreamError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(DownstreamError::Status {
                service: self.service,
                status: self.status,
                content_type: self.content_type,
                body: self.body,
            })
        }
    }

    /// Decodes the body as JSON regardless of status.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DownstreamError> {
        serde_json::from_str(&self.body).map_err(|source| DownstreamError::UnexpectedPayload {
            service: self.service,
            source,
        })
    }

    /// Decodes a 2xx body, or fails with the downstream status.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, DownstreamError> {
        self.error_for_status()?.json()
    }
}

impl IntoResponse for DownstreamResponse {
    /// Relays the response unchanged.
    fn into_response(self) -> Response {
        DownstreamError::Status {
            service: self.service,
            status: self.status,
            content_type: self.content_type,
            body: self.body,
        }
        .into_response()
    }
}

/// Client for one sibling service rooted at `base_url`.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    service: &'static str,
    base_url: String,
    http: reqwest::Client,
}

impl ServiceClient {
    /// Creates a client for `service`; `base_url` has no trailing slash.
    pub fn new(service: &'static str, base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            service,
            base_url: base_url.into(),
            http,
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(
        &self,
        ctx: &RequestContext,
        path: &str,
    ) -> Result<DownstreamResponse, DownstreamError> {
        self.send(ctx, Method::GET, path, |req| req).await
    }

    pub async fn delete(
        &self,
        ctx: &RequestContext,
        path: &str,
    ) -> Result<DownstreamResponse, DownstreamError> {
        self.send(ctx, Method::DELETE, path, |req| req).await
    }

    /// Sends a PATCH with no body.
    pub async fn patch(
        &self,
        ctx: &RequestContext,
        path: &str,
    ) -> Result<DownstreamResponse, DownstreamError> {
        self.send(ctx, Method::PATCH, path, |req| req).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &T,
    ) -> Result<DownstreamResponse, DownstreamError> {
        self.send(ctx, Method::POST, path, |req| req.json(body)).await
    }

    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &T,
    ) -> Result<DownstreamResponse, DownstreamError> {
        self.send(ctx, Method::PUT, path, |req| req.json(body)).await
    }

    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &T,
    ) -> Result<DownstreamResponse, DownstreamError> {
        self.send(ctx, Method::PATCH, path, |req| req.json(body)).await
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        build: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<DownstreamResponse, DownstreamError> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = ctx.request_id;
        let request = self
            .http
            .request(method.clone(), &url)
            .header(REQUEST_ID_HEADER, request_id.to_string());

        let started = Instant::now();
        let result = build(request).send().await;
        let elapsed = started.elapsed();
        metrics::histogram!("downstream_request_duration_seconds", "service" => self.service)
            .record(elapsed.as_secs_f64());
        let elapsed_ms = elapsed.as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(source) => {
                metrics::counter!(
                    "downstream_requests_total",
                    "service" => self.service,
                    "status" => "error"
                )
                .increment(1);
                tracing::error!(
                    service = self.service,
                    %method,
                    %url,
                    %request_id,
                    elapsed_ms,
                    error = %source,
                    "downstream request failed"
                );
                return Err(DownstreamError::Transport {
                    service: self.service,
                    source,
                });
            }
        };

        let status = response.status();
        metrics::counter!(
            "downstream_requests_total",
            "service" => self.service,
            "status" => status.as_u16().to_string()
        )
        .increment(1);
        if status.is_success() {
            tracing::info!(
                service = self.service,
                %method,
                %url,
                status = status.as_u16(),
                %request_id,
                elapsed_ms,
                "downstream request"
            );
        } else {
            tracing::warn!(
                service = self.service,
                %method,
                %url,
                status = status.as_u16(),
                %request_id,
                elapsed_ms,
                "downstream request returned error status"
            );
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|source| DownstreamError::Transport {
                service: self.service,
                source,
            })?;

        Ok(DownstreamResponse {
            service: self.service,
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: StatusCode, body: &str) -> DownstreamResponse {
        DownstreamResponse {
            service: "bikes",
            status,
            content_type: Some("application/json".to_string()),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_into_json_decodes_success() {
        let value: serde_json::Value = response(StatusCode::OK, r#"{"id":"b1"}"#)
            .into_json()
            .unwrap();
        assert_eq!(value["id"], "b1");
    }

    #[test]
    fn test_error_status_is_kept() {
        let err = response(StatusCode::NOT_FOUND, r#"{"error":"Bike not found"}"#)
            .into_json::<serde_json::Value>()
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_bad_payload_is_unexpected() {
        let err = response(StatusCode::OK, "not json")
            .into_json::<serde_json::Value>()
            .unwrap_err();
        assert!(matches!(err, DownstreamError::UnexpectedPayload { service: "bikes", .. }));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_status_error_is_relayed_verbatim() {
        let err = response(StatusCode::BAD_REQUEST, r#"{"error":"Invalid reservation"}"#)
            .error_for_status()
            .unwrap_err();
        let relayed = err.into_response();
        assert_eq!(relayed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            relayed.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = axum::body::to_bytes(relayed.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"error":"Invalid reservation"}"#);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_500() {
        let http = http_client(Duration::from_secs(1)).unwrap();
        let client = ServiceClient::new("billing", "http://127.0.0.1:9", http);
        let err = client
            .get(&RequestContext::detached(), "/health")
            .await
            .unwrap_err();
        assert!(matches!(err, DownstreamError::Transport { service: "billing", .. }));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
