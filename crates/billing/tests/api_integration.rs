//! Router-level tests for the Billing service.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use billing::InMemoryBillingStore;
use common::BikeId;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{Value, json};
use tower::ServiceExt;

fn setup() -> axum::Router {
    let handle = PrometheusBuilder::new().build_recorder().handle();
    billing::create_app(InMemoryBillingStore::new(), handle)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn invoice(reservation: &str, amount: f64) -> Value {
    json!({
        "reservationId": reservation,
        "customerId": "c1",
        "vendorId": "v1",
        "bikeId": BikeId::new().to_string(),
        "amount": amount
    })
}

#[tokio::test]
async fn test_create_and_fetch_invoice() {
    let app = setup();
    let (status, created) = send(&app, "POST", "/api/invoice", Some(invoice("r1", 15.0))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["amount"], 15.0);

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/api/invoice/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, by_reservation) = send(&app, "GET", "/api/reservation/r1/invoice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_reservation, created);
}

#[tokio::test]
async fn test_reservation_without_invoice_is_404() {
    let app = setup();
    let (status, _) = send(&app, "GET", "/api/reservation/r1/invoice", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invoice_id_must_be_valid() {
    let app = setup();
    let (status, _) = send(&app, "GET", "/api/invoice/xyz", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_second_invoice_for_reservation_is_rejected() {
    let app = setup();
    send(&app, "POST", "/api/invoice", Some(invoice("r1", 15.0))).await;
    let (status, _) = send(&app, "POST", "/api/invoice", Some(invoice("r1", 20.0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invoice_with_id_is_rejected() {
    let app = setup();
    let mut payload = invoice("r1", 15.0);
    payload["id"] = json!("abc");
    let (status, body) = send(&app, "POST", "/api/invoice", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "id");
}

#[tokio::test]
async fn test_invoice_listings() {
    let app = setup();
    let (status, _) = send(&app, "GET", "/api/customer/c1/invoices", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, "POST", "/api/invoice", Some(invoice("r1", 15.0))).await;
    send(&app, "POST", "/api/invoice", Some(invoice("r2", 5.0))).await;

    let (status, customer) = send(&app, "GET", "/api/customer/c1/invoices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customer.as_array().unwrap().len(), 2);

    let (status, vendor) = send(&app, "GET", "/api/vendor/v1/invoices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vendor.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_customer_profile_routes() {
    let app = setup();
    let profile = json!({
        "userId": "c1",
        "ccNumber": "4111111111111111",
        "ccExpiry": "12/30",
        "ccCCV": "123"
    });
    let (status, created) = send(&app, "POST", "/api/customer", Some(profile.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["ccCCV"], "123");

    let (status, _) = send(&app, "POST", "/api/customer", Some(profile)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let update = json!({
        "userId": "c1",
        "ccNumber": "5500000000000004",
        "ccExpiry": "01/31",
        "ccCCV": "999"
    });
    let (status, updated) = send(&app, "PATCH", "/api/customer", Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);

    let (status, fetched) = send(&app, "GET", "/api/customer/c1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["ccNumber"], "5500000000000004");
}

#[tokio::test]
async fn test_vendor_profile_routes() {
    let app = setup();
    let (status, body) = send(&app, "POST", "/api/vendor", Some(json!({ "userId": "v1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].as_array().unwrap().len() >= 2);

    let profile = json!({ "userId": "v1", "routingNumber": "111000025", "accountNumber": "42" });
    let (status, _) = send(&app, "POST", "/api/vendor", Some(profile)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, fetched) = send(&app, "GET", "/api/vendor/v1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["routingNumber"], "111000025");

    let (status, _) = send(&app, "GET", "/api/vendor/v2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
