//! Router-level tests for the Reservation Store.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{BikeId, RequestId, Reservation, UserId};
use metrics_exporter_prometheus::PrometheusBuilder;
use reservations::InMemoryReservationStore;
use serde_json::{Value, json};
use tower::ServiceExt;

fn setup() -> axum::Router {
    let handle = PrometheusBuilder::new().build_recorder().handle();
    reservations::create_app(InMemoryReservationStore::new(), handle)
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

fn booking(user: &str) -> Value {
    let reservation =
        Reservation::booking(UserId::new(user), BikeId::new(), None, RequestId::new());
    serde_json::to_value(reservation).unwrap()
}

#[tokio::test]
async fn test_create_and_get() {
    let app = setup();
    let reservation = booking("c1");
    let (status, created) = send(&app, "POST", "/api/reservation", Some(reservation.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created, reservation);

    let id = reservation["reservationId"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/api/reservation/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["state"], "Booking");
    assert_eq!(fetched["endTime"], "");
}

#[tokio::test]
async fn test_duplicate_reservation_is_rejected() {
    let app = setup();
    let reservation = booking("c1");
    send(&app, "POST", "/api/reservation", Some(reservation.clone())).await;
    let (status, _) = send(&app, "POST", "/api/reservation", Some(reservation)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_incomplete_reservation_is_rejected() {
    let app = setup();
    let (status, _) = send(&app, "POST", "/api/reservation", Some(json!({ "userId": "c1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut reservation = booking("c1");
    reservation["userId"] = json!("");
    let (status, body) = send(&app, "POST", "/api/reservation", Some(reservation)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "userId");
}

#[tokio::test]
async fn test_missing_reservation_is_404() {
    let app = setup();
    let (status, body) = send(&app, "GET", "/api/reservation/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_state_update_reports_counts() {
    let app = setup();
    let reservation = booking("c1");
    send(&app, "POST", "/api/reservation", Some(reservation.clone())).await;
    let id = reservation["reservationId"].as_str().unwrap();
    let uri = format!("/api/reservation/{id}/state");

    let update = json!({ "state": "Booked", "endTime": "" });
    let (status, result) = send(&app, "PATCH", &uri, Some(update.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result, json!({ "matchedCount": 1, "modifiedCount": 1 }));

    let (_, again) = send(&app, "PATCH", &uri, Some(update.clone())).await;
    assert_eq!(again, json!({ "matchedCount": 1, "modifiedCount": 0 }));

    let (status, missing) = send(&app, "PATCH", "/api/reservation/nope/state", Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(missing, json!({ "matchedCount": 0, "modifiedCount": 0 }));

    let (_, fetched) = send(&app, "GET", &format!("/api/reservation/{id}"), None).await;
    assert_eq!(fetched["state"], "Booked");
}

#[tokio::test]
async fn test_list_endpoints() {
    let app = setup();
    let first = booking("c1");
    send(&app, "POST", "/api/reservation", Some(first.clone())).await;
    send(&app, "POST", "/api/reservation", Some(booking("c1"))).await;
    send(&app, "POST", "/api/reservation", Some(booking("c2"))).await;

    let id = first["reservationId"].as_str().unwrap();
    send(
        &app,
        "PATCH",
        &format!("/api/reservation/{id}/state"),
        Some(json!({ "state": "Booked" })),
    )
    .await;

    let (status, all) = send(&app, "GET", "/api/allReservations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, mine) = send(&app, "GET", "/api/user/c1/reservations", None).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (_, booked) = send(&app, "GET", "/api/user/c1/reservations?state=Booked", None).await;
    let booked = booked.as_array().unwrap();
    assert_eq!(booked.len(), 1);
    assert_eq!(booked[0]["reservationId"], id);

    let (status, _) = send(&app, "GET", "/api/user/c1/reservations?state=Pending", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
