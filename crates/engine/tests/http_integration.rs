//! End-to-end workflow runs against the real leaf services over HTTP.

use std::time::Duration;

use common::{Bike, Invoice, RequestId, Reservation, ReservationState, UserId};
use engine::{
    HttpBikeDirectory, HttpBillingService, HttpReservationStore, ReservationWorkflow,
    WorkflowCommand,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;
use service_kit::ServiceClient;
use tokio::net::TcpListener;

type HttpWorkflow =
    ReservationWorkflow<HttpBikeDirectory, HttpBillingService, HttpReservationStore>;

async fn spawn(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

struct Cluster {
    http: reqwest::Client,
    bikes_url: String,
    billing_url: String,
    reservations_url: String,
    workflow: HttpWorkflow,
}

impl Cluster {
    async fn start() -> Self {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let bikes_url =
            spawn(bikes::create_app(bikes::InMemoryBikeStore::new(), handle.clone())).await;
        let billing_url =
            spawn(billing::create_app(billing::InMemoryBillingStore::new(), handle.clone())).await;
        let reservations_url = spawn(reservations::create_app(
            reservations::InMemoryReservationStore::new(),
            handle,
        ))
        .await;

        let http = service_kit::http_client(Duration::from_secs(5)).unwrap();
        let workflow = ReservationWorkflow::new(
            HttpBikeDirectory::new(ServiceClient::new("bikes", &bikes_url, http.clone())),
            HttpBillingService::new(ServiceClient::new("billing", &billing_url, http.clone())),
            HttpReservationStore::new(ServiceClient::new(
                "reservations",
                &reservations_url,
                http.clone(),
            )),
        );
        Self {
            http,
            bikes_url,
            billing_url,
            reservations_url,
            workflow,
        }
    }

    async fn create_bike(&self, hourly_cost: f64) -> Bike {
        self.http
            .post(format!("{}/api/bikes", self.bikes_url))
            .json(&json!({
                "model": "Trek",
                "hourlyCost": hourly_cost,
                "imageUrl": "/static/logo.svg",
                "address": "1 Main St",
                "type": "road",
                "ownerUserId": "vendor-1",
                "suitableHeightInMeters": 1.8,
                "maximumWeightInKg": 110.0
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn get_bike(&self, bike: &Bike) -> Bike {
        self.http
            .get(format!("{}/api/bikes/{}", self.bikes_url, bike.id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn store(&self, reservation: &Reservation) -> Reservation {
        let response = self
            .http
            .post(format!("{}/api/reservation", self.reservations_url))
            .json(reservation)
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        response.json().await.unwrap()
    }

    async fn fetch(&self, reservation: &Reservation) -> Reservation {
        self.http
            .get(format!(
                "{}/api/reservation/{}",
                self.reservations_url, reservation.reservation_id
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn run(&self, reservation: Reservation) -> Reservation {
        let command = WorkflowCommand::from_reservation(reservation).unwrap();
        self.workflow.execute(command).await
    }
}

#[tokio::test]
async fn test_full_lifecycle_over_http() {
    let cluster = Cluster::start().await;
    let bike = cluster.create_bike(6.0).await;
    assert!(bike.available);

    let mut reservation =
        Reservation::booking(UserId::new("customer-1"), bike.id, None, RequestId::new());
    reservation.start_time = common::time::now() - chrono::Duration::minutes(30);
    let reservation = cluster.store(&reservation).await;

    let booked = cluster.run(reservation).await;
    assert_eq!(booked.state, ReservationState::Booked);
    assert!(!cluster.get_bike(&bike).await.available);
    assert_eq!(cluster.fetch(&booked).await.state, ReservationState::Booked);

    let mut completing = booked;
    completing.state = ReservationState::Completing;
    let completed = cluster.run(completing).await;
    assert_eq!(completed.state, ReservationState::Completed);
    assert!(cluster.get_bike(&bike).await.available);

    let stored = cluster.fetch(&completed).await;
    assert_eq!(stored.state, ReservationState::Completed);
    assert!(stored.end_time.is_some());
    let invoice_id = stored.invoice_id.unwrap();

    let invoice: Invoice = cluster
        .http
        .get(format!(
            "{}/api/reservation/{}/invoice",
            cluster.billing_url, completed.reservation_id
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(invoice.id, invoice_id);
    assert_eq!(invoice.amount, 6.0);
    assert_eq!(invoice.vendor_id, UserId::new("vendor-1"));
}

#[tokio::test]
async fn test_second_booking_of_same_bike_fails_over_http() {
    let cluster = Cluster::start().await;
    let bike = cluster.create_bike(2.0).await;

    let first = cluster
        .store(&Reservation::booking(
            UserId::new("customer-1"),
            bike.id,
            None,
            RequestId::new(),
        ))
        .await;
    let second = cluster
        .store(&Reservation::booking(
            UserId::new("customer-2"),
            bike.id,
            None,
            RequestId::new(),
        ))
        .await;

    assert_eq!(cluster.run(first).await.state, ReservationState::Booked);
    let failed = cluster.run(second).await;
    assert_eq!(failed.state, ReservationState::Failed);
    assert_eq!(cluster.fetch(&failed).await.state, ReservationState::Failed);
}
