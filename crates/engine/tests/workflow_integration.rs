//! Integration tests for the reservation workflow against in-memory collaborators.

use chrono::Duration;
use common::{Bike, BikeId, BikeType, RequestId, Reservation, ReservationState, UserId};
use engine::{
    InMemoryBikeDirectory, InMemoryBillingService, InMemoryReservationStore, ReservationWorkflow,
    WorkflowCommand,
};

type TestWorkflow =
    ReservationWorkflow<InMemoryBikeDirectory, InMemoryBillingService, InMemoryReservationStore>;

struct TestHarness {
    workflow: TestWorkflow,
    bikes: InMemoryBikeDirectory,
    billing: InMemoryBillingService,
    reservations: InMemoryReservationStore,
}

impl TestHarness {
    fn new() -> Self {
        let bikes = InMemoryBikeDirectory::new();
        let billing = InMemoryBillingService::new();
        let reservations = InMemoryReservationStore::new();
        let workflow =
            ReservationWorkflow::new(bikes.clone(), billing.clone(), reservations.clone());
        Self {
            workflow,
            bikes,
            billing,
            reservations,
        }
    }

    fn add_bike(&self, hourly_cost: f64) -> BikeId {
        let bike = Bike {
            id: BikeId::new(),
            available: true,
            model: "Trek".to_string(),
            hourly_cost,
            image_url: "/static/logo.svg".to_string(),
            address: "1 Main St".to_string(),
            bike_type: BikeType::Mountain,
            owner_user_id: UserId::new("vendor-1"),
            suitable_height_in_meters: 1.8,
            maximum_weight_in_kg: 110.0,
        };
        let id = bike.id;
        self.bikes.add_bike(bike);
        id
    }

    /// Stores a fresh `Booking` reservation, as the gateway does.
    fn new_booking(&self, bike_id: BikeId) -> Reservation {
        let reservation =
            Reservation::booking(UserId::new("customer-1"), bike_id, None, RequestId::new());
        self.reservations.insert(reservation.clone());
        reservation
    }

    async fn book(&self, reservation: Reservation) -> Reservation {
        let command = WorkflowCommand::from_reservation(reservation).unwrap();
        self.workflow.execute(command).await
    }

    async fn complete(&self, mut reservation: Reservation) -> Reservation {
        reservation.state = ReservationState::Completing;
        let command = WorkflowCommand::from_reservation(reservation).unwrap();
        self.workflow.execute(command).await
    }

    fn stored(&self, reservation: &Reservation) -> Reservation {
        self.reservations.get(&reservation.reservation_id).unwrap()
    }
}

#[tokio::test]
async fn test_booking_reserves_bike() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(5.0);
    let reservation = h.new_booking(bike_id);

    let booked = h.book(reservation).await;
    assert_eq!(booked.state, ReservationState::Booked);
    assert_eq!(booked.end_time, None);
    assert_eq!(h.stored(&booked).state, ReservationState::Booked);
    assert_eq!(h.bikes.is_available(bike_id), Some(false));
}

#[tokio::test]
async fn test_booking_unavailable_bike_fails() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(5.0);
    let first = h.new_booking(bike_id);
    let second = h.new_booking(bike_id);

    assert_eq!(h.book(first).await.state, ReservationState::Booked);
    let failed = h.book(second).await;
    assert_eq!(failed.state, ReservationState::Failed);
    assert_eq!(h.stored(&failed).state, ReservationState::Failed);
    assert_eq!(h.bikes.is_available(bike_id), Some(false));
}

#[tokio::test]
async fn test_booking_fails_when_bike_directory_is_down() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(5.0);
    h.bikes.set_fail_on_reserve(true);
    let reservation = h.new_booking(bike_id);

    let failed = h.book(reservation).await;
    assert_eq!(failed.state, ReservationState::Failed);
    assert_eq!(h.stored(&failed).state, ReservationState::Failed);
    assert_eq!(h.bikes.is_available(bike_id), Some(true));
}

#[tokio::test]
async fn test_unmodified_store_fails_booking_and_keeps_bike_reserved() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(5.0);
    // Never stored, so the update matches nothing.
    let reservation =
        Reservation::booking(UserId::new("customer-1"), bike_id, None, RequestId::new());

    let failed = h.book(reservation).await;
    assert_eq!(failed.state, ReservationState::Failed);
    assert_eq!(h.bikes.is_available(bike_id), Some(false));
}

#[tokio::test]
async fn test_completion_frees_bike_and_invoices() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(4.0);
    let mut reservation = h.new_booking(bike_id);
    // Rented for an hour and a half.
    reservation.start_time = common::time::now() - Duration::minutes(90);
    h.reservations.insert(reservation.clone());

    let booked = h.book(reservation).await;
    let completed = h.complete(booked).await;

    assert_eq!(completed.state, ReservationState::Completed);
    let end = completed.end_time.unwrap();
    assert!(end > completed.start_time);
    assert_eq!(h.bikes.is_available(bike_id), Some(true));

    let invoices = h.billing.invoices();
    assert_eq!(invoices.len(), 1);
    let invoice = &invoices[0];
    assert_eq!(invoice.amount, 8.0);
    assert_eq!(invoice.reservation_id, completed.reservation_id);
    assert_eq!(invoice.customer_id, UserId::new("customer-1"));
    assert_eq!(invoice.vendor_id, UserId::new("vendor-1"));
    assert_eq!(invoice.bike_id, bike_id);

    let stored = h.stored(&completed);
    assert_eq!(stored.state, ReservationState::Completed);
    assert_eq!(stored.invoice_id, Some(invoice.id));
    assert_eq!(stored.end_time, Some(end));
}

#[tokio::test]
async fn test_completion_before_start_is_free() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(4.0);
    let mut reservation = h.new_booking(bike_id);
    reservation.start_time = common::time::now() + Duration::hours(2);
    h.reservations.insert(reservation.clone());

    let completed = h.complete(h.book(reservation).await).await;
    assert_eq!(completed.state, ReservationState::Completed);
    assert_eq!(h.billing.invoices()[0].amount, 0.0);
}

#[tokio::test]
async fn test_billing_failure_rolls_back() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(4.0);
    let booked = h.book(h.new_booking(bike_id)).await;
    h.billing.set_fail_on_create(true);

    let failed = h.complete(booked).await;
    assert_eq!(failed.state, ReservationState::Failed);
    assert_eq!(failed.invoice_id, None);
    assert!(h.billing.invoices().is_empty());

    let stored = h.stored(&failed);
    assert_eq!(stored.state, ReservationState::Failed);
    assert_eq!(stored.invoice_id, None);
    assert_eq!(stored.end_time, None);

    // Freed, then put back on hold by the compensation.
    assert_eq!(h.bikes.reserve_calls(), 2);
    assert_eq!(h.bikes.is_available(bike_id), Some(false));
}

#[tokio::test]
async fn test_unrecorded_completion_fails_after_invoicing() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(4.0);
    let booked = h.book(h.new_booking(bike_id)).await;
    h.reservations.set_ignored_state(Some(ReservationState::Completed));

    let failed = h.complete(booked).await;
    assert_eq!(failed.state, ReservationState::Failed);

    // The invoice stands; only the final write was lost.
    assert_eq!(h.billing.invoices().len(), 1);
    let stored = h.stored(&failed);
    assert_eq!(stored.state, ReservationState::Failed);
    assert_eq!(stored.invoice_id, None);
    assert_eq!(h.bikes.is_available(bike_id), Some(true));
}

#[tokio::test]
async fn test_free_failure_fails_completion() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(4.0);
    let booked = h.book(h.new_booking(bike_id)).await;
    h.bikes.set_fail_on_free(true);

    let failed = h.complete(booked).await;
    assert_eq!(failed.state, ReservationState::Failed);
    assert_eq!(h.stored(&failed).state, ReservationState::Failed);
    assert_eq!(h.bikes.is_available(bike_id), Some(false));
    assert!(h.billing.invoices().is_empty());
}

#[tokio::test]
async fn test_completing_unknown_reservation_fails() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(4.0);
    let mut reservation =
        Reservation::booking(UserId::new("customer-1"), bike_id, None, RequestId::new());
    reservation.state = ReservationState::Booked;

    let failed = h.complete(reservation).await;
    assert_eq!(failed.state, ReservationState::Failed);
    assert_eq!(h.bikes.is_available(bike_id), Some(true));
    assert!(h.billing.invoices().is_empty());
}

#[tokio::test]
async fn test_store_outage_still_reports_failed() {
    let h = TestHarness::new();
    let bike_id = h.add_bike(4.0);
    let reservation = h.new_booking(bike_id);
    h.reservations.set_fail_on_update(true);

    let failed = h.book(reservation.clone()).await;
    assert_eq!(failed.state, ReservationState::Failed);
    // The failed state could not be written either.
    assert_eq!(h.stored(&reservation).state, ReservationState::Booking);
}
