//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need a Docker daemon.
//! Run with:
//!
//! ```bash
//! cargo test -p reservations --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Duration;
use common::{
    BikeId, RecordId, RequestId, Reservation, ReservationId, ReservationState, StateUpdate,
    UpdateResult, UserId,
};
use reservations::{PostgresReservationStore, ReservationError, ReservationStore};
use serial_test::serial;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let store = PostgresReservationStore::new(
                sqlx::PgPool::connect(&connection_string).await.unwrap(),
            );
            store.run_migrations().await.unwrap();
            store.pool().close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresReservationStore {
    let info = get_container_info().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE reservations")
        .execute(&pool)
        .await
        .unwrap();

    PostgresReservationStore::new(pool)
}

fn booking(user: &str) -> Reservation {
    Reservation::booking(UserId::new(user), BikeId::new(), None, RequestId::new())
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_create_and_get() {
    let store = get_test_store().await;
    let reservation = store.create(booking("c1")).await.unwrap();
    let fetched = store.get(&reservation.reservation_id).await.unwrap().unwrap();
    assert_eq!(fetched, reservation);

    let err = store.create(reservation).await.unwrap_err();
    assert!(matches!(err, ReservationError::AlreadyExists(_)));
    assert!(store.get(&ReservationId::new("nope")).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_conditional_update_counts() {
    let store = get_test_store().await;
    let reservation = store.create(booking("c1")).await.unwrap();
    let id = reservation.reservation_id.clone();

    let booked = StateUpdate::new(ReservationState::Booked, None);
    assert_eq!(
        store.update_state(&id, &booked).await.unwrap(),
        UpdateResult { matched_count: 1, modified_count: 1 }
    );
    assert_eq!(
        store.update_state(&id, &booked).await.unwrap(),
        UpdateResult { matched_count: 1, modified_count: 0 }
    );
    assert_eq!(
        store
            .update_state(&ReservationId::new("nope"), &booked)
            .await
            .unwrap(),
        UpdateResult::unmatched()
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_completion_keeps_invoice() {
    let store = get_test_store().await;
    let reservation = store.create(booking("c1")).await.unwrap();
    let id = reservation.reservation_id.clone();
    let end = reservation.start_time + Duration::hours(3);
    let invoice = RecordId::new();

    let completed = StateUpdate::new(ReservationState::Completed, Some(end)).with_invoice(invoice);
    assert!(store.update_state(&id, &completed).await.unwrap().is_modified());
    let without_invoice = StateUpdate::new(ReservationState::Completed, Some(end));
    assert!(!store.update_state(&id, &without_invoice).await.unwrap().is_modified());

    let stored = store.get(&id).await.unwrap().unwrap();
    assert_eq!(stored.invoice_id, Some(invoice));
    assert_eq!(stored.end_time, Some(end));
    assert_eq!(stored.state, ReservationState::Completed);
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_list_by_user() {
    let store = get_test_store().await;
    let first = store.create(booking("c1")).await.unwrap();
    store.create(booking("c1")).await.unwrap();
    store.create(booking("c2")).await.unwrap();
    store
        .update_state(
            &first.reservation_id,
            &StateUpdate::new(ReservationState::Failed, None),
        )
        .await
        .unwrap();

    let user = UserId::new("c1");
    assert_eq!(store.list_by_user(&user, None).await.unwrap().len(), 2);
    let failed = store
        .list_by_user(&user, Some(ReservationState::Failed))
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(store.list_all().await.unwrap().len(), 3);
}
