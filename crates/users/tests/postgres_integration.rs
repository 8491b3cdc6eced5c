//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need a Docker daemon.
//! Run with:
//!
//! ```bash
//! cargo test -p users --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use common::{User, UserId, UserType, UserUpdate};
use serial_test::serial;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use users::{PostgresUserStore, UserError, UserStore};

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

            let store = PostgresUserStore::new(
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

async fn get_test_store() -> PostgresUserStore {
    let info = get_container_info().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE users")
        .execute(&pool)
        .await
        .unwrap();

    PostgresUserStore::new(pool)
}

fn user(id: &str, user_type: UserType) -> User {
    User {
        id: UserId::new(id),
        name: "Ada".to_string(),
        address: "2 Side St".to_string(),
        phone: Some("5551234567".to_string()),
        email: "ada@example.com".to_string(),
        user_type,
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_insert_and_get() {
    let store = get_test_store().await;
    let inserted = store.insert(user("c1", UserType::Customer)).await.unwrap();
    let fetched = store.get(&inserted.id).await.unwrap().unwrap();
    assert_eq!(fetched, inserted);
    assert!(store.get(&UserId::new("missing")).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_duplicate_id_is_rejected() {
    let store = get_test_store().await;
    store.insert(user("c1", UserType::Customer)).await.unwrap();
    let err = store
        .insert(user("c1", UserType::Vendor))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::AlreadyExists(_)));
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_update_keeps_type() {
    let store = get_test_store().await;
    let mut vendor = user("v1", UserType::Vendor);
    vendor.phone = None;
    store.insert(vendor).await.unwrap();

    let updated = store
        .update(
            &UserId::new("v1"),
            UserUpdate {
                name: "Bo".to_string(),
                address: "9 Harbour Rd".to_string(),
                phone: None,
                email: "bo@example.com".to_string(),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Bo");
    assert_eq!(updated.user_type, UserType::Vendor);

    let missing = store
        .update(&UserId::new("nobody"), UserUpdate::from(&updated))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
#[serial]
async fn test_list_and_delete() {
    let store = get_test_store().await;
    store.insert(user("b", UserType::Customer)).await.unwrap();
    store.insert(user("a", UserType::Vendor)).await.unwrap();

    let ids: Vec<String> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id.to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);

    assert!(store.delete(&UserId::new("a")).await.unwrap());
    assert!(!store.delete(&UserId::new("a")).await.unwrap());
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}
