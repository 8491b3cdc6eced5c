use async_trait::async_trait;
use common::{
    BikeId, RecordId, RequestId, Reservation, ReservationId, ReservationState, StateUpdate,
    UpdateResult, UserId, Validate,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{ReservationError, Result};
use crate::store::ReservationStore;

const COLUMNS: &str = "reservation_id, user_id, bike_id, state, request_time, start_time, \
     end_time, invoice_id, request_id";

/// PostgreSQL-backed reservation store.
#[derive(Clone)]
pub struct PostgresReservationStore {
    pool: PgPool,
}

impl PostgresReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations/reservations")
            .run(&self.pool)
            .await
    }

    fn row_to_reservation(row: PgRow) -> Result<Reservation> {
        let state: String = row.try_get("state")?;
        Ok(Reservation {
            reservation_id: ReservationId::new(row.try_get::<String, _>("reservation_id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            bike_id: BikeId::from_uuid(row.try_get::<Uuid, _>("bike_id")?),
            state: state.parse().map_err(ReservationError::Corrupt)?,
            request_time: row.try_get("request_time")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            invoice_id: row
                .try_get::<Option<Uuid>, _>("invoice_id")?
                .map(RecordId::from_uuid),
            request_id: RequestId::from_uuid(row.try_get::<Uuid, _>("request_id")?),
        })
    }
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    async fn create(&self, reservation: Reservation) -> Result<Reservation> {
        reservation.validate()?;
        sqlx::query(
            r#"
            INSERT INTO reservations (reservation_id, user_id, bike_id, state, request_time,
                                      start_time, end_time, invoice_id, request_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(reservation.reservation_id.as_str())
        .bind(reservation.user_id.as_str())
        .bind(reservation.bike_id.as_uuid())
        .bind(reservation.state.as_str())
        .bind(reservation.request_time)
        .bind(reservation.start_time)
        .bind(reservation.end_time)
        .bind(reservation.invoice_id.map(|id| id.as_uuid()))
        .bind(reservation.request_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                ReservationError::AlreadyExists(reservation.reservation_id.clone())
            }
            other => ReservationError::Database(other),
        })?;
        Ok(reservation)
    }

    async fn get(&self, id: &ReservationId) -> Result<Option<Reservation>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM reservations WHERE reservation_id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_reservation).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM reservations ORDER BY request_time ASC, reservation_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_reservation).collect()
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        state: Option<ReservationState>,
    ) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS} FROM reservations
            WHERE user_id = $1 AND ($2::text IS NULL OR state = $2)
            ORDER BY request_time ASC, reservation_id ASC
            "#
        ))
        .bind(user_id.as_str())
        .bind(state.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_reservation).collect()
    }

    async fn update_state(&self, id: &ReservationId, update: &StateUpdate) -> Result<UpdateResult> {
        // Only rows whose values actually change count as modified.
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET state = $2, end_time = $3, invoice_id = COALESCE($4, invoice_id)
            WHERE reservation_id = $1
              AND (state IS DISTINCT FROM $2
                   OR end_time IS DISTINCT FROM $3::timestamptz
                   OR ($4::uuid IS NOT NULL AND invoice_id IS DISTINCT FROM $4))
            "#,
        )
        .bind(id.as_str())
        .bind(update.state.as_str())
        .bind(update.end_time)
        .bind(update.invoice_id.map(|id| id.as_uuid()))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            return Ok(UpdateResult {
                matched_count: 1,
                modified_count: result.rows_affected(),
            });
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM reservations WHERE reservation_id = $1)",
        )
        .bind(id.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(UpdateResult {
            matched_count: u64::from(exists),
            modified_count: 0,
        })
    }
}
