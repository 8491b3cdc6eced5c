use async_trait::async_trait;
use common::{Bike, BikeId, NewBike, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{BikeError, Result};
use crate::store::{AVAILABLE_LIMIT, AvailabilityChange, BikeFilter, BikeStore};

const COLUMNS: &str = "id, available, model, hourly_cost, image_url, address, bike_type, \
     owner_user_id, suitable_height_in_meters, maximum_weight_in_kg";

/// PostgreSQL-backed bike store.
#[derive(Clone)]
pub struct PostgresBikeStore {
    pool: PgPool,
}

impl PostgresBikeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations/bikes").run(&self.pool).await
    }

    fn row_to_bike(row: PgRow) -> Result<Bike> {
        let bike_type: String = row.try_get("bike_type")?;
        Ok(Bike {
            id: BikeId::from_uuid(row.try_get::<Uuid, _>("id")?),
            available: row.try_get("available")?,
            model: row.try_get("model")?,
            hourly_cost: row.try_get("hourly_cost")?,
            image_url: row.try_get("image_url")?,
            address: row.try_get("address")?,
            bike_type: bike_type.parse().map_err(BikeError::Corrupt)?,
            owner_user_id: UserId::new(row.try_get::<String, _>("owner_user_id")?),
            suitable_height_in_meters: row.try_get("suitable_height_in_meters")?,
            maximum_weight_in_kg: row.try_get("maximum_weight_in_kg")?,
        })
    }
}

#[async_trait]
impl BikeStore for PostgresBikeStore {
    async fn insert(&self, bike: NewBike) -> Result<Bike> {
        let bike = bike.into_bike(BikeId::new(), true)?;
        sqlx::query(
            r#"
            INSERT INTO bikes (id, available, model, hourly_cost, image_url, address, bike_type,
                               owner_user_id, suitable_height_in_meters, maximum_weight_in_kg)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(bike.id.as_uuid())
        .bind(bike.available)
        .bind(&bike.model)
        .bind(bike.hourly_cost)
        .bind(&bike.image_url)
        .bind(&bike.address)
        .bind(bike.bike_type.as_str())
        .bind(bike.owner_user_id.as_str())
        .bind(bike.suitable_height_in_meters)
        .bind(bike.maximum_weight_in_kg)
        .execute(&self.pool)
        .await?;
        Ok(bike)
    }

    async fn get(&self, id: BikeId) -> Result<Option<Bike>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM bikes WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_bike).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Bike>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM bikes ORDER BY hourly_cost ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_bike).collect()
    }

    async fn list_available(&self, filter: &BikeFilter) -> Result<Vec<Bike>> {
        let mut sql = format!("SELECT {COLUMNS} FROM bikes WHERE available = TRUE");
        let mut param_count = 0;

        if filter.bike_type.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND bike_type = ${param_count}"));
        }
        if filter.model.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND model = ${param_count}"));
        }
        if filter.owner_user_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND owner_user_id = ${param_count}"));
        }
        if filter.max_hourly_cost.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND hourly_cost <= ${param_count}"));
        }
        sql.push_str(&format!(" ORDER BY hourly_cost ASC LIMIT {AVAILABLE_LIMIT}"));

        let mut query = sqlx::query(&sql);
        if let Some(bike_type) = filter.bike_type {
            query = query.bind(bike_type.as_str());
        }
        if let Some(model) = &filter.model {
            query = query.bind(model);
        }
        if let Some(owner) = &filter.owner_user_id {
            query = query.bind(owner);
        }
        if let Some(max) = filter.max_hourly_cost {
            query = query.bind(max);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_bike).collect()
    }

    async fn replace(&self, id: BikeId, bike: NewBike) -> Result<Option<Bike>> {
        // Validate before touching the row; availability is re-read on update.
        let bike = bike.into_bike(id, true)?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE bikes
            SET model = $2, hourly_cost = $3, image_url = $4, address = $5, bike_type = $6,
                owner_user_id = $7, suitable_height_in_meters = $8, maximum_weight_in_kg = $9
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&bike.model)
        .bind(bike.hourly_cost)
        .bind(&bike.image_url)
        .bind(&bike.address)
        .bind(bike.bike_type.as_str())
        .bind(bike.owner_user_id.as_str())
        .bind(bike.suitable_height_in_meters)
        .bind(bike.maximum_weight_in_kg)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_bike).transpose()
    }

    async fn delete(&self, id: BikeId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bikes WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_availability(&self, id: BikeId, available: bool) -> Result<AvailabilityChange> {
        let result = sqlx::query("UPDATE bikes SET available = $2 WHERE id = $1 AND available = $3")
            .bind(id.as_uuid())
            .bind(available)
            .bind(!available)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            return Ok(AvailabilityChange::Changed);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bikes WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(if exists {
            AvailabilityChange::Unchanged
        } else {
            AvailabilityChange::Missing
        })
    }
}
