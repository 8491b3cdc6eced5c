use async_trait::async_trait;
use common::{User, UserId, UserType, UserUpdate, Validate};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::{Result, UserError};
use crate::store::UserStore;

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations/users").run(&self.pool).await
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        let user_type: String = row.try_get("user_type")?;
        let user_type = match user_type.as_str() {
            "customer" => UserType::Customer,
            "vendor" => UserType::Vendor,
            other => return Err(UserError::Corrupt(format!("unknown user type '{other}'"))),
        };
        Ok(User {
            id: UserId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            user_type,
        })
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn insert(&self, user: User) -> Result<User> {
        user.validate()?;
        sqlx::query(
            r#"
            INSERT INTO users (id, name, address, phone, email, user_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.name)
        .bind(&user.address)
        .bind(user.phone.as_deref())
        .bind(&user.email)
        .bind(user.user_type.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return UserError::AlreadyExists(user.id.clone());
            }
            UserError::Database(e)
        })?;
        Ok(user)
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, address, phone, email, user_type FROM users WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, name, address, phone, email, user_type FROM users ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn update(&self, id: &UserId, update: UserUpdate) -> Result<Option<User>> {
        update.validate()?;
        let row = sqlx::query(
            r#"
            UPDATE users SET name = $2, address = $3, phone = $4, email = $5
            WHERE id = $1
            RETURNING id, name, address, phone, email, user_type
            "#,
        )
        .bind(id.as_str())
        .bind(&update.name)
        .bind(&update.address)
        .bind(update.phone.as_deref())
        .bind(&update.email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    async fn delete(&self, id: &UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
