use async_trait::async_trait;
use common::{
    BikeId, CustomerProfile, Invoice, NewCustomerProfile, NewInvoice, NewVendorProfile, RecordId,
    ReservationId, UserId, Validate, VendorProfile,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{BillingError, Result};
use crate::store::{BillingStore, Party};

const INVOICE_COLUMNS: &str = "id, reservation_id, customer_id, vendor_id, bike_id, amount";

/// PostgreSQL-backed billing store.
#[derive(Clone)]
pub struct PostgresBillingStore {
    pool: PgPool,
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

impl PostgresBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations/billing").run(&self.pool).await
    }

    fn row_to_invoice(row: PgRow) -> Result<Invoice> {
        Ok(Invoice {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            reservation_id: ReservationId::new(row.try_get::<String, _>("reservation_id")?),
            customer_id: UserId::new(row.try_get::<String, _>("customer_id")?),
            vendor_id: UserId::new(row.try_get::<String, _>("vendor_id")?),
            bike_id: BikeId::from_uuid(row.try_get::<Uuid, _>("bike_id")?),
            amount: row.try_get("amount")?,
        })
    }

    fn row_to_customer(row: PgRow) -> Result<CustomerProfile> {
        Ok(CustomerProfile {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            cc_number: row.try_get("cc_number")?,
            cc_expiry: row.try_get("cc_expiry")?,
            cc_ccv: row.try_get("cc_ccv")?,
        })
    }

    fn row_to_vendor(row: PgRow) -> Result<VendorProfile> {
        Ok(VendorProfile {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            routing_number: row.try_get("routing_number")?,
            account_number: row.try_get("account_number")?,
        })
    }
}

#[async_trait]
impl BillingStore for PostgresBillingStore {
    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice> {
        let invoice = invoice.into_invoice(RecordId::new())?;
        sqlx::query(
            r#"
            INSERT INTO invoices (id, reservation_id, customer_id, vendor_id, bike_id, amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.reservation_id.as_str())
        .bind(invoice.customer_id.as_str())
        .bind(invoice.vendor_id.as_str())
        .bind(invoice.bike_id.as_uuid())
        .bind(invoice.amount)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BillingError::DuplicateInvoice(invoice.reservation_id.clone())
            } else {
                BillingError::Database(e)
            }
        })?;
        Ok(invoice)
    }

    async fn get_invoice(&self, id: RecordId) -> Result<Option<Invoice>> {
        let row = sqlx::query(&format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_invoice).transpose()
    }

    async fn invoice_for_reservation(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Option<Invoice>> {
        let row = sqlx::query(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE reservation_id = $1"
        ))
        .bind(reservation_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_invoice).transpose()
    }

    async fn invoices_for(&self, party: Party, user_id: &UserId) -> Result<Vec<Invoice>> {
        let column = match party {
            Party::Customer => "customer_id",
            Party::Vendor => "vendor_id",
        };
        let rows = sqlx::query(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE {column} = $1 ORDER BY reservation_id ASC"
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_invoice).collect()
    }

    async fn create_customer(&self, profile: NewCustomerProfile) -> Result<CustomerProfile> {
        profile.validate()?;
        let profile = profile.into_profile(RecordId::new());
        sqlx::query(
            "INSERT INTO customers (id, user_id, cc_number, cc_expiry, cc_ccv) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(profile.id.as_uuid())
        .bind(profile.user_id.as_str())
        .bind(&profile.cc_number)
        .bind(&profile.cc_expiry)
        .bind(&profile.cc_ccv)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BillingError::ProfileExists(profile.user_id.clone())
            } else {
                BillingError::Database(e)
            }
        })?;
        Ok(profile)
    }

    async fn update_customer(
        &self,
        profile: NewCustomerProfile,
    ) -> Result<Option<CustomerProfile>> {
        profile.validate()?;
        let row = sqlx::query(
            r#"
            UPDATE customers SET cc_number = $2, cc_expiry = $3, cc_ccv = $4
            WHERE user_id = $1
            RETURNING id, user_id, cc_number, cc_expiry, cc_ccv
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.cc_number)
        .bind(&profile.cc_expiry)
        .bind(&profile.cc_ccv)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_customer).transpose()
    }

    async fn get_customer(&self, user_id: &UserId) -> Result<Option<CustomerProfile>> {
        let row = sqlx::query(
            "SELECT id, user_id, cc_number, cc_expiry, cc_ccv FROM customers WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_customer).transpose()
    }

    async fn create_vendor(&self, profile: NewVendorProfile) -> Result<VendorProfile> {
        profile.validate()?;
        let profile = profile.into_profile(RecordId::new());
        sqlx::query(
            "INSERT INTO vendors (id, user_id, routing_number, account_number) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(profile.id.as_uuid())
        .bind(profile.user_id.as_str())
        .bind(&profile.routing_number)
        .bind(&profile.account_number)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BillingError::ProfileExists(profile.user_id.clone())
            } else {
                BillingError::Database(e)
            }
        })?;
        Ok(profile)
    }

    async fn update_vendor(&self, profile: NewVendorProfile) -> Result<Option<VendorProfile>> {
        profile.validate()?;
        let row = sqlx::query(
            r#"
            UPDATE vendors SET routing_number = $2, account_number = $3
            WHERE user_id = $1
            RETURNING id, user_id, routing_number, account_number
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.routing_number)
        .bind(&profile.account_number)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_vendor).transpose()
    }

    async fn get_vendor(&self, user_id: &UserId) -> Result<Option<VendorProfile>> {
        let row = sqlx::query(
            "SELECT id, user_id, routing_number, account_number FROM vendors WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_vendor).transpose()
    }
}
