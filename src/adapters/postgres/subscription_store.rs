//! PostgreSQL implementation of the SubscriptionStore port.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE subscription_records (
//!     user_id                 TEXT PRIMARY KEY,
//!     status                  TEXT,
//!     plan                    TEXT,
//!     subscription_id         TEXT,
//!     customer_id             TEXT,
//!     current_period_start    TIMESTAMPTZ,
//!     current_period_end      TIMESTAMPTZ,
//!     last_payment_at         TIMESTAMPTZ,
//!     last_payment_failed_at  TIMESTAMPTZ,
//!     cancelled_at            TIMESTAMPTZ,
//!     updated_at              TIMESTAMPTZ NOT NULL
//! );
//! CREATE UNIQUE INDEX subscription_records_customer_id_key
//!     ON subscription_records (customer_id);
//! CREATE UNIQUE INDEX subscription_records_subscription_id_key
//!     ON subscription_records (subscription_id);
//! ```
//!
//! The merge is a single `INSERT .. ON CONFLICT .. DO UPDATE` whose SET
//! clauses `COALESCE` each patch column with the stored value, so concurrent
//! events touching disjoint fields cannot clobber each other and the partial
//! merge is atomic per record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{PlanType, SubscriptionPatch, SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{StoreError, SubscriptionStore};

/// PostgreSQL subscription record store.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    /// Creates a new store using the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription record.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: String,
    status: Option<String>,
    plan: Option<String>,
    subscription_id: Option<String>,
    customer_id: Option<String>,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    last_payment_at: Option<DateTime<Utc>>,
    last_payment_failed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = StoreError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let user_id = UserId::new(row.user_id)
            .map_err(|e| StoreError::Query(format!("Invalid user_id: {}", e)))?;

        let status = row.status.as_deref().map(parse_status).transpose()?;
        let plan = row.plan.as_deref().map(parse_plan).transpose()?;

        Ok(SubscriptionRecord {
            user_id,
            status,
            plan,
            subscription_id: row.subscription_id,
            customer_id: row.customer_id,
            current_period_start: row.current_period_start.map(Timestamp::from_datetime),
            current_period_end: row.current_period_end.map(Timestamp::from_datetime),
            last_payment_at: row.last_payment_at.map(Timestamp::from_datetime),
            last_payment_failed_at: row.last_payment_failed_at.map(Timestamp::from_datetime),
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, StoreError> {
    match s {
        "active" => Ok(SubscriptionStatus::Active),
        "past_due" => Ok(SubscriptionStatus::PastDue),
        "cancelled" => Ok(SubscriptionStatus::Cancelled),
        _ => Err(StoreError::Query(format!("Invalid status value: {}", s))),
    }
}

fn parse_plan(s: &str) -> Result<PlanType, StoreError> {
    PlanType::parse(s).ok_or_else(|| StoreError::Query(format!("Invalid plan value: {}", s)))
}

fn db_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        _ => StoreError::Query(e.to_string()),
    }
}

const SELECT_COLUMNS: &str = r#"
    user_id, status, plan, subscription_id, customer_id,
    current_period_start, current_period_end,
    last_payment_at, last_payment_failed_at, cancelled_at, updated_at
"#;

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let query = format!(
            "SELECT {} FROM subscription_records WHERE user_id = $1",
            SELECT_COLUMNS
        );

        let row: Option<SubscriptionRow> = sqlx::query_as(&query)
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        // ORDER BY keeps the duplicate-key edge case deterministic.
        let query = format!(
            "SELECT {} FROM subscription_records WHERE customer_id = $1 ORDER BY user_id LIMIT 1",
            SELECT_COLUMNS
        );

        let row: Option<SubscriptionRow> = sqlx::query_as(&query)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let query = format!(
            "SELECT {} FROM subscription_records WHERE subscription_id = $1 ORDER BY user_id LIMIT 1",
            SELECT_COLUMNS
        );

        let row: Option<SubscriptionRow> = sqlx::query_as(&query)
            .bind(subscription_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn merge_update(
        &self,
        user_id: &UserId,
        patch: SubscriptionPatch,
    ) -> Result<SubscriptionRecord, StoreError> {
        let query = format!(
            r#"
            INSERT INTO subscription_records (
                user_id, status, plan, subscription_id, customer_id,
                current_period_start, current_period_end,
                last_payment_at, last_payment_failed_at, cancelled_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                status = COALESCE(EXCLUDED.status, subscription_records.status),
                plan = COALESCE(EXCLUDED.plan, subscription_records.plan),
                subscription_id = COALESCE(EXCLUDED.subscription_id, subscription_records.subscription_id),
                customer_id = COALESCE(EXCLUDED.customer_id, subscription_records.customer_id),
                current_period_start = COALESCE(EXCLUDED.current_period_start, subscription_records.current_period_start),
                current_period_end = COALESCE(EXCLUDED.current_period_end, subscription_records.current_period_end),
                last_payment_at = COALESCE(EXCLUDED.last_payment_at, subscription_records.last_payment_at),
                last_payment_failed_at = COALESCE(EXCLUDED.last_payment_failed_at, subscription_records.last_payment_failed_at),
                cancelled_at = COALESCE(EXCLUDED.cancelled_at, subscription_records.cancelled_at),
                updated_at = NOW()
            RETURNING {}
            "#,
            SELECT_COLUMNS
        );

        let row: SubscriptionRow = sqlx::query_as(&query)
            .bind(user_id.as_str())
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.plan.map(|p| p.as_str()))
            .bind(&patch.subscription_id)
            .bind(&patch.customer_id)
            .bind(patch.current_period_start.map(|t| *t.as_datetime()))
            .bind(patch.current_period_end.map(|t| *t.as_datetime()))
            .bind(patch.last_payment_at.map(|t| *t.as_datetime()))
            .bind(patch.last_payment_failed_at.map(|t| *t.as_datetime()))
            .bind(patch.cancelled_at.map(|t| *t.as_datetime()))
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        SubscriptionRecord::try_from(row)
    }
}
