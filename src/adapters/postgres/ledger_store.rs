//! PostgreSQL implementation of LedgerStore.
//!
//! The charge unit runs in one transaction: the payment insert uses
//! `ON CONFLICT DO NOTHING` against the partial unique index on
//! `external_payment_id`, and the subscription update only executes when
//! the insert actually took a row. Losing the duplicate race rolls the
//! transaction back untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{
    CentreSubscription, PaymentRecord, PaymentStatus, PlanId, SubscriptionKind,
};
use crate::domain::foundation::{
    CentreId, DomainError, ErrorCode, Money, PaymentId, Timestamp,
};
use crate::ports::{LedgerStore, RecordOutcome};

/// PostgreSQL implementation of the LedgerStore port.
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a centre's subscription fields.
#[derive(Debug, sqlx::FromRow)]
struct CentreRow {
    id: Uuid,
    subscription_type: String,
    trial_start: Option<DateTime<Utc>>,
    trial_end: Option<DateTime<Utc>>,
    subscription_start: Option<DateTime<Utc>>,
    subscription_end: Option<DateTime<Utc>>,
    external_subscription_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CentreRow> for CentreSubscription {
    type Error = DomainError;

    fn try_from(row: CentreRow) -> Result<Self, Self::Error> {
        Ok(CentreSubscription {
            centre_id: CentreId::from_uuid(row.id),
            kind: parse_kind(&row.subscription_type)?,
            trial_start: row.trial_start.map(Timestamp::from_datetime),
            trial_end: row.trial_end.map(Timestamp::from_datetime),
            subscription_start: row.subscription_start.map(Timestamp::from_datetime),
            subscription_end: row.subscription_end.map(Timestamp::from_datetime),
            external_subscription_ref: row.external_subscription_ref,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    centre_id: Uuid,
    amount_minor: i64,
    plan_type: String,
    external_payment_id: Option<String>,
    external_subscription_ref: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(PaymentRecord {
            id: PaymentId::from_uuid(row.id),
            centre_id: CentreId::from_uuid(row.centre_id),
            amount: Money::from_minor_units(row.amount_minor),
            plan: parse_plan(&row.plan_type)?,
            external_payment_id: row.external_payment_id,
            external_subscription_ref: row.external_subscription_ref,
            status: parse_status(&row.status)?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_kind(s: &str) -> Result<SubscriptionKind, DomainError> {
    match s {
        "none" => Ok(SubscriptionKind::None),
        "trial" => Ok(SubscriptionKind::Trial),
        "monthly" => Ok(SubscriptionKind::Monthly),
        "yearly" => Ok(SubscriptionKind::Yearly),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid subscription_type value: {}", s),
        )),
    }
}

fn kind_to_string(kind: SubscriptionKind) -> &'static str {
    match kind {
        SubscriptionKind::None => "none",
        SubscriptionKind::Trial => "trial",
        SubscriptionKind::Monthly => "monthly",
        SubscriptionKind::Yearly => "yearly",
    }
}

fn parse_plan(s: &str) -> Result<PlanId, DomainError> {
    PlanId::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid plan_type value: {}", s),
        )
    })
}

fn parse_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s {
        "pending" => Ok(PaymentStatus::Pending),
        "completed" => Ok(PaymentStatus::Completed),
        "cancelled" => Ok(PaymentStatus::Cancelled),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment status value: {}", s),
        )),
    }
}

fn status_to_string(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Completed => "completed",
        PaymentStatus::Cancelled => "cancelled",
    }
}

fn db_err(err: sqlx::Error) -> DomainError {
    DomainError::database(err.to_string())
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn find_centre(
        &self,
        centre_id: &CentreId,
    ) -> Result<Option<CentreSubscription>, DomainError> {
        let row: Option<CentreRow> = sqlx::query_as(
            r#"
            SELECT id, subscription_type, trial_start, trial_end,
                   subscription_start, subscription_end,
                   external_subscription_ref, created_at, updated_at
            FROM centres
            WHERE id = $1
            "#,
        )
        .bind(centre_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(CentreSubscription::try_from).transpose()
    }

    async fn update_subscription(
        &self,
        subscription: &CentreSubscription,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE centres
            SET subscription_type = $2,
                trial_start = $3,
                trial_end = $4,
                subscription_start = $5,
                subscription_end = $6,
                external_subscription_ref = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(subscription.centre_id.as_uuid())
        .bind(kind_to_string(subscription.kind))
        .bind(subscription.trial_start.map(|t| *t.as_datetime()))
        .bind(subscription.trial_end.map(|t| *t.as_datetime()))
        .bind(subscription.subscription_start.map(|t| *t.as_datetime()))
        .bind(subscription.subscription_end.map(|t| *t.as_datetime()))
        .bind(subscription.external_subscription_ref.as_deref())
        .bind(*subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CentreNotFound,
                format!("Centre {} does not exist", subscription.centre_id),
            ));
        }
        Ok(())
    }

    async fn find_payment_by_external_id(
        &self,
        external_payment_id: &str,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(
            r#"
            SELECT id, centre_id, amount_minor, plan_type,
                   external_payment_id, external_subscription_ref,
                   status, created_at
            FROM subscription_payments
            WHERE external_payment_id = $1
            "#,
        )
        .bind(external_payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(PaymentRecord::try_from).transpose()
    }

    async fn record_charge(
        &self,
        subscription: &CentreSubscription,
        payment: &PaymentRecord,
    ) -> Result<RecordOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO subscription_payments
                (id, centre_id, amount_minor, plan_type,
                 external_payment_id, external_subscription_ref,
                 status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (external_payment_id)
                WHERE external_payment_id IS NOT NULL
                DO NOTHING
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.centre_id.as_uuid())
        .bind(payment.amount.minor_units())
        .bind(payment.plan.as_str())
        .bind(payment.external_payment_id.as_deref())
        .bind(payment.external_subscription_ref.as_deref())
        .bind(status_to_string(payment.status))
        .bind(*payment.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if inserted.rows_affected() == 0 {
            // Duplicate delivery lost the race; leave everything as-is.
            tx.rollback().await.map_err(db_err)?;
            return Ok(RecordOutcome::DuplicatePayment);
        }

        let updated = sqlx::query(
            r#"
            UPDATE centres
            SET subscription_type = $2,
                subscription_start = $3,
                subscription_end = $4,
                external_subscription_ref = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(subscription.centre_id.as_uuid())
        .bind(kind_to_string(subscription.kind))
        .bind(subscription.subscription_start.map(|t| *t.as_datetime()))
        .bind(subscription.subscription_end.map(|t| *t.as_datetime()))
        .bind(subscription.external_subscription_ref.as_deref())
        .bind(*subscription.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(db_err)?;
            return Err(DomainError::new(
                ErrorCode::CentreNotFound,
                format!("Centre {} does not exist", subscription.centre_id),
            ));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(RecordOutcome::Recorded)
    }

    async fn list_payments(
        &self,
        centre_id: &CentreId,
    ) -> Result<Vec<PaymentRecord>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(
            r#"
            SELECT id, centre_id, amount_minor, plan_type,
                   external_payment_id, external_subscription_ref,
                   status, created_at
            FROM subscription_payments
            WHERE centre_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(centre_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(PaymentRecord::try_from).collect()
    }

    async fn cancel_latest_payment(
        &self,
        external_subscription_ref: &str,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(
            r#"
            UPDATE subscription_payments
            SET status = 'cancelled'
            WHERE id = (
                SELECT id FROM subscription_payments
                WHERE external_subscription_ref = $1
                ORDER BY created_at DESC
                LIMIT 1
            )
            RETURNING id, centre_id, amount_minor, plan_type,
                      external_payment_id, external_subscription_ref,
                      status, created_at
            "#,
        )
        .bind(external_subscription_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(PaymentRecord::try_from).transpose()
    }
}
