//! In-memory LedgerStore implementation.
//!
//! Backs the test suites and local development. A single write lock per
//! operation gives the same observable atomicity as the database
//! transaction in the PostgreSQL adapter: the duplicate check, the
//! payment insert, and the subscription update happen under one critical
//! section.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::{CentreSubscription, PaymentRecord, PaymentStatus};
use crate::domain::foundation::{CentreId, DomainError, ErrorCode, StateMachine};
use crate::ports::{LedgerStore, RecordOutcome};

#[derive(Default)]
struct Inner {
    centres: HashMap<CentreId, CentreSubscription>,
    payments: Vec<PaymentRecord>,
}

/// In-memory ledger store.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Inner>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a centre record, as the signup flow would.
    pub async fn seed_centre(&self, subscription: CentreSubscription) {
        let mut inner = self.inner.write().await;
        inner.centres.insert(subscription.centre_id, subscription);
    }

    /// Total number of ledger rows, duplicates-check helper for tests.
    pub async fn payment_count(&self) -> usize {
        self.inner.read().await.payments.len()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn find_centre(
        &self,
        centre_id: &CentreId,
    ) -> Result<Option<CentreSubscription>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.centres.get(centre_id).cloned())
    }

    async fn update_subscription(
        &self,
        subscription: &CentreSubscription,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.write().await;
        if !inner.centres.contains_key(&subscription.centre_id) {
            return Err(DomainError::new(
                ErrorCode::CentreNotFound,
                format!("Centre {} does not exist", subscription.centre_id),
            ));
        }
        inner
            .centres
            .insert(subscription.centre_id, subscription.clone());
        Ok(())
    }

    async fn find_payment_by_external_id(
        &self,
        external_payment_id: &str,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner
            .payments
            .iter()
            .find(|p| p.external_payment_id.as_deref() == Some(external_payment_id))
            .cloned())
    }

    async fn record_charge(
        &self,
        subscription: &CentreSubscription,
        payment: &PaymentRecord,
    ) -> Result<RecordOutcome, DomainError> {
        let mut inner = self.inner.write().await;

        if !inner.centres.contains_key(&subscription.centre_id) {
            return Err(DomainError::new(
                ErrorCode::CentreNotFound,
                format!("Centre {} does not exist", subscription.centre_id),
            ));
        }

        if let Some(external_id) = payment.external_payment_id.as_deref() {
            let exists = inner
                .payments
                .iter()
                .any(|p| p.external_payment_id.as_deref() == Some(external_id));
            if exists {
                return Ok(RecordOutcome::DuplicatePayment);
            }
        }

        inner.payments.push(payment.clone());
        inner
            .centres
            .insert(subscription.centre_id, subscription.clone());
        Ok(RecordOutcome::Recorded)
    }

    async fn list_payments(
        &self,
        centre_id: &CentreId,
    ) -> Result<Vec<PaymentRecord>, DomainError> {
        let inner = self.inner.read().await;
        let mut payments: Vec<PaymentRecord> = inner
            .payments
            .iter()
            .filter(|p| &p.centre_id == centre_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    async fn cancel_latest_payment(
        &self,
        external_subscription_ref: &str,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let mut inner = self.inner.write().await;
        let latest = inner
            .payments
            .iter_mut()
            .filter(|p| {
                p.external_subscription_ref.as_deref() == Some(external_subscription_ref)
            })
            .max_by_key(|p| p.created_at);

        match latest {
            Some(payment) => {
                if payment.status != PaymentStatus::Cancelled {
                    payment.status = payment
                        .status
                        .transition_to(PaymentStatus::Cancelled)
                        .map_err(DomainError::from)?;
                }
                Ok(Some(payment.clone()))
            }
            None => Ok(None),
        }
    }
}
