//! CheckAccessHandler - Query handler for the per-request access gate.
//!
//! Evaluates the gate fresh on every call: the verdict is a pure function
//! of the stored subscription fields and the current time, never cached.
//!
//! Fail-secure: on ANY store error, access is denied rather than the
//! request failing. An expired label is the worst a broken store can
//! cause, never an unhandled fault in the surrounding request.

use std::sync::Arc;

use crate::domain::foundation::{CentreId, Clock};
use crate::domain::billing::SubscriptionKind;
use crate::ports::LedgerStore;

/// Query for a centre's access status.
#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub centre_id: CentreId,
}

/// Access gate verdict plus the human-readable status.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessStatus {
    pub active: bool,
    pub kind: SubscriptionKind,
    pub label: String,
    /// Whole days of access remaining, floored.
    pub days_remaining: i64,
}

impl AccessStatus {
    fn inactive() -> Self {
        Self {
            active: false,
            kind: SubscriptionKind::None,
            label: "Subscription Expired".to_string(),
            days_remaining: 0,
        }
    }
}

/// Handler evaluating the access gate.
pub struct CheckAccessHandler {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl CheckAccessHandler {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Evaluates the gate. Infallible by design; failures degrade to
    /// "treat as inactive".
    pub async fn handle(&self, query: CheckAccessQuery) -> AccessStatus {
        let now = self.clock.now();

        let subscription = match self.store.find_centre(&query.centre_id).await {
            Ok(Some(subscription)) => subscription,
            Ok(None) => {
                tracing::debug!(centre_id = %query.centre_id, "access check for unknown centre");
                return AccessStatus::inactive();
            }
            Err(err) => {
                tracing::warn!(
                    centre_id = %query.centre_id,
                    error = %err,
                    "access check degraded to inactive: store error"
                );
                return AccessStatus::inactive();
            }
        };

        AccessStatus {
            active: subscription.is_active(now),
            kind: subscription.kind,
            label: subscription.status_label(now),
            days_remaining: subscription.days_remaining(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedgerStore;
    use crate::domain::billing::{CentreSubscription, PaymentRecord, PlanId};
    use crate::domain::foundation::{DomainError, ManualClock, Timestamp};
    use crate::ports::RecordOutcome;
    use async_trait::async_trait;

    struct Fixture {
        store: Arc<InMemoryLedgerStore>,
        clock: Arc<ManualClock>,
        handler: CheckAccessHandler,
        centre_id: CentreId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryLedgerStore::new());
        let clock = Arc::new(ManualClock::fixed_at(Timestamp::now()));
        let centre_id = CentreId::new();
        store
            .seed_centre(CentreSubscription::fresh(centre_id, clock.now()))
            .await;

        let handler = CheckAccessHandler::new(store.clone(), clock.clone());
        Fixture {
            store,
            clock,
            handler,
            centre_id,
        }
    }

    #[tokio::test]
    async fn trial_centre_is_active_with_days_left() {
        let fx = fixture().await;
        let mut sub = fx.store.find_centre(&fx.centre_id).await.unwrap().unwrap();
        sub.start_trial(fx.clock.now()).unwrap();
        fx.store.update_subscription(&sub).await.unwrap();

        let status = fx
            .handler
            .handle(CheckAccessQuery {
                centre_id: fx.centre_id,
            })
            .await;

        assert!(status.active);
        assert_eq!(status.kind, SubscriptionKind::Trial);
        assert_eq!(status.label, "Trial - 14 days left");
        assert_eq!(status.days_remaining, 14);
    }

    #[tokio::test]
    async fn expired_trial_reads_expired() {
        let fx = fixture().await;
        let mut sub = fx.store.find_centre(&fx.centre_id).await.unwrap().unwrap();
        sub.start_trial(fx.clock.now()).unwrap();
        fx.store.update_subscription(&sub).await.unwrap();

        fx.clock.advance_days(15);
        let status = fx
            .handler
            .handle(CheckAccessQuery {
                centre_id: fx.centre_id,
            })
            .await;

        assert!(!status.active);
        assert_eq!(status.label, "Subscription Expired");
    }

    #[tokio::test]
    async fn unknown_centre_is_inactive() {
        let fx = fixture().await;
        let status = fx
            .handler
            .handle(CheckAccessQuery {
                centre_id: CentreId::new(),
            })
            .await;

        assert!(!status.active);
    }

    #[tokio::test]
    async fn store_failure_degrades_to_inactive() {
        struct FailingStore;

        #[async_trait]
        impl LedgerStore for FailingStore {
            async fn find_centre(
                &self,
                _centre_id: &CentreId,
            ) -> Result<Option<CentreSubscription>, DomainError> {
                Err(DomainError::database("connection refused"))
            }

            async fn update_subscription(
                &self,
                _subscription: &CentreSubscription,
            ) -> Result<(), DomainError> {
                Err(DomainError::database("connection refused"))
            }

            async fn find_payment_by_external_id(
                &self,
                _external_payment_id: &str,
            ) -> Result<Option<PaymentRecord>, DomainError> {
                Err(DomainError::database("connection refused"))
            }

            async fn record_charge(
                &self,
                _subscription: &CentreSubscription,
                _payment: &PaymentRecord,
            ) -> Result<RecordOutcome, DomainError> {
                Err(DomainError::database("connection refused"))
            }

            async fn list_payments(
                &self,
                _centre_id: &CentreId,
            ) -> Result<Vec<PaymentRecord>, DomainError> {
                Err(DomainError::database("connection refused"))
            }

            async fn cancel_latest_payment(
                &self,
                _external_subscription_ref: &str,
            ) -> Result<Option<PaymentRecord>, DomainError> {
                Err(DomainError::database("connection refused"))
            }
        }

        let clock = Arc::new(ManualClock::fixed_at(Timestamp::now()));
        let handler = CheckAccessHandler::new(Arc::new(FailingStore), clock);

        let status = handler
            .handle(CheckAccessQuery {
                centre_id: CentreId::new(),
            })
            .await;

        assert!(!status.active);
        assert_eq!(status.label, "Subscription Expired");
    }

    #[tokio::test]
    async fn paid_centre_is_active_until_window_end() {
        let fx = fixture().await;
        let mut sub = fx.store.find_centre(&fx.centre_id).await.unwrap().unwrap();
        sub.activate(PlanId::Monthly, "sub_1", fx.clock.now()).unwrap();
        fx.store.update_subscription(&sub).await.unwrap();

        fx.clock.advance_days(29);
        let status = fx
            .handler
            .handle(CheckAccessQuery {
                centre_id: fx.centre_id,
            })
            .await;
        assert!(status.active);
        assert_eq!(status.label, "Monthly - Active");

        fx.clock.advance_days(2);
        let status = fx
            .handler
            .handle(CheckAccessQuery {
                centre_id: fx.centre_id,
            })
            .await;
        assert!(!status.active);
    }
}
