//! LedgerStore port - durable per-tenant subscription and payment records.
//!
//! The state machine never touches a database directly; it is handed this
//! interface explicitly. The port's shape encodes the two hard rules of
//! the billing core:
//!
//! - `external_payment_id` is unique across the ledger, enforced by the
//!   store, and is the single source of truth for "already processed".
//! - The payment insert and the subscription update for a charge are one
//!   atomic unit. A crash between the two must never be observable, and a
//!   duplicate key must leave the subscription untouched.
//!
//! ## Why this matters
//!
//! The gateway delivers webhooks at-least-once: retries, duplicate sends,
//! and the client-redirect callback all race for the same payment id. A
//! check-then-insert without atomicity would double-credit a tenant under
//! concurrent duplicate delivery.

use async_trait::async_trait;

use crate::domain::billing::{CentreSubscription, PaymentRecord};
use crate::domain::foundation::{CentreId, DomainError};

/// Result of attempting to record a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Payment inserted and subscription updated (first delivery).
    Recorded,
    /// The payment id already exists; nothing was changed.
    DuplicatePayment,
}

/// Port for the per-tenant subscription ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Reads a centre's subscription record.
    ///
    /// Returns `None` if the centre does not exist.
    async fn find_centre(&self, centre_id: &CentreId)
        -> Result<Option<CentreSubscription>, DomainError>;

    /// Persists subscription fields that have no payment attached
    /// (trial start).
    async fn update_subscription(
        &self,
        subscription: &CentreSubscription,
    ) -> Result<(), DomainError>;

    /// Finds a payment by its gateway payment id.
    ///
    /// Fast-path duplicate check; the authoritative check is the unique
    /// constraint inside [`LedgerStore::record_charge`].
    async fn find_payment_by_external_id(
        &self,
        external_payment_id: &str,
    ) -> Result<Option<PaymentRecord>, DomainError>;

    /// Atomically inserts a payment and applies the subscription update.
    ///
    /// Must behave as a single transaction with insert-if-absent
    /// semantics on `external_payment_id`: when the id already exists the
    /// subscription update is NOT applied and `DuplicatePayment` is
    /// returned. Payments without an external id always insert.
    async fn record_charge(
        &self,
        subscription: &CentreSubscription,
        payment: &PaymentRecord,
    ) -> Result<RecordOutcome, DomainError>;

    /// Lists a centre's payments, newest first.
    async fn list_payments(
        &self,
        centre_id: &CentreId,
    ) -> Result<Vec<PaymentRecord>, DomainError>;

    /// Marks the most recent payment for a gateway subscription as
    /// cancelled.
    ///
    /// Returns the updated record, or `None` when no payment matches the
    /// reference. Never touches the centre's subscription window.
    async fn cancel_latest_payment(
        &self,
        external_subscription_ref: &str,
    ) -> Result<Option<PaymentRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn ledger_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn LedgerStore) {}
    }
}
