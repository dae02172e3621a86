//! Payment ledger types.
//!
//! Payment records are the audit trail of everything the gateway has
//! charged. Rows are append-only: once created they are never deleted and
//! only the status field may change.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CentreId, Money, PaymentId, StateMachine, Timestamp};

use super::plan::PlanId;

/// Lifecycle status of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created locally, not yet confirmed by the gateway.
    Pending,
    /// Confirmed by the gateway; the access window was extended.
    Completed,
    /// The recurring subscription behind this payment was cancelled.
    Cancelled,
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Completed) | (Pending, Cancelled) | (Completed, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Completed, Cancelled],
            Completed => vec![Cancelled],
            Cancelled => vec![],
        }
    }
}

/// One row of the subscription payment ledger.
///
/// # Invariants
///
/// - `external_payment_id`, when present, is unique across the ledger;
///   the store enforces this and it is the idempotency key for webhook
///   redelivery.
/// - Owned by exactly one centre; never rewritten except `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,

    /// Centre that owns this payment.
    pub centre_id: CentreId,

    /// Charged amount in the display currency.
    #[serde(with = "money_minor_units")]
    pub amount: Money,

    /// Plan the payment was for.
    pub plan: PlanId,

    /// Gateway payment identifier. Absent for pre-gateway test data.
    pub external_payment_id: Option<String>,

    /// Gateway subscription object, when the payment belongs to a
    /// recurring subscription. Absent for one-off direct payments.
    pub external_subscription_ref: Option<String>,

    pub status: PaymentStatus,

    pub created_at: Timestamp,
}

impl PaymentRecord {
    /// Creates a completed payment row for a verified gateway charge.
    pub fn completed(
        centre_id: CentreId,
        amount: Money,
        plan: PlanId,
        external_payment_id: Option<String>,
        external_subscription_ref: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            centre_id,
            amount,
            plan,
            external_payment_id,
            external_subscription_ref,
            status: PaymentStatus::Completed,
            created_at: now,
        }
    }

    /// Marks the payment cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the current status does not allow cancellation
    /// (already cancelled).
    pub fn cancel(&mut self) -> Result<(), crate::domain::foundation::ValidationError> {
        self.status = self.status.transition_to(PaymentStatus::Cancelled)?;
        Ok(())
    }
}

/// Serde helper keeping ledger amounts as exact minor-unit integers.
mod money_minor_units {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::domain::foundation::Money;

    pub fn serialize<S: Serializer>(amount: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        amount.minor_units().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        i64::deserialize(deserializer).map(Money::from_minor_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payment() -> PaymentRecord {
        PaymentRecord::completed(
            CentreId::new(),
            Money::from_minor_units(69_900),
            PlanId::Monthly,
            Some("pay_abc".to_string()),
            Some("sub_abc".to_string()),
            Timestamp::now(),
        )
    }

    #[test]
    fn completed_constructor_sets_status() {
        let payment = sample_payment();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.amount, Money::from_minor_units(69_900));
    }

    #[test]
    fn completed_payment_can_be_cancelled() {
        let mut payment = sample_payment();
        payment.cancel().unwrap();
        assert_eq!(payment.status, PaymentStatus::Cancelled);
    }

    #[test]
    fn cancelled_payment_cannot_be_cancelled_again() {
        let mut payment = sample_payment();
        payment.cancel().unwrap();
        assert!(payment.cancel().is_err());
    }

    #[test]
    fn pending_can_complete_or_cancel() {
        assert!(PaymentStatus::Pending.can_transition_to(&PaymentStatus::Completed));
        assert!(PaymentStatus::Pending.can_transition_to(&PaymentStatus::Cancelled));
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(PaymentStatus::Cancelled.is_terminal());
    }

    #[test]
    fn completed_cannot_revert_to_pending() {
        assert!(!PaymentStatus::Completed.can_transition_to(&PaymentStatus::Pending));
    }

    #[test]
    fn record_serializes_amount_as_minor_units() {
        let payment = sample_payment();
        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["amount"], 69_900);

        let back: PaymentRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.amount, payment.amount);
    }
}
