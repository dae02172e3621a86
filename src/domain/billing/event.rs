//! Billing events consumed by the subscription state machine.
//!
//! Each variant is one recognized transition trigger: the trial start at
//! centre creation, the verified gateway webhooks, and the best-effort
//! client-redirect callback. Events carry already-extracted identifiers;
//! wire parsing lives in `gateway_event`.

use crate::domain::foundation::{CentreId, Money};

use super::plan::PlanId;

/// A transition trigger for the subscription state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingEvent {
    /// Fired exactly once per centre, at creation time.
    TrialStarted { centre_id: CentreId },

    /// First confirmation that a recurring subscription is live.
    SubscriptionActivated {
        centre_id: CentreId,
        plan: PlanId,
        external_subscription_ref: String,
        /// Payment behind the activation, when the gateway reports one.
        /// The idempotency key for redelivery.
        external_payment_id: Option<String>,
        /// Captured amount; the catalog price is used when absent.
        amount: Option<Money>,
    },

    /// A recurring charge succeeded.
    SubscriptionCharged {
        centre_id: CentreId,
        external_subscription_ref: String,
        external_payment_id: String,
        amount: Money,
        /// Plan type carried in the event metadata. Used when the charge
        /// outruns the activation and the centre has no paid kind yet.
        plan_hint: Option<PlanId>,
    },

    /// A one-off payment not tied to a recurring subscription object.
    DirectPaymentCaptured {
        centre_id: CentreId,
        /// Plan from the payload; `monthly` when absent or unknown.
        plan: Option<PlanId>,
        external_payment_id: String,
        amount: Money,
    },

    /// The recurring subscription was cancelled at the gateway.
    ///
    /// Stops future renewal only; already-paid access is never clawed
    /// back, so the paid window is left untouched.
    SubscriptionCancelled { external_subscription_ref: String },

    /// Client-side success callback after checkout.
    ///
    /// Best-effort secondary trigger that races the webhook; applies the
    /// same idempotent transition, so whichever arrives first wins.
    CheckoutConfirmed {
        centre_id: CentreId,
        plan: PlanId,
        external_payment_id: String,
        external_subscription_ref: Option<String>,
    },
}

impl BillingEvent {
    /// The idempotency key of this event, when it has one.
    pub fn external_payment_id(&self) -> Option<&str> {
        match self {
            BillingEvent::SubscriptionActivated {
                external_payment_id,
                ..
            } => external_payment_id.as_deref(),
            BillingEvent::SubscriptionCharged {
                external_payment_id,
                ..
            }
            | BillingEvent::DirectPaymentCaptured {
                external_payment_id,
                ..
            }
            | BillingEvent::CheckoutConfirmed {
                external_payment_id,
                ..
            } => Some(external_payment_id),
            _ => None,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            BillingEvent::TrialStarted { .. } => "trial_started",
            BillingEvent::SubscriptionActivated { .. } => "subscription_activated",
            BillingEvent::SubscriptionCharged { .. } => "subscription_charged",
            BillingEvent::DirectPaymentCaptured { .. } => "direct_payment_captured",
            BillingEvent::SubscriptionCancelled { .. } => "subscription_cancelled",
            BillingEvent::CheckoutConfirmed { .. } => "checkout_confirmed",
        }
    }
}
