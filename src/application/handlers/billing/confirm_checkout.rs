//! ConfirmCheckoutHandler - Command handler for the client-redirect
//! success callback.
//!
//! The user's browser lands here after checkout, usually before the
//! gateway webhook arrives, sometimes instead of it. The callback drives
//! the same idempotent transition as the webhook, so whichever of the two
//! gets there first performs the state change and the other is a no-op.

use std::sync::Arc;

use crate::domain::billing::{
    BillingEvent, PlanId, SubscriptionEngine, TransitionOutcome,
};
use crate::domain::foundation::{CentreId, DomainError};

/// Command carrying the redirect parameters.
#[derive(Debug, Clone)]
pub struct ConfirmCheckoutCommand {
    pub centre_id: CentreId,
    /// Plan identifier from the redirect query. Money has already been
    /// captured, so an unknown value falls back to monthly.
    pub plan: Option<String>,
    pub external_payment_id: String,
    pub external_subscription_ref: Option<String>,
}

/// Result of the callback.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmCheckoutResult {
    /// This callback performed the transition.
    Applied,
    /// The webhook got there first; nothing to do.
    AlreadyApplied,
}

/// Handler for the checkout success callback.
pub struct ConfirmCheckoutHandler {
    engine: Arc<SubscriptionEngine>,
}

impl ConfirmCheckoutHandler {
    pub fn new(engine: Arc<SubscriptionEngine>) -> Self {
        Self { engine }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmCheckoutCommand,
    ) -> Result<ConfirmCheckoutResult, DomainError> {
        let plan = cmd
            .plan
            .as_deref()
            .and_then(PlanId::parse)
            .unwrap_or(PlanId::Monthly);

        let outcome = self
            .engine
            .apply(BillingEvent::CheckoutConfirmed {
                centre_id: cmd.centre_id,
                plan,
                external_payment_id: cmd.external_payment_id.clone(),
                external_subscription_ref: cmd.external_subscription_ref,
            })
            .await?;

        match outcome {
            TransitionOutcome::AlreadyApplied => {
                tracing::debug!(
                    centre_id = %cmd.centre_id,
                    payment_id = %cmd.external_payment_id,
                    "checkout callback after webhook, no-op"
                );
                Ok(ConfirmCheckoutResult::AlreadyApplied)
            }
            other => {
                tracing::info!(
                    centre_id = %cmd.centre_id,
                    payment_id = %cmd.external_payment_id,
                    ?other,
                    "checkout confirmed via client callback"
                );
                Ok(ConfirmCheckoutResult::Applied)
            }
        }
    }
}
