//! Billing domain module.
//!
//! The subscription lifecycle core: trial and paid access windows, the
//! payment ledger, the webhook-driven state machine, and signature
//! verification for inbound gateway events.
//!
//! # Module Structure
//!
//! - `plan` - plan catalog (identifiers, prices, durations)
//! - `subscription` - per-centre subscription record and access gate
//! - `payment` - payment ledger types
//! - `event` - state machine transition triggers
//! - `engine` - the state machine itself
//! - `gateway_event` - webhook wire model and event mapping
//! - `webhook_verifier` - HMAC signature verification
//! - `errors` - webhook error taxonomy with HTTP/retry semantics

mod engine;
mod errors;
mod event;
mod gateway_event;
mod payment;
mod plan;
mod subscription;
mod webhook_verifier;

pub use engine::{SubscriptionEngine, TransitionOutcome};
pub use errors::WebhookError;
pub use event::BillingEvent;
pub use gateway_event::{
    EntityWrapper, GatewayEvent, GatewayEventKind, GatewayPayload, PaymentEntity,
    SubscriptionEntity,
};
pub use payment::{PaymentRecord, PaymentStatus};
pub use plan::{Plan, PlanCatalog, PlanId};
pub use subscription::{CentreSubscription, SubscriptionKind, TRIAL_DAYS};
pub use webhook_verifier::WebhookVerifier;

#[cfg(test)]
pub(crate) use webhook_verifier::compute_test_signature;
