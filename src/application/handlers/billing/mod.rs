//! Billing command and query handlers.
//!
//! One handler per use case, wiring the state machine and the ledger
//! store to the transport layer.

mod check_access;
mod confirm_checkout;
mod handle_gateway_webhook;
mod list_payments;
mod start_trial;

pub use check_access::{AccessStatus, CheckAccessHandler, CheckAccessQuery};
pub use confirm_checkout::{
    ConfirmCheckoutCommand, ConfirmCheckoutHandler, ConfirmCheckoutResult,
};
pub use handle_gateway_webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, WebhookOutcome,
};
pub use list_payments::{ListPaymentsHandler, ListPaymentsQuery};
pub use start_trial::{StartTrialCommand, StartTrialHandler, StartTrialResult};
