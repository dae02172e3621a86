//! HTTP adapter for the billing module.

mod dto;
mod guard;
mod handlers;
mod routes;

pub use guard::{require_active_subscription, SubscriptionRequiredResponse};
pub use handlers::{AuthenticatedCentre, BillingAppState, SIGNATURE_HEADER};
pub use routes::{billing_router, billing_routes, webhook_routes};
