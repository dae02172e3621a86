//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    checkout_callback, get_plans, get_status, handle_gateway_webhook, list_payments,
    start_trial, BillingAppState,
};

/// Create the billing API router.
///
/// # Routes
///
/// ## Centre Endpoints (require authenticated centre)
/// - `GET /plans` - plan catalog for the plan-selection flow
/// - `GET /status` - access gate evaluation and status label
/// - `GET /payments` - completed payment history
/// - `GET /callback` - client-redirect success callback after checkout
/// - `POST /trial` - start the trial (signup flow, exactly once)
///
/// ## Webhook Endpoints (no auth, signature verified)
/// - `POST /gateway` - gateway webhook intake, see `webhook_routes`
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/plans", get(get_plans))
        .route("/status", get(get_status))
        .route("/payments", get(list_payments))
        .route("/callback", get(checkout_callback))
        .route("/trial", post(start_trial))
}

/// Create the gateway webhook router.
///
/// Separate from the billing routes because webhooks carry no centre
/// session; they are authenticated by signature instead.
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/gateway", post(handle_gateway_webhook))
}

/// Create the complete billing module router.
///
/// Suitable for mounting at `/api`:
///
/// ```ignore
/// let app = Router::new()
///     .merge(billing_router())
///     .with_state(state);
/// ```
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .nest("/billing", billing_routes())
        .nest("/webhooks", webhook_routes())
}
