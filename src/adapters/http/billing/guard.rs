//! Subscription guard middleware.
//!
//! Protected routes run through this layer on every request: the access
//! gate is re-evaluated each time, and an inactive centre receives a 402
//! pointing at the plan-selection flow instead of the requested resource.
//! The guard itself never fails a request; gate errors already degrade
//! to "inactive" inside the handler.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::application::handlers::billing::CheckAccessQuery;

use super::handlers::{AuthenticatedCentre, BillingAppState};

/// Body returned to inactive centres.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequiredResponse {
    pub error: &'static str,
    pub message: &'static str,
    /// Where the client should send the user.
    pub plans_url: &'static str,
}

impl Default for SubscriptionRequiredResponse {
    fn default() -> Self {
        Self {
            error: "SUBSCRIPTION_REQUIRED",
            message: "Active subscription required to access this feature.",
            plans_url: "/api/billing/plans",
        }
    }
}

/// Middleware requiring an active subscription for the wrapped routes.
pub async fn require_active_subscription(
    State(state): State<BillingAppState>,
    centre: AuthenticatedCentre,
    request: Request,
    next: Next,
) -> Response {
    let status = state
        .check_access_handler()
        .handle(CheckAccessQuery {
            centre_id: centre.centre_id,
        })
        .await;

    if status.active {
        next.run(request).await
    } else {
        tracing::debug!(
            centre_id = %centre.centre_id,
            label = %status.label,
            "blocked by subscription guard"
        );
        (
            StatusCode::PAYMENT_REQUIRED,
            Json(SubscriptionRequiredResponse::default()),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use crate::adapters::memory::InMemoryLedgerStore;
    use crate::domain::billing::{CentreSubscription, PlanCatalog};
    use crate::domain::foundation::{CentreId, Clock, ManualClock, Timestamp};

    async fn protected_app() -> (Router, Arc<ManualClock>, CentreId) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let clock = Arc::new(ManualClock::fixed_at(Timestamp::now()));
        let centre_id = CentreId::new();

        let mut subscription = CentreSubscription::fresh(centre_id, clock.now());
        subscription.start_trial(clock.now()).unwrap();
        store.seed_centre(subscription).await;

        let state = BillingAppState::new(
            store,
            clock.clone(),
            PlanCatalog::new("plan_m", "plan_y"),
            "whk_secret",
        );

        let app = Router::new()
            .route("/protected", get(|| async { "ok" }))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                require_active_subscription,
            ))
            .with_state(state);

        (app, clock, centre_id)
    }

    fn request_for(centre_id: &CentreId) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri("/protected")
            .header("X-Centre-Id", centre_id.to_string())
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn active_centre_passes_through() {
        let (app, _clock, centre_id) = protected_app().await;

        let response = app.oneshot(request_for(&centre_id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn expired_centre_gets_payment_required() {
        let (app, clock, centre_id) = protected_app().await;
        clock.advance_days(15);

        let response = app.oneshot(request_for(&centre_id)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn unknown_centre_is_blocked() {
        let (app, _clock, _centre_id) = protected_app().await;

        let response = app.oneshot(request_for(&CentreId::new())).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn unauthenticated_request_is_rejected() {
        let (app, _clock, _centre_id) = protected_app().await;

        let request = HttpRequest::builder()
            .uri("/protected")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
