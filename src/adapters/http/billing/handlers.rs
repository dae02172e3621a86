//! HTTP handlers for the billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query
//! handlers. The webhook endpoint is the only one without an
//! authenticated centre; it authenticates by signature instead.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::handlers::billing::{
    CheckAccessHandler, CheckAccessQuery, ConfirmCheckoutCommand, ConfirmCheckoutHandler,
    ConfirmCheckoutResult, HandleGatewayWebhookCommand, HandleGatewayWebhookHandler,
    ListPaymentsHandler, ListPaymentsQuery, StartTrialCommand, StartTrialHandler,
};
use crate::domain::billing::{
    PlanCatalog, SubscriptionEngine, WebhookError, WebhookVerifier,
};
use crate::domain::foundation::{CentreId, Clock, DomainError, ErrorCode};
use crate::ports::LedgerStore;

use super::dto::{
    CallbackParams, CallbackResponse, ErrorResponse, PaymentResponse, PlanResponse,
    SubscriptionStatusResponse, TrialResponse,
};

/// Name of the gateway's signature header.
pub const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

// ════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════

/// Shared state for the billing routes.
///
/// Cloned per request; dependencies are Arc-wrapped.
#[derive(Clone)]
pub struct BillingAppState {
    pub store: Arc<dyn LedgerStore>,
    pub clock: Arc<dyn Clock>,
    pub engine: Arc<SubscriptionEngine>,
    pub catalog: PlanCatalog,
    webhook_secret: String,
}

impl BillingAppState {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        catalog: PlanCatalog,
        webhook_secret: impl Into<String>,
    ) -> Self {
        let engine = Arc::new(SubscriptionEngine::new(
            store.clone(),
            clock.clone(),
            catalog.clone(),
        ));
        Self {
            store,
            clock,
            engine,
            catalog,
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Create handlers on demand from the shared state.
    pub fn start_trial_handler(&self) -> StartTrialHandler {
        StartTrialHandler::new(self.engine.clone())
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.store.clone(), self.clock.clone())
    }

    pub fn confirm_checkout_handler(&self) -> ConfirmCheckoutHandler {
        ConfirmCheckoutHandler::new(self.engine.clone())
    }

    pub fn list_payments_handler(&self) -> ListPaymentsHandler {
        ListPaymentsHandler::new(self.store.clone())
    }

    pub fn webhook_handler(&self) -> HandleGatewayWebhookHandler {
        HandleGatewayWebhookHandler::new(
            WebhookVerifier::new(self.webhook_secret.clone()),
            self.engine.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Centre Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════

/// Authenticated centre context extracted from the request.
///
/// In production this comes from the session established by the outer
/// auth layer; here it is read from an `X-Centre-Id` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedCentre {
    pub centre_id: CentreId,
}

/// Rejection type for AuthenticatedCentre extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedCentre
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let centre_id = parts
            .headers
            .get("X-Centre-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedCentre { centre_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /plans - the plan catalog for the plan-selection flow.
pub async fn get_plans(State(state): State<BillingAppState>) -> Json<Vec<PlanResponse>> {
    Json(state.catalog.all().map(PlanResponse::from).to_vec())
}

/// GET /status - access gate evaluation for the authenticated centre.
pub async fn get_status(
    State(state): State<BillingAppState>,
    centre: AuthenticatedCentre,
) -> Json<SubscriptionStatusResponse> {
    let status = state
        .check_access_handler()
        .handle(CheckAccessQuery {
            centre_id: centre.centre_id,
        })
        .await;
    Json(status.into())
}

/// GET /payments - the centre's completed payment history.
pub async fn list_payments(
    State(state): State<BillingAppState>,
    centre: AuthenticatedCentre,
) -> Result<Json<Vec<PaymentResponse>>, BillingApiError> {
    let payments = state
        .list_payments_handler()
        .handle(ListPaymentsQuery {
            centre_id: centre.centre_id,
        })
        .await?;
    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

/// POST /trial - open the trial window for a newly created centre.
pub async fn start_trial(
    State(state): State<BillingAppState>,
    centre: AuthenticatedCentre,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .start_trial_handler()
        .handle(StartTrialCommand {
            centre_id: centre.centre_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TrialResponse {
            trial_end: result.trial_end,
        }),
    ))
}

/// GET /callback - client-redirect success callback after checkout.
pub async fn checkout_callback(
    State(state): State<BillingAppState>,
    centre: AuthenticatedCentre,
    Query(params): Query<CallbackParams>,
) -> Result<Json<CallbackResponse>, BillingApiError> {
    let result = state
        .confirm_checkout_handler()
        .handle(ConfirmCheckoutCommand {
            centre_id: centre.centre_id,
            plan: params.plan,
            external_payment_id: params.payment_id,
            external_subscription_ref: params.subscription_id,
        })
        .await?;

    let status = match result {
        ConfirmCheckoutResult::Applied => "applied",
        ConfirmCheckoutResult::AlreadyApplied => "already_applied",
    };
    Ok(Json(CallbackResponse { status }))
}

/// POST /webhooks/gateway - verified gateway webhook intake.
///
/// The response class drives the gateway's retry behavior, so errors map
/// through [`WebhookError::status_code`] rather than the generic API
/// error mapping.
pub async fn handle_gateway_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> axum::response::Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let handler = state.webhook_handler();
    let cmd = HandleGatewayWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match handler.handle(cmd).await {
        Ok(_) => (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response(),
        Err(err) => webhook_error_response(err),
    }
}

fn webhook_error_response(err: WebhookError) -> axum::response::Response {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!(error = %err, "webhook processing failed, gateway will retry");
    } else {
        tracing::warn!(error = %err, "webhook rejected");
    }
    let body = ErrorResponse::new("WEBHOOK_ERROR", err.to_string());
    (status, Json(body)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
pub struct BillingApiError(DomainError);

impl From<DomainError> for BillingApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0.code {
            ErrorCode::CentreNotFound | ErrorCode::PaymentNotFound => StatusCode::NOT_FOUND,
            ErrorCode::PlanNotFound
            | ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
            ErrorCode::TrialAlreadyStarted | ErrorCode::InvalidStateTransition => {
                StatusCode::CONFLICT
            }
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "billing request failed");
        }

        let body = ErrorResponse::new(self.0.code.to_string(), self.0.message);
        (status, Json(body)).into_response()
    }
}
