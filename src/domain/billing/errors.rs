//! Webhook error types for gateway event handling.
//!
//! Defines the error conditions that can occur while verifying and
//! applying gateway webhooks, with HTTP status mapping and retryability
//! semantics. The status class controls the gateway's retry behavior, so
//! the mapping is part of the contract, not presentation detail.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The signature header was not supplied.
    #[error("Missing signature header")]
    MissingSignature,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Failed to parse the webhook payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No centre id could be derived from the event.
    ///
    /// Fatal for this event: the gateway would redeliver the same broken
    /// payload forever, so it is logged and acknowledged instead.
    #[error("No centre id resolvable from event")]
    UnresolvableCentre,

    /// The referenced centre does not exist (yet).
    #[error("Centre not found: {0}")]
    CentreNotFound(String),

    /// The event payload was rejected by domain rules.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// The ledger store failed; no partial state was left behind.
    #[error("Store error: {0}")]
    Store(String),
}

impl WebhookError {
    /// Returns true if the gateway should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Store(_)
                // Might be eventual consistency between signup and webhook
                | WebhookError::CentreNotFound(_)
        )
    }

    /// Maps the error to the HTTP status returned to the gateway.
    ///
    /// - 2xx: acknowledged, no retry (duplicates, ignored, unresolvable)
    /// - 4xx: permanently rejected, no retry (signature, payload faults)
    /// - 5xx: transient, the gateway retries (store failures)
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }

            WebhookError::ParseError(_)
            | WebhookError::MissingField(_)
            | WebhookError::Rejected(_) => StatusCode::BAD_REQUEST,

            // A retry can never resolve the centre; acknowledge and drop.
            WebhookError::UnresolvableCentre => StatusCode::OK,

            WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::CentreNotFound(_) | WebhookError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::CentreNotFound => WebhookError::CentreNotFound(err.message),
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                WebhookError::Store(err.message)
            }
            _ => WebhookError::Rejected(err.to_string()),
        }
    }
}
