//! HandleGatewayWebhookHandler - Command handler for inbound gateway
//! webhooks.
//!
//! Verification happens before anything else touches the payload: a bad
//! signature is terminal and no state is mutated. After verification the
//! wire event is mapped onto a state machine transition and applied
//! through the engine, whose idempotency rules make redelivery safe.

use std::sync::Arc;

use crate::domain::billing::{
    SubscriptionEngine, TransitionOutcome, WebhookError, WebhookVerifier,
};

/// Command carrying the raw webhook request.
#[derive(Debug, Clone)]
pub struct HandleGatewayWebhookCommand {
    /// Exact raw body bytes, as signed by the gateway.
    pub payload: Vec<u8>,
    /// Hex signature header value, when present.
    pub signature: Option<String>,
}

/// Result of webhook processing, for acknowledgment decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    /// The transition was applied (or recognized as a duplicate no-op).
    Applied(TransitionOutcome),
    /// Recognized but intentionally not processed.
    Ignored(String),
    /// The event could not be attributed to any centre; logged and
    /// acknowledged since redelivery cannot succeed.
    Dropped,
}

/// Handler for verified gateway webhooks.
pub struct HandleGatewayWebhookHandler {
    verifier: WebhookVerifier,
    engine: Arc<SubscriptionEngine>,
}

impl HandleGatewayWebhookHandler {
    pub fn new(verifier: WebhookVerifier, engine: Arc<SubscriptionEngine>) -> Self {
        Self { verifier, engine }
    }

    pub async fn handle(
        &self,
        cmd: HandleGatewayWebhookCommand,
    ) -> Result<WebhookOutcome, WebhookError> {
        let signature = cmd.signature.as_deref().ok_or(WebhookError::MissingSignature)?;

        // 1. Authenticate the raw bytes.
        let gateway_event = self.verifier.verify_and_parse(&cmd.payload, signature)?;
        let event_name = gateway_event.event.clone();

        // 2. Map the wire event onto a transition.
        let billing_event = match gateway_event.to_billing_event() {
            Ok(event) => event,
            Err(WebhookError::Ignored(reason)) => {
                tracing::debug!(event = %event_name, %reason, "webhook ignored");
                return Ok(WebhookOutcome::Ignored(reason));
            }
            Err(WebhookError::UnresolvableCentre) => {
                tracing::warn!(event = %event_name, "webhook dropped: no centre id in event");
                return Ok(WebhookOutcome::Dropped);
            }
            Err(err) => return Err(err),
        };

        // 3. Apply it; duplicates surface as AlreadyApplied, not errors.
        let outcome = self
            .engine
            .apply(billing_event)
            .await
            .map_err(WebhookError::from)?;

        tracing::info!(event = %event_name, ?outcome, "webhook applied");
        Ok(WebhookOutcome::Applied(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedgerStore;
    use crate::domain::billing::{compute_test_signature, CentreSubscription, PlanCatalog};
    use crate::domain::foundation::{CentreId, Clock, ManualClock, Timestamp};
    use serde_json::json;

    const SECRET: &str = "whk_test_secret";

    struct Fixture {
        store: Arc<InMemoryLedgerStore>,
        handler: HandleGatewayWebhookHandler,
        centre_id: CentreId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryLedgerStore::new());
        let clock = Arc::new(ManualClock::fixed_at(Timestamp::now()));
        let centre_id = CentreId::new();
        store
            .seed_centre(CentreSubscription::fresh(centre_id, clock.now()))
            .await;

        let engine = Arc::new(SubscriptionEngine::new(
            store.clone(),
            clock,
            PlanCatalog::new("plan_m", "plan_y"),
        ));
        let handler = HandleGatewayWebhookHandler::new(WebhookVerifier::new(SECRET), engine);

        Fixture {
            store,
            handler,
            centre_id,
        }
    }

    fn signed(body: &serde_json::Value) -> HandleGatewayWebhookCommand {
        let payload = serde_json::to_vec(body).unwrap();
        let signature = compute_test_signature(SECRET, &payload);
        HandleGatewayWebhookCommand {
            payload,
            signature: Some(signature),
        }
    }

    fn charged_body(centre_id: &CentreId, payment_id: &str) -> serde_json::Value {
        json!({
            "event": "subscription.charged",
            "payload": {
                "payment": { "entity": { "id": payment_id, "amount": 69900, "notes": {} } },
                "subscription": {
                    "entity": {
                        "id": "sub_1",
                        "notes": { "centre_id": centre_id.to_string(), "plan_type": "monthly" }
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn applies_verified_charge() {
        let fx = fixture().await;

        let outcome = fx
            .handler
            .handle(signed(&charged_body(&fx.centre_id, "pay_1")))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            WebhookOutcome::Applied(TransitionOutcome::Extended { .. })
        ));
        assert_eq!(fx.store.payment_count().await, 1);
    }

    #[tokio::test]
    async fn redelivery_is_a_safe_noop() {
        let fx = fixture().await;
        let body = charged_body(&fx.centre_id, "pay_1");

        fx.handler.handle(signed(&body)).await.unwrap();
        let outcome = fx.handler.handle(signed(&body)).await.unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::Applied(TransitionOutcome::AlreadyApplied)
        );
        assert_eq!(fx.store.payment_count().await, 1);
    }

    #[tokio::test]
    async fn missing_signature_is_rejected_before_parsing() {
        let fx = fixture().await;
        let cmd = HandleGatewayWebhookCommand {
            payload: serde_json::to_vec(&charged_body(&fx.centre_id, "pay_1")).unwrap(),
            signature: None,
        };

        let err = fx.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, WebhookError::MissingSignature));
        assert_eq!(fx.store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn bad_signature_mutates_nothing() {
        let fx = fixture().await;
        let cmd = HandleGatewayWebhookCommand {
            payload: serde_json::to_vec(&charged_body(&fx.centre_id, "pay_1")).unwrap(),
            signature: Some("0".repeat(64)),
        };

        let err = fx.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature));
        assert_eq!(fx.store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn event_without_centre_id_is_dropped() {
        let fx = fixture().await;
        let body = json!({
            "event": "subscription.charged",
            "payload": {
                "payment": { "entity": { "id": "pay_1", "amount": 100, "notes": {} } },
                "subscription": { "entity": { "id": "sub_1", "notes": {} } }
            }
        });

        let outcome = fx.handler.handle(signed(&body)).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Dropped);
        assert_eq!(fx.store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn unhandled_event_names_are_ignored() {
        let fx = fixture().await;
        let body = json!({ "event": "invoice.generated" });

        let outcome = fx.handler.handle(signed(&body)).await.unwrap();
        assert!(matches!(outcome, WebhookOutcome::Ignored(_)));
    }

    #[tokio::test]
    async fn unknown_plan_in_capture_still_records_payment() {
        let fx = fixture().await;
        let body = json!({
            "event": "payment.captured",
            "payload": {
                "payment": {
                    "entity": {
                        "id": "pay_w",
                        "amount": 69900,
                        "notes": {
                            "centre_id": fx.centre_id.to_string(),
                            "plan_type": "weekly"
                        }
                    }
                }
            }
        });

        let outcome = fx.handler.handle(signed(&body)).await.unwrap();
        assert!(matches!(
            outcome,
            WebhookOutcome::Applied(TransitionOutcome::Extended { .. })
        ));
        assert_eq!(fx.store.payment_count().await, 1);
    }
}
