//! Gateway webhook event payloads.
//!
//! Wire model for the payment gateway's webhook body: a top-level event
//! name plus `payload.payment.entity` / `payload.subscription.entity`
//! objects. The centre id and plan type travel in the free-form `notes`
//! bag attached to those entities, and amounts arrive in minor currency
//! units. Only the fields needed for processing are captured.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CentreId, Money};

use super::errors::WebhookError;
use super::event::BillingEvent;
use super::plan::PlanId;

/// A parsed gateway webhook event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayEvent {
    /// Event name, e.g. "subscription.charged".
    pub event: String,

    /// Event-specific entities.
    #[serde(default)]
    pub payload: GatewayPayload,
}

/// Container for the entities attached to an event.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<EntityWrapper<PaymentEntity>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<EntityWrapper<SubscriptionEntity>>,
}

/// The gateway nests every entity under an `entity` key.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

/// Payment object attached to charge/capture events.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentEntity {
    /// Gateway payment identifier.
    pub id: Option<String>,

    /// Captured amount in minor currency units.
    pub amount: Option<i64>,

    /// Free-form metadata bag set at checkout.
    #[serde(default)]
    pub notes: serde_json::Value,
}

/// Subscription object attached to lifecycle events.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubscriptionEntity {
    /// Gateway subscription identifier.
    pub id: Option<String>,

    /// Gateway plan reference.
    pub plan_id: Option<String>,

    /// Free-form metadata bag set at checkout.
    #[serde(default)]
    pub notes: serde_json::Value,
}

/// Recognized gateway event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEventKind {
    SubscriptionActivated,
    SubscriptionCharged,
    PaymentCaptured,
    SubscriptionCancelled,
    Unknown,
}

impl GatewayEventKind {
    /// Parses an event name.
    pub fn from_str(s: &str) -> Self {
        match s {
            "subscription.activated" => Self::SubscriptionActivated,
            "subscription.charged" => Self::SubscriptionCharged,
            "payment.captured" => Self::PaymentCaptured,
            "subscription.cancelled" => Self::SubscriptionCancelled,
            _ => Self::Unknown,
        }
    }
}

impl GatewayEvent {
    /// Parses a raw webhook body.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` for malformed JSON.
    pub fn from_slice(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    /// The recognized kind of this event.
    pub fn kind(&self) -> GatewayEventKind {
        GatewayEventKind::from_str(&self.event)
    }

    fn payment(&self) -> Option<&PaymentEntity> {
        self.payload.payment.as_ref().map(|w| &w.entity)
    }

    fn subscription(&self) -> Option<&SubscriptionEntity> {
        self.payload.subscription.as_ref().map(|w| &w.entity)
    }

    /// Centre id carried in the notes bag, subscription entity first.
    fn centre_id(&self) -> Option<CentreId> {
        let from_subscription = self
            .subscription()
            .and_then(|s| note_str(&s.notes, "centre_id"));
        let from_payment = self.payment().and_then(|p| note_str(&p.notes, "centre_id"));

        from_subscription
            .or(from_payment)
            .and_then(|s| s.parse().ok())
    }

    /// Plan type carried in the notes bag, if recognizable.
    fn plan_hint(&self) -> Option<PlanId> {
        let from_subscription = self
            .subscription()
            .and_then(|s| note_str(&s.notes, "plan_type"));
        let from_payment = self.payment().and_then(|p| note_str(&p.notes, "plan_type"));

        from_subscription
            .or(from_payment)
            .and_then(|s| PlanId::parse(&s))
    }

    fn captured_amount(&self) -> Money {
        Money::from_minor_units(self.payment().and_then(|p| p.amount).unwrap_or(0))
    }

    /// Maps the wire event onto a state machine transition.
    ///
    /// # Errors
    ///
    /// - `Ignored` for unrecognized event names
    /// - `MissingField` when a required identifier is absent
    /// - `UnresolvableCentre` when no centre id can be derived; the caller
    ///   logs and acknowledges since a retry cannot succeed
    pub fn to_billing_event(&self) -> Result<BillingEvent, WebhookError> {
        match self.kind() {
            GatewayEventKind::SubscriptionActivated => {
                let subscription_ref = self
                    .subscription()
                    .and_then(|s| s.id.clone())
                    .ok_or(WebhookError::MissingField("subscription id"))?;
                let centre_id = self.centre_id().ok_or(WebhookError::UnresolvableCentre)?;

                Ok(BillingEvent::SubscriptionActivated {
                    centre_id,
                    // Money is already captured at this point, so a missing
                    // or unknown plan type falls back to monthly.
                    plan: self.plan_hint().unwrap_or(PlanId::Monthly),
                    external_subscription_ref: subscription_ref,
                    external_payment_id: self.payment().and_then(|p| p.id.clone()),
                    amount: self.payment().and_then(|p| p.amount).map(Money::from_minor_units),
                })
            }

            GatewayEventKind::SubscriptionCharged => {
                let payment_id = self
                    .payment()
                    .and_then(|p| p.id.clone())
                    .ok_or(WebhookError::MissingField("payment id"))?;
                let subscription_ref = self
                    .subscription()
                    .and_then(|s| s.id.clone())
                    .ok_or(WebhookError::MissingField("subscription id"))?;
                let centre_id = self.centre_id().ok_or(WebhookError::UnresolvableCentre)?;

                Ok(BillingEvent::SubscriptionCharged {
                    centre_id,
                    external_subscription_ref: subscription_ref,
                    external_payment_id: payment_id,
                    amount: self.captured_amount(),
                    plan_hint: self.plan_hint(),
                })
            }

            GatewayEventKind::PaymentCaptured => {
                let payment_id = self
                    .payment()
                    .and_then(|p| p.id.clone())
                    .ok_or(WebhookError::MissingField("payment id"))?;
                let centre_id = self.centre_id().ok_or(WebhookError::UnresolvableCentre)?;

                Ok(BillingEvent::DirectPaymentCaptured {
                    centre_id,
                    plan: self.plan_hint(),
                    external_payment_id: payment_id,
                    amount: self.captured_amount(),
                })
            }

            GatewayEventKind::SubscriptionCancelled => {
                let subscription_ref = self
                    .subscription()
                    .and_then(|s| s.id.clone())
                    .ok_or(WebhookError::MissingField("subscription id"))?;

                Ok(BillingEvent::SubscriptionCancelled {
                    external_subscription_ref: subscription_ref,
                })
            }

            GatewayEventKind::Unknown => Err(WebhookError::Ignored(format!(
                "Unhandled event type: {}",
                self.event
            ))),
        }
    }
}

/// Reads a notes value as a string, accepting numbers too.
///
/// The notes bag is free-form; some gateway clients write numeric values
/// where ours writes strings.
fn note_str(notes: &serde_json::Value, key: &str) -> Option<String> {
    match notes.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
