//! Request/response DTOs for the billing endpoints.
//!
//! Domain types never cross the HTTP boundary directly; amounts are
//! rendered in the display currency here.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::AccessStatus;
use crate::domain::billing::{PaymentRecord, Plan, SubscriptionKind};
use crate::domain::foundation::Timestamp;

/// A purchasable plan, as shown in the plan-selection flow.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    /// Price in the display currency.
    pub amount: f64,
    /// Formatted price, e.g. "₹6,999.00".
    pub amount_display: String,
    pub duration_days: i64,
}

impl From<&Plan> for PlanResponse {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id.as_str().to_string(),
            name: plan.id.display_name().to_string(),
            amount: plan.display_amount.major_units(),
            amount_display: plan.display_amount.to_string(),
            duration_days: plan.duration_days,
        }
    }
}

/// Access gate evaluation for the authenticated centre.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatusResponse {
    pub active: bool,
    pub kind: SubscriptionKind,
    pub label: String,
    pub days_remaining: i64,
}

impl From<AccessStatus> for SubscriptionStatusResponse {
    fn from(status: AccessStatus) -> Self {
        Self {
            active: status.active,
            kind: status.kind,
            label: status.label,
            days_remaining: status.days_remaining,
        }
    }
}

/// One row of the centre's payment history.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub amount: f64,
    pub amount_display: String,
    pub plan: String,
    /// Gateway payment reference.
    pub reference: Option<String>,
    pub subscription_ref: Option<String>,
    pub paid_at: Timestamp,
}

impl From<PaymentRecord> for PaymentResponse {
    fn from(payment: PaymentRecord) -> Self {
        Self {
            id: payment.id.to_string(),
            amount: payment.amount.major_units(),
            amount_display: payment.amount.to_string(),
            plan: payment.plan.as_str().to_string(),
            reference: payment.external_payment_id,
            subscription_ref: payment.external_subscription_ref,
            paid_at: payment.created_at,
        }
    }
}

/// Response to the trial-start command.
#[derive(Debug, Clone, Serialize)]
pub struct TrialResponse {
    pub trial_end: Timestamp,
}

/// Query parameters of the client-redirect success callback.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    pub payment_id: String,
    pub subscription_id: Option<String>,
    pub plan: Option<String>,
}

/// Response to the checkout callback.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackResponse {
    pub status: &'static str,
}

/// Standard error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{PlanCatalog, PlanId};
    use crate::domain::foundation::{CentreId, Money};

    #[test]
    fn plan_response_renders_display_amount() {
        let catalog = PlanCatalog::new("plan_m", "plan_y");
        let response = PlanResponse::from(catalog.resolve(PlanId::Yearly));

        assert_eq!(response.id, "yearly");
        assert_eq!(response.amount, 6_999.0);
        assert_eq!(response.amount_display, "₹6,999.00");
        assert_eq!(response.duration_days, 365);
    }

    #[test]
    fn payment_response_carries_references() {
        let payment = PaymentRecord::completed(
            CentreId::new(),
            Money::from_minor_units(69_900),
            PlanId::Monthly,
            Some("pay_1".to_string()),
            Some("sub_1".to_string()),
            Timestamp::now(),
        );

        let response = PaymentResponse::from(payment);
        assert_eq!(response.amount, 699.0);
        assert_eq!(response.reference.as_deref(), Some("pay_1"));
        assert_eq!(response.plan, "monthly");
    }
}
