//! Subscription plan catalog.
//!
//! Static mapping from plan identifier to price, duration, and the
//! gateway-side plan reference. Pure data, no state.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, Money};

/// Identifier of a purchasable subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanId {
    /// Monthly plan, 30 days of access.
    Monthly,
    /// Yearly plan, 365 days of access.
    Yearly,
}

impl PlanId {
    /// Parses a plan identifier string.
    ///
    /// Returns `None` for unrecognized identifiers; callers decide whether
    /// that is a validation error (user input) or a leniency case (gateway
    /// payloads where money has already been captured).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(PlanId::Monthly),
            "yearly" => Some(PlanId::Yearly),
            _ => None,
        }
    }

    /// Returns the canonical identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::Monthly => "monthly",
            PlanId::Yearly => "yearly",
        }
    }

    /// Returns the capitalized display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlanId::Monthly => "Monthly",
            PlanId::Yearly => "Yearly",
        }
    }

    /// Returns the length of the paid access window this plan grants.
    pub fn duration_days(&self) -> i64 {
        match self {
            PlanId::Monthly => 30,
            PlanId::Yearly => 365,
        }
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved plan with its price and gateway reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub id: PlanId,
    /// Price shown to the centre, in the display currency.
    pub display_amount: Money,
    pub duration_days: i64,
    /// Plan object identifier on the gateway side.
    pub external_plan_ref: String,
}

/// Catalog of the two recognized plans.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    monthly: Plan,
    yearly: Plan,
}

impl PlanCatalog {
    /// Builds the catalog with the given gateway plan references.
    pub fn new(monthly_plan_ref: impl Into<String>, yearly_plan_ref: impl Into<String>) -> Self {
        Self {
            monthly: Plan {
                id: PlanId::Monthly,
                display_amount: Money::from_major_units(699),
                duration_days: PlanId::Monthly.duration_days(),
                external_plan_ref: monthly_plan_ref.into(),
            },
            yearly: Plan {
                id: PlanId::Yearly,
                display_amount: Money::from_major_units(6_999),
                duration_days: PlanId::Yearly.duration_days(),
                external_plan_ref: yearly_plan_ref.into(),
            },
        }
    }

    /// Resolves a plan by its identifier.
    pub fn resolve(&self, id: PlanId) -> &Plan {
        match id {
            PlanId::Monthly => &self.monthly,
            PlanId::Yearly => &self.yearly,
        }
    }

    /// Resolves a plan by its identifier string.
    ///
    /// # Errors
    ///
    /// Returns `PlanNotFound` for unrecognized identifiers. This is a
    /// user-facing validation error, not a system fault.
    pub fn resolve_str(&self, s: &str) -> Result<&Plan, DomainError> {
        PlanId::parse(s)
            .map(|id| self.resolve(id))
            .ok_or_else(|| {
                DomainError::new(ErrorCode::PlanNotFound, format!("Unknown plan id: {}", s))
            })
    }

    /// Returns both plans, monthly first.
    pub fn all(&self) -> [&Plan; 2] {
        [&self.monthly, &self.yearly]
    }
}
