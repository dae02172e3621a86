//! Centre subscription record and access gate.
//!
//! The subscription record carries the tenant's trial window, paid window,
//! and gateway subscription reference. Whether the centre currently has
//! access is always computed from these fields and the current time,
//! never stored and never cached.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CentreId, DomainError, ErrorCode, StateMachine, Timestamp,
};

use super::plan::PlanId;

/// Length of the free trial window granted at centre creation.
pub const TRIAL_DAYS: i64 = 14;

/// Subscription kind stored on the centre record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    /// Centre exists but the trial has not been started yet.
    None,
    /// Inside the free trial window (access governed by `trial_end`).
    Trial,
    /// Paid monthly plan (access governed by `subscription_end`).
    Monthly,
    /// Paid yearly plan (access governed by `subscription_end`).
    Yearly,
}

impl SubscriptionKind {
    /// Returns true for the paid plan kinds.
    pub fn is_paid(&self) -> bool {
        matches!(self, SubscriptionKind::Monthly | SubscriptionKind::Yearly)
    }

    /// Returns the plan backing a paid kind.
    pub fn as_plan(&self) -> Option<PlanId> {
        match self {
            SubscriptionKind::Monthly => Some(PlanId::Monthly),
            SubscriptionKind::Yearly => Some(PlanId::Yearly),
            _ => None,
        }
    }

    /// Returns the kind a purchased plan puts the centre in.
    pub fn from_plan(plan: PlanId) -> Self {
        match plan {
            PlanId::Monthly => SubscriptionKind::Monthly,
            PlanId::Yearly => SubscriptionKind::Yearly,
        }
    }

    /// Returns the capitalized display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionKind::None => "None",
            SubscriptionKind::Trial => "Trial",
            SubscriptionKind::Monthly => "Monthly",
            SubscriptionKind::Yearly => "Yearly",
        }
    }
}

impl StateMachine for SubscriptionKind {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionKind::*;
        matches!(
            (self, target),
            // Trial starts exactly once, from a fresh centre
            (None, Trial)
            // Any state can buy a paid plan; paid plans renew or switch
                | (None, Monthly)
                | (None, Yearly)
                | (Trial, Monthly)
                | (Trial, Yearly)
                | (Monthly, Monthly)
                | (Monthly, Yearly)
                | (Yearly, Monthly)
                | (Yearly, Yearly)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionKind::*;
        match self {
            None => vec![Trial, Monthly, Yearly],
            Trial => vec![Monthly, Yearly],
            Monthly => vec![Monthly, Yearly],
            Yearly => vec![Monthly, Yearly],
        }
    }
}

/// Per-tenant subscription state.
///
/// # Invariants
///
/// - Trial window fields are set exactly once, by `start_trial`.
/// - Paid window fields are set only once a paid plan is active.
/// - `subscription_end` only ever moves forward (monotonic extension).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentreSubscription {
    /// Centre (tenant) this record belongs to.
    pub centre_id: CentreId,

    /// Current subscription kind.
    pub kind: SubscriptionKind,

    /// Start of the free trial window.
    pub trial_start: Option<Timestamp>,

    /// End of the free trial window (`trial_start + 14 days`).
    pub trial_end: Option<Timestamp>,

    /// Start of the paid subscription.
    pub subscription_start: Option<Timestamp>,

    /// End of the currently paid-for access window.
    pub subscription_end: Option<Timestamp>,

    /// Gateway-assigned identifier for the recurring subscription object.
    pub external_subscription_ref: Option<String>,

    /// When the record was created.
    pub created_at: Timestamp,

    /// When the record was last updated.
    pub updated_at: Timestamp,
}

impl CentreSubscription {
    /// Creates a fresh record for a newly registered centre.
    ///
    /// The trial is not started here; the signup flow fires the trial
    /// transition exactly once after the centre row exists.
    pub fn fresh(centre_id: CentreId, now: Timestamp) -> Self {
        Self {
            centre_id,
            kind: SubscriptionKind::None,
            trial_start: None,
            trial_end: None,
            subscription_start: None,
            subscription_end: None,
            external_subscription_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Starts the free trial window.
    ///
    /// # Errors
    ///
    /// Returns `TrialAlreadyStarted` if the centre has any subscription
    /// kind other than `None`. The trial fires exactly once, at creation.
    pub fn start_trial(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.kind != SubscriptionKind::None {
            return Err(DomainError::new(
                ErrorCode::TrialAlreadyStarted,
                format!("Centre {} already has a {} subscription", self.centre_id, self.kind.display_name()),
            ));
        }
        self.kind = self.kind.transition_to(SubscriptionKind::Trial)?;
        self.trial_start = Some(now);
        self.trial_end = Some(now.add_days(TRIAL_DAYS));
        self.updated_at = now;
        Ok(())
    }

    /// Activates a paid plan after the first gateway confirmation.
    ///
    /// Sets a fresh paid window of the plan's full duration and stores the
    /// gateway subscription reference. Returns the new window end.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind transition is not valid.
    pub fn activate(
        &mut self,
        plan: PlanId,
        external_subscription_ref: impl Into<String>,
        now: Timestamp,
    ) -> Result<Timestamp, DomainError> {
        self.kind = self.kind.transition_to(SubscriptionKind::from_plan(plan))?;
        let end = now.add_days(plan.duration_days());
        self.subscription_start = Some(now);
        self.subscription_end = Some(end);
        self.external_subscription_ref = Some(external_subscription_ref.into());
        self.updated_at = now;
        Ok(end)
    }

    /// Extends the paid window for a successful charge.
    ///
    /// If the current paid window has not yet expired the extension is
    /// anchored at the current `subscription_end`, preserving unused paid
    /// time; otherwise it is anchored at `now`. Returns the new window end.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind transition is not valid.
    pub fn extend_for_charge(
        &mut self,
        plan: PlanId,
        now: Timestamp,
    ) -> Result<Timestamp, DomainError> {
        self.kind = self.kind.transition_to(SubscriptionKind::from_plan(plan))?;
        let anchor = match self.subscription_end {
            Some(end) if end.is_after(&now) => end,
            _ => now,
        };
        let end = anchor.add_days(plan.duration_days());
        if self.subscription_start.is_none() {
            self.subscription_start = Some(now);
        }
        self.subscription_end = Some(end);
        self.updated_at = now;
        Ok(end)
    }

    /// Records the gateway subscription reference without touching windows.
    pub fn attach_subscription_ref(&mut self, external_ref: impl Into<String>, now: Timestamp) {
        self.external_subscription_ref = Some(external_ref.into());
        self.updated_at = now;
    }

    /// The plan behind the current paid kind, if any.
    pub fn current_plan(&self) -> Option<PlanId> {
        self.kind.as_plan()
    }

    /// Access gate: whether the centre can use protected functionality.
    ///
    /// Pure function of stored fields and the given instant; must be
    /// re-evaluated on every protected access.
    pub fn is_active(&self, now: Timestamp) -> bool {
        match self.kind {
            SubscriptionKind::Trial => match self.trial_end {
                Some(end) => now <= end,
                None => false,
            },
            SubscriptionKind::Monthly | SubscriptionKind::Yearly => match self.subscription_end {
                Some(end) => now <= end,
                None => false,
            },
            SubscriptionKind::None => false,
        }
    }

    /// Whole days of access remaining, floored. Zero once expired.
    pub fn days_remaining(&self, now: Timestamp) -> i64 {
        let end = match self.kind {
            SubscriptionKind::Trial => self.trial_end,
            SubscriptionKind::Monthly | SubscriptionKind::Yearly => self.subscription_end,
            SubscriptionKind::None => None,
        };
        match end {
            Some(end) if end.is_after(&now) => end.duration_since(&now).num_days(),
            _ => 0,
        }
    }

    /// Human-readable subscription status.
    pub fn status_label(&self, now: Timestamp) -> String {
        if self.is_active(now) {
            match self.kind {
                SubscriptionKind::Trial => {
                    format!("Trial - {} days left", self.days_remaining(now))
                }
                kind => format!("{} - Active", kind.display_name()),
            }
        } else {
            "Subscription Expired".to_string()
        }
    }
}
