//! Subscription state machine.
//!
//! Applies billing events to a centre's subscription record and the
//! payment ledger, through an explicitly injected store. Every handler is
//! idempotent: the gateway delivers at-least-once, the client-redirect
//! callback races the webhook, and duplicates of the same payment id must
//! collapse into exactly one ledger row and one window extension.
//!
//! ## Race condition handling
//!
//! The fast-path duplicate check (`find_payment_by_external_id`) is an
//! optimization only. The authoritative check is the unique constraint
//! inside [`LedgerStore::record_charge`], which inserts the payment and
//! applies the subscription update as one atomic unit; losing that race
//! surfaces as `DuplicatePayment` and is treated as the idempotent no-op
//! path, never as an error.

use std::sync::Arc;

use crate::domain::foundation::{CentreId, Clock, DomainError, ErrorCode, Money, Timestamp};
use crate::ports::{LedgerStore, RecordOutcome};

use super::event::BillingEvent;
use super::payment::PaymentRecord;
use super::plan::{PlanCatalog, PlanId};
use super::subscription::{CentreSubscription, SubscriptionKind};

/// What a transition did, for logging and acknowledgment decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Trial window opened.
    TrialStarted { trial_end: Timestamp },
    /// Paid plan activated with a fresh window.
    Activated { subscription_end: Timestamp },
    /// Paid window extended by a charge or captured payment.
    Extended { subscription_end: Timestamp },
    /// Duplicate delivery; the ledger already holds this payment.
    AlreadyApplied,
    /// The matching payment row was marked cancelled. Access is not
    /// shortened; the paid window runs out on its own.
    CancellationRecorded {
        external_payment_id: Option<String>,
    },
    /// Cancellation for a subscription reference with no ledger rows.
    NothingToCancel,
}

/// The subscription/billing state machine.
pub struct SubscriptionEngine {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    catalog: PlanCatalog,
}

impl SubscriptionEngine {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, catalog: PlanCatalog) -> Self {
        Self {
            store,
            clock,
            catalog,
        }
    }

    /// Applies one billing event.
    ///
    /// # Errors
    ///
    /// - `CentreNotFound` when the event references a missing centre
    /// - `TrialAlreadyStarted` when the trial transition is re-invoked
    /// - `DatabaseError` when the store fails; no partial state remains
    pub async fn apply(&self, event: BillingEvent) -> Result<TransitionOutcome, DomainError> {
        match event {
            BillingEvent::TrialStarted { centre_id } => self.start_trial(centre_id).await,

            BillingEvent::SubscriptionActivated {
                centre_id,
                plan,
                external_subscription_ref,
                external_payment_id,
                amount,
            } => {
                self.activate(
                    centre_id,
                    plan,
                    external_subscription_ref,
                    external_payment_id,
                    amount,
                )
                .await
            }

            BillingEvent::SubscriptionCharged {
                centre_id,
                external_subscription_ref,
                external_payment_id,
                amount,
                plan_hint,
            } => {
                self.charge(
                    centre_id,
                    external_subscription_ref,
                    external_payment_id,
                    amount,
                    plan_hint,
                )
                .await
            }

            BillingEvent::DirectPaymentCaptured {
                centre_id,
                plan,
                external_payment_id,
                amount,
            } => {
                self.capture_direct(centre_id, plan, external_payment_id, amount)
                    .await
            }

            BillingEvent::SubscriptionCancelled {
                external_subscription_ref,
            } => self.cancel(external_subscription_ref).await,

            BillingEvent::CheckoutConfirmed {
                centre_id,
                plan,
                external_payment_id,
                external_subscription_ref,
            } => {
                self.confirm_checkout(
                    centre_id,
                    plan,
                    external_payment_id,
                    external_subscription_ref,
                )
                .await
            }
        }
    }

    async fn load(&self, centre_id: CentreId) -> Result<CentreSubscription, DomainError> {
        self.store
            .find_centre(&centre_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::CentreNotFound,
                    format!("Centre {} does not exist", centre_id),
                )
            })
    }

    /// True when a payment with this gateway id is already on the ledger.
    async fn already_recorded(&self, external_payment_id: &str) -> Result<bool, DomainError> {
        Ok(self
            .store
            .find_payment_by_external_id(external_payment_id)
            .await?
            .is_some())
    }

    async fn start_trial(&self, centre_id: CentreId) -> Result<TransitionOutcome, DomainError> {
        let now = self.clock.now();
        let mut subscription = self.load(centre_id).await?;
        subscription.start_trial(now)?;
        self.store.update_subscription(&subscription).await?;

        Ok(TransitionOutcome::TrialStarted {
            trial_end: subscription
                .trial_end
                .unwrap_or_else(|| now.add_days(super::subscription::TRIAL_DAYS)),
        })
    }

    async fn activate(
        &self,
        centre_id: CentreId,
        plan: PlanId,
        external_subscription_ref: String,
        external_payment_id: Option<String>,
        amount: Option<Money>,
    ) -> Result<TransitionOutcome, DomainError> {
        if let Some(payment_id) = external_payment_id.as_deref() {
            if self.already_recorded(payment_id).await? {
                return Ok(TransitionOutcome::AlreadyApplied);
            }
        }

        let now = self.clock.now();
        let mut subscription = self.load(centre_id).await?;

        // Redelivery without a payment id has no ledger key to dedupe on;
        // an identical, already-applied activation is recognized by the
        // subscription reference instead.
        if external_payment_id.is_none()
            && subscription.external_subscription_ref.as_deref()
                == Some(external_subscription_ref.as_str())
            && subscription.kind == SubscriptionKind::from_plan(plan)
        {
            return Ok(TransitionOutcome::AlreadyApplied);
        }

        let subscription_end =
            subscription.activate(plan, external_subscription_ref.clone(), now)?;

        let payment = PaymentRecord::completed(
            centre_id,
            amount.unwrap_or(self.catalog.resolve(plan).display_amount),
            plan,
            external_payment_id,
            Some(external_subscription_ref),
            now,
        );

        match self.store.record_charge(&subscription, &payment).await? {
            RecordOutcome::Recorded => Ok(TransitionOutcome::Activated { subscription_end }),
            RecordOutcome::DuplicatePayment => Ok(TransitionOutcome::AlreadyApplied),
        }
    }

    async fn charge(
        &self,
        centre_id: CentreId,
        external_subscription_ref: String,
        external_payment_id: String,
        amount: Money,
        plan_hint: Option<PlanId>,
    ) -> Result<TransitionOutcome, DomainError> {
        if self.already_recorded(&external_payment_id).await? {
            return Ok(TransitionOutcome::AlreadyApplied);
        }

        let now = self.clock.now();
        let mut subscription = self.load(centre_id).await?;

        // The plan comes from the centre's current paid kind; a charge
        // that outruns its activation falls back to the event metadata,
        // then to monthly. Money has moved, so this never fails.
        let plan = subscription
            .current_plan()
            .or(plan_hint)
            .unwrap_or(PlanId::Monthly);

        let subscription_end = subscription.extend_for_charge(plan, now)?;
        subscription.attach_subscription_ref(external_subscription_ref.clone(), now);

        let payment = PaymentRecord::completed(
            centre_id,
            amount,
            plan,
            Some(external_payment_id),
            Some(external_subscription_ref),
            now,
        );

        match self.store.record_charge(&subscription, &payment).await? {
            RecordOutcome::Recorded => Ok(TransitionOutcome::Extended { subscription_end }),
            RecordOutcome::DuplicatePayment => Ok(TransitionOutcome::AlreadyApplied),
        }
    }

    async fn capture_direct(
        &self,
        centre_id: CentreId,
        plan: Option<PlanId>,
        external_payment_id: String,
        amount: Money,
    ) -> Result<TransitionOutcome, DomainError> {
        if self.already_recorded(&external_payment_id).await? {
            return Ok(TransitionOutcome::AlreadyApplied);
        }

        let now = self.clock.now();
        let mut subscription = self.load(centre_id).await?;

        let plan = plan.unwrap_or(PlanId::Monthly);
        let subscription_end = subscription.extend_for_charge(plan, now)?;

        let payment = PaymentRecord::completed(
            centre_id,
            amount,
            plan,
            Some(external_payment_id),
            None,
            now,
        );

        match self.store.record_charge(&subscription, &payment).await? {
            RecordOutcome::Recorded => Ok(TransitionOutcome::Extended { subscription_end }),
            RecordOutcome::DuplicatePayment => Ok(TransitionOutcome::AlreadyApplied),
        }
    }

    async fn cancel(
        &self,
        external_subscription_ref: String,
    ) -> Result<TransitionOutcome, DomainError> {
        match self
            .store
            .cancel_latest_payment(&external_subscription_ref)
            .await?
        {
            Some(payment) => Ok(TransitionOutcome::CancellationRecorded {
                external_payment_id: payment.external_payment_id,
            }),
            None => Ok(TransitionOutcome::NothingToCancel),
        }
    }

    async fn confirm_checkout(
        &self,
        centre_id: CentreId,
        plan: PlanId,
        external_payment_id: String,
        external_subscription_ref: Option<String>,
    ) -> Result<TransitionOutcome, DomainError> {
        if self.already_recorded(&external_payment_id).await? {
            return Ok(TransitionOutcome::AlreadyApplied);
        }

        let now = self.clock.now();
        let mut subscription = self.load(centre_id).await?;

        let subscription_end = subscription.extend_for_charge(plan, now)?;
        if let Some(subscription_ref) = external_subscription_ref.as_deref() {
            subscription.attach_subscription_ref(subscription_ref, now);
        }

        let payment = PaymentRecord::completed(
            centre_id,
            self.catalog.resolve(plan).display_amount,
            plan,
            Some(external_payment_id),
            external_subscription_ref,
            now,
        );

        match self.store.record_charge(&subscription, &payment).await? {
            RecordOutcome::Recorded => Ok(TransitionOutcome::Extended { subscription_end }),
            RecordOutcome::DuplicatePayment => Ok(TransitionOutcome::AlreadyApplied),
        }
    }
}
