//! StartTrialHandler - Command handler for opening the free trial.
//!
//! Invoked by the signup flow right after the centre record is created.
//! The transition fires exactly once per centre; re-invocation is a
//! domain error, not a silent no-op, so a buggy caller is caught early.

use std::sync::Arc;

use crate::domain::billing::{BillingEvent, SubscriptionEngine, TransitionOutcome};
use crate::domain::foundation::{CentreId, DomainError, Timestamp};

/// Command to start a centre's trial.
#[derive(Debug, Clone)]
pub struct StartTrialCommand {
    pub centre_id: CentreId,
}

/// Result of starting the trial.
#[derive(Debug, Clone, PartialEq)]
pub struct StartTrialResult {
    pub trial_end: Timestamp,
}

/// Handler for the trial-start transition.
pub struct StartTrialHandler {
    engine: Arc<SubscriptionEngine>,
}

impl StartTrialHandler {
    pub fn new(engine: Arc<SubscriptionEngine>) -> Self {
        Self { engine }
    }

    pub async fn handle(&self, cmd: StartTrialCommand) -> Result<StartTrialResult, DomainError> {
        let outcome = self
            .engine
            .apply(BillingEvent::TrialStarted {
                centre_id: cmd.centre_id,
            })
            .await?;

        match outcome {
            TransitionOutcome::TrialStarted { trial_end } => {
                tracing::info!(centre_id = %cmd.centre_id, %trial_end, "trial started");
                Ok(StartTrialResult { trial_end })
            }
            other => Err(DomainError::new(
                crate::domain::foundation::ErrorCode::InternalError,
                format!("Unexpected trial transition outcome: {:?}", other),
            )),
        }
    }
}
