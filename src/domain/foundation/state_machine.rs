//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions across entity lifecycle statuses.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for PaymentStatus {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!(
///             (self, target),
///             (Pending, Completed) | (Pending, Cancelled) | (Completed, Cancelled)
///         )
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Pending => vec![Completed, Cancelled],
///             Completed => vec![Cancelled],
///             Cancelled => vec![],
///         }
///     }
/// }
///
/// // Usage:
/// let new_status = status.transition_to(PaymentStatus::Completed)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestStatus {
        Open,
        Settled,
        Voided,
    }

    impl StateMachine for TestStatus {
        fn can_transition_to(&self, target: &Self) -> bool {
            use TestStatus::*;
            matches!((self, target), (Open, Settled) | (Open, Voided) | (Settled, Voided))
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use TestStatus::*;
            match self {
                Open => vec![Settled, Voided],
                Settled => vec![Voided],
                Voided => vec![],
            }
        }
    }

    #[test]
    fn transition_to_accepts_valid_target() {
        let result = TestStatus::Open.transition_to(TestStatus::Settled);
        assert_eq!(result, Ok(TestStatus::Settled));
    }

    #[test]
    fn transition_to_rejects_invalid_target() {
        let result = TestStatus::Voided.transition_to(TestStatus::Open);
        assert!(result.is_err());
    }

    #[test]
    fn terminal_state_has_no_transitions() {
        assert!(TestStatus::Voided.is_terminal());
        assert!(!TestStatus::Open.is_terminal());
    }
}
