//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state
//! transitions across lifecycle statuses (license, sync run).

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
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
    enum Phase {
        Idle,
        Running,
        Done,
    }

    impl StateMachine for Phase {
        fn can_transition_to(&self, target: &Self) -> bool {
            use Phase::*;
            matches!((self, target), (Idle, Running) | (Running, Done) | (Done, Idle))
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use Phase::*;
            match self {
                Idle => vec![Running],
                Running => vec![Done],
                Done => vec![Idle],
            }
        }
    }

    #[test]
    fn valid_transition_succeeds() {
        assert_eq!(Phase::Idle.transition_to(Phase::Running), Ok(Phase::Running));
    }

    #[test]
    fn invalid_transition_errors() {
        assert!(Phase::Idle.transition_to(Phase::Done).is_err());
    }

    #[test]
    fn no_state_here_is_terminal() {
        assert!(!Phase::Idle.is_terminal());
        assert!(!Phase::Running.is_terminal());
        assert!(!Phase::Done.is_terminal());
    }
}
