//! License status state machine.
//!
//! Defines the lifecycle states a license moves through and the valid
//! transitions between them.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// License lifecycle status.
///
/// Licenses are never hard-deleted; `Suspended` and `Expired` are soft
/// terminal-ish states that a payment event can move back out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    /// Evaluation license created at signup. Metered like Active.
    Trial,

    /// Paid license with full access.
    Active,

    /// Administratively paused (e.g. payment dispute). No access.
    Suspended,

    /// Past its expiry date. No access until reactivated.
    Expired,
}

impl LicenseStatus {
    /// Returns true if this status grants metered access.
    ///
    /// Only `Trial` and `Active` may consume quota; `Suspended` and
    /// `Expired` are rejected at the gateway.
    pub fn grants_access(&self) -> bool {
        matches!(self, LicenseStatus::Trial | LicenseStatus::Active)
    }

    /// Stable string form used in persisted records and log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Trial => "trial",
            LicenseStatus::Active => "active",
            LicenseStatus::Suspended => "suspended",
            LicenseStatus::Expired => "expired",
        }
    }

    /// All statuses, for counting sweeps.
    pub fn all() -> [LicenseStatus; 4] {
        [
            LicenseStatus::Trial,
            LicenseStatus::Active,
            LicenseStatus::Suspended,
            LicenseStatus::Expired,
        ]
    }
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for LicenseStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use LicenseStatus::*;
        matches!(
            (self, target),
            // From TRIAL
            (Trial, Active)
                | (Trial, Suspended)
                | (Trial, Expired)
            // From ACTIVE
                | (Active, Active) // Renewal extends expiry
                | (Active, Suspended)
                | (Active, Expired)
            // From SUSPENDED
                | (Suspended, Active)
                | (Suspended, Expired)
            // From EXPIRED
                | (Expired, Active) // Reactivation on payment
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use LicenseStatus::*;
        match self {
            Trial => vec![Active, Suspended, Expired],
            Active => vec![Active, Suspended, Expired],
            Suspended => vec![Active, Expired],
            Expired => vec![Active],
        }
    }
}
