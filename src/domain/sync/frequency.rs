//! Sync run cadence.

use serde::{Deserialize, Serialize};

const DAY_SECS: u64 = 86_400;

/// How often a full refresh run is triggered.
///
/// Independent of the fixed per-item delay within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncFrequency {
    /// Automatic runs disabled; manual trigger only.
    Off,
    /// Once a day.
    #[default]
    Daily,
    /// Every third day.
    Every3Days,
    /// Once a week.
    Weekly,
    /// Every fourteen days.
    Every14Days,
}

impl SyncFrequency {
    /// Trigger interval in seconds; `None` when automatic runs are off.
    pub fn interval_secs(&self) -> Option<u64> {
        match self {
            SyncFrequency::Off => None,
            SyncFrequency::Daily => Some(DAY_SECS),
            SyncFrequency::Every3Days => Some(3 * DAY_SECS),
            SyncFrequency::Weekly => Some(7 * DAY_SECS),
            SyncFrequency::Every14Days => Some(14 * DAY_SECS),
        }
    }

    /// Human-readable label for operator surfaces.
    pub fn label(&self) -> &'static str {
        match self {
            SyncFrequency::Off => "Off",
            SyncFrequency::Daily => "Daily",
            SyncFrequency::Every3Days => "Every 3 days",
            SyncFrequency::Weekly => "Weekly",
            SyncFrequency::Every14Days => "Every 14 days",
        }
    }

    /// Parses the persisted/config code, defaulting unknown values to Daily.
    pub fn from_code(code: &str) -> Self {
        match code {
            "off" => SyncFrequency::Off,
            "every_3_days" => SyncFrequency::Every3Days,
            "weekly" => SyncFrequency::Weekly,
            "every_14_days" => SyncFrequency::Every14Days,
            _ => SyncFrequency::Daily,
        }
    }

    /// Stable code used in persistence and configuration.
    pub fn code(&self) -> &'static str {
        match self {
            SyncFrequency::Off => "off",
            SyncFrequency::Daily => "daily",
            SyncFrequency::Every3Days => "every_3_days",
            SyncFrequency::Weekly => "weekly",
            SyncFrequency::Every14Days => "every_14_days",
        }
    }
}

impl std::fmt::Display for SyncFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
