//! Hourly consumption watchdog.
//!
//! Tracks bytes per license over a rolling hour and emits one warning per
//! window when the threshold is crossed. Purely observational: nothing is
//! ever rejected here.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

use crate::domain::foundation::{LicenseId, Timestamp};

/// Default warning threshold: 0.5 GB per hour.
pub const DEFAULT_HOURLY_THRESHOLD_BYTES: u64 = 500_000_000;

const HOUR_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy)]
struct HourWindow {
    opened_at: u64,
    bytes: u64,
    warned: bool,
}

/// Warn-only consumption monitor.
#[derive(Debug)]
pub struct AnomalyMonitor {
    threshold_bytes: u64,
    windows: Mutex<HashMap<LicenseId, HourWindow>>,
}

impl AnomalyMonitor {
    /// Creates a monitor with an explicit threshold.
    pub fn new(threshold_bytes: u64) -> Self {
        Self {
            threshold_bytes,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a monitor with the default 0.5 GB/hour threshold.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_HOURLY_THRESHOLD_BYTES)
    }

    /// Adds `bytes` to the license's hourly counter.
    ///
    /// Returns true when this observation crossed the threshold and a
    /// warning was emitted. Subsequent observations in the same window stay
    /// silent.
    pub fn observe(&self, license_id: LicenseId, bytes: u64) -> bool {
        let now = Timestamp::now().as_unix_secs();
        let Ok(mut windows) = self.windows.lock() else {
            return false;
        };

        let window = windows.entry(license_id).or_insert(HourWindow {
            opened_at: now,
            bytes: 0,
            warned: false,
        });

        if now >= window.opened_at + HOUR_SECS {
            *window = HourWindow {
                opened_at: now,
                bytes: 0,
                warned: false,
            };
        }

        window.bytes += bytes;

        if window.bytes > self.threshold_bytes && !window.warned {
            window.warned = true;
            warn!(
                license_id = %license_id,
                hourly_bytes = window.bytes,
                threshold_bytes = self.threshold_bytes,
                "hourly consumption above threshold"
            );
            return true;
        }
        false
    }

    /// Bytes counted in the license's current window.
    pub fn current_hour_bytes(&self, license_id: &LicenseId) -> u64 {
        let now = Timestamp::now().as_unix_secs();
        self.windows
            .lock()
            .ok()
            .and_then(|windows| {
                windows
                    .get(license_id)
                    .filter(|w| now < w.opened_at + HOUR_SECS)
                    .map(|w| w.bytes)
            })
            .unwrap_or(0)
    }
}
