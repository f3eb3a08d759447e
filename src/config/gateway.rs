//! Gateway configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Quota gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Gigabyte quota per cycle for new licenses.
    #[serde(default = "default_gb_limit")]
    pub gb_limit: f64,

    /// Days until a new trial expires.
    #[serde(default = "default_trial_days")]
    pub trial_days: i64,

    /// Cycle anchor day for new licenses (1-28).
    #[serde(default = "default_cycle_start_day")]
    pub cycle_start_day: u8,

    /// Per-request byte ceiling.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: u64,

    /// Requests allowed per rate-limit window.
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,

    /// Rate-limit window length in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Hourly byte threshold for the anomaly monitor.
    #[serde(default = "default_anomaly_threshold_bytes")]
    pub anomaly_threshold_bytes: u64,
}

fn default_gb_limit() -> f64 {
    4.0
}

fn default_trial_days() -> i64 {
    30
}

fn default_cycle_start_day() -> u8 {
    1
}

fn default_max_request_bytes() -> u64 {
    2_000_000
}

fn default_rate_limit_requests() -> u32 {
    30
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_anomaly_threshold_bytes() -> u64 {
    500_000_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gb_limit: default_gb_limit(),
            trial_days: default_trial_days(),
            cycle_start_day: default_cycle_start_day(),
            max_request_bytes: default_max_request_bytes(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            anomaly_threshold_bytes: default_anomaly_threshold_bytes(),
        }
    }
}

impl GatewayConfig {
    /// Validate gateway configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=28).contains(&self.cycle_start_day) {
            return Err(ValidationError::InvalidCycleStartDay);
        }
        if self.gb_limit <= 0.0 {
            return Err(ValidationError::InvalidGbLimit);
        }
        if self.rate_limit_window_secs == 0 {
            return Err(ValidationError::InvalidRateLimitWindow);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GatewayConfig::default().validate().is_ok());
    }

    #[test]
    fn cycle_day_29_is_rejected() {
        let config = GatewayConfig {
            cycle_start_day: 29,
            ..GatewayConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidCycleStartDay)
        ));
    }

    #[test]
    fn zero_gb_limit_is_rejected() {
        let config = GatewayConfig {
            gb_limit: 0.0,
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
