//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Configuration for the monitoring loop and the decision engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// A sample strictly above this multiplier is a trigger.
    #[serde(default = "default_trigger_threshold")]
    pub trigger_threshold: f64,
    /// Minimum time between two bets (seconds).
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Idle time between two polls (milliseconds).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Currency label used in log lines.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_trigger_threshold() -> f64 {
    150.0
}

fn default_cooldown_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_currency() -> String {
    "NGN".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trigger_threshold: default_trigger_threshold(),
            cooldown_secs: default_cooldown_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            currency: default_currency(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.trigger_threshold.is_finite() || self.trigger_threshold < 0.0 {
            return Err(EngineError::Config(format!(
                "trigger_threshold ({}) must be a non-negative number",
                self.trigger_threshold
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(EngineError::Config(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.trigger_threshold, 150.0);
        assert_eq!(config.cooldown(), Duration::from_secs(300));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = EngineConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            trigger_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
