//! Application configuration.

use std::path::Path;

use mwatch_dashboard::DashboardConfig;
use mwatch_engine::EngineConfig;
use mwatch_persistence::LogConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Connection to the page-automation driver sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Base URL of the driver (e.g. `http://127.0.0.1:9515`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout (ms). Default: 30,000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:9515".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Top-level configuration, one section per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.engine.validate()?;
        self.log.validate()?;
        self.dashboard.validate()?;

        if !(self.driver.base_url.starts_with("http://")
            || self.driver.base_url.starts_with("https://"))
        {
            return Err(AppError::Config(format!(
                "driver.base_url must be an http(s) URL, got {:?}",
                self.driver.base_url
            )));
        }
        if self.driver.request_timeout_ms == 0 {
            return Err(AppError::Config(
                "driver.request_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.engine.trigger_threshold, 150.0);
        assert_eq!(config.engine.cooldown_secs, 300);
        assert_eq!(config.engine.poll_interval_ms, 2000);
        assert_eq!(config.log.history_capacity, 200);
        assert_eq!(config.dashboard.port, 5000);
        assert_eq!(config.driver.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [engine]
            trigger_threshold = 10.5
            currency = "USD"

            [log]
            path = "/tmp/mwatch.log"

            [dashboard]
            port = 8081

            [driver]
            base_url = "http://driver:4444"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.trigger_threshold, 10.5);
        assert_eq!(config.engine.currency, "USD");
        assert_eq!(config.engine.cooldown_secs, 300);
        assert_eq!(config.log.path.to_str(), Some("/tmp/mwatch.log"));
        assert_eq!(config.dashboard.port, 8081);
        assert_eq!(config.driver.base_url, "http://driver:4444");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AppConfig::from_toml("[engine]\npoll_interval_ms = 0"),
            Err(AppError::Engine(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[log]\nhistory_capacity = 0"),
            Err(AppError::Persistence(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[driver]\nbase_url = \"driver:4444\""),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[engine]\ntrigger_threshold = \"high\""),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/nonexistent/mwatch.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
