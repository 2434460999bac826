//! Dashboard configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, DashboardResult};

/// Dashboard server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum concurrent observer connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_connections() -> usize {
    10
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> DashboardResult<()> {
        if self.max_connections == 0 {
            return Err(DashboardError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(DashboardError::Config("host must not be empty".to_string()));
        }
        Ok(())
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_connections_rejected() {
        let config = DashboardConfig {
            max_connections: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DashboardError::Config(_))));
    }
}
