//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(#[from] mwatch_engine::EngineError),

    #[error("Dashboard error: {0}")]
    Dashboard(#[from] mwatch_dashboard::DashboardError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] mwatch_telemetry::TelemetryError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] mwatch_persistence::PersistenceError),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
