//! Multiplier watch bot.
//!
//! Wires the monitoring engine to a page-automation driver and exposes the
//! observer dashboard:
//! - `HttpCollaborator` talks to the driver sidecar
//! - `BotSession` runs the polling worker on demand
//! - the dashboard streams state and log lines and accepts commands

pub mod app;
pub mod config;
pub mod error;
pub mod http_collaborator;

pub use app::Application;
pub use config::{AppConfig, DriverConfig};
pub use error::{AppError, AppResult};
pub use http_collaborator::HttpCollaborator;
