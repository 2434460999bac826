//! Prometheus metrics and structured logging for mwatch.
//!
//! - Structured logging with tracing (pretty in development, JSON in production)
//! - Prometheus metrics for samples, triggers, bet outcomes and sessions

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
