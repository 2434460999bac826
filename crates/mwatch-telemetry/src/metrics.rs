//! Prometheus metrics for mwatch.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a programming error that should crash at
//! first use rather than silently drop metrics.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, Encoder,
    IntCounter, IntGauge, TextEncoder,
};

use crate::error::TelemetryResult;

/// Total novel samples observed.
pub static SAMPLES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("mwatch_samples_total", "Total novel multiplier samples").unwrap()
});

/// Samples whose text did not parse as a number.
pub static UNPARSEABLE_SAMPLES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mwatch_unparseable_samples_total",
        "Samples whose text did not parse (treated as 0.0)"
    )
    .unwrap()
});

/// Total threshold triggers.
pub static TRIGGERS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("mwatch_triggers_total", "Total threshold triggers").unwrap()
});

/// Action outcomes after a trigger.
/// Labels: outcome (placed/zero_balance/cooldown/disabled)
pub static ACTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mwatch_actions_total",
        "Outcome of the action step after a trigger",
        &["outcome"]
    )
    .unwrap()
});

/// Sessions ended by a fatal collaborator error.
pub static FATAL_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mwatch_fatal_errors_total",
        "Sessions terminated by a fatal collaborator error"
    )
    .unwrap()
});

/// Session running state (1 = running).
pub static SESSION_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("mwatch_session_running", "Monitoring session state (1=running)")
        .unwrap()
});

/// Connected observers.
pub static OBSERVERS_CONNECTED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("mwatch_observers_connected", "Connected WebSocket observers").unwrap()
});

/// Log file write failures.
pub static LOG_WRITE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "mwatch_log_write_failures_total",
        "Failed writes to the durable log file"
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a novel sample.
    pub fn sample_observed(parsed: bool) {
        SAMPLES_TOTAL.inc();
        if !parsed {
            UNPARSEABLE_SAMPLES_TOTAL.inc();
        }
    }

    pub fn triggered() {
        TRIGGERS_TOTAL.inc();
    }

    /// Record the outcome of the action step.
    pub fn action_outcome(outcome: &str) {
        ACTIONS_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn fatal_error() {
        FATAL_ERRORS_TOTAL.inc();
    }

    pub fn session_running(running: bool) {
        SESSION_RUNNING.set(i64::from(running));
    }

    pub fn observer_connected() {
        OBSERVERS_CONNECTED.inc();
    }

    pub fn observer_disconnected() {
        OBSERVERS_CONNECTED.dec();
    }

    pub fn log_write_failed() {
        LOG_WRITE_FAILURES_TOTAL.inc();
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
