//! Core domain types for the mwatch multiplier monitor.
//!
//! This crate provides the types shared by every other mwatch crate:
//! - `RunState` / `SharedState`: the single source of truth for run status
//! - `Sample`, `Balance`: parsed observations read from the remote page
//! - `LogEntry`: one observer-facing log line
//! - `HubEvent`, `EventBus`, `ControlCommand`: observer wire protocol

pub mod balance;
pub mod error;
pub mod event;
pub mod log_entry;
pub mod sample;
pub mod state;

pub use balance::{parse_balance, Balance};
pub use error::{CoreError, Result};
pub use event::{ControlCommand, EventBus, HubEvent};
pub use log_entry::{LogEntry, LOG_TIMESTAMP_FORMAT};
pub use sample::{parse_multiplier, try_parse_multiplier, Sample};
pub use state::{RunState, SharedState};
