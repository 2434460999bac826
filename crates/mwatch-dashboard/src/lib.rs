//! mwatch-dashboard - Observer surface for the monitoring bot.
//!
//! Serves a single-page control panel and streams state and log events to
//! every connected observer over WebSocket. Observers send commands back on
//! the same socket.
//!
//! # Routes
//!
//! ```text
//! GET /           → Static HTML/JS control panel
//! GET /api/state  → Current RunState as JSON
//! GET /ws         → WebSocket: events out, commands in
//! GET /metrics    → Prometheus text format
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use mwatch_dashboard::{run_server, BroadcastHub, DashboardConfig};
//!
//! let hub = BroadcastHub::new(session.clone());
//! run_server(hub, DashboardConfig::default(), shutdown_signal()).await?;
//! ```

mod broadcast;
mod config;
mod error;
mod server;

pub use broadcast::{BroadcastHub, NO_HISTORY_MESSAGE};
pub use config::DashboardConfig;
pub use error::{DashboardError, DashboardResult};
pub use server::{create_router, run_server, serve, AppState, ConnectionLimiter};
