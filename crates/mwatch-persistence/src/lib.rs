//! Log persistence for mwatch.
//!
//! Observer-facing log lines are appended to a plain text file and kept in a
//! bounded in-memory buffer that is replayed to newly connected observers.

pub mod error;
pub mod sink;

pub use error::{PersistenceError, PersistenceResult};
pub use sink::{LogConfig, LogSink, CLEAR_SENTINEL};
