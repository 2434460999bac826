//! Monitoring and decision engine for mwatch.
//!
//! Polls the page-automation collaborator for the latest multiplier,
//! deduplicates it, counts threshold triggers and, when armed, places a bet
//! behind a cooldown. `BotSession` owns the lifecycle of the single
//! background worker that runs this loop.

pub mod collaborator;
pub mod config;
pub mod cooldown;
pub mod decision;
pub mod error;
pub mod session;
pub mod watcher;

pub use collaborator::{
    BoxFuture, Collaborator, CollaboratorError, CollaboratorResult, DynCollaborator,
    MockCollaborator,
};
pub use config::EngineConfig;
pub use cooldown::CooldownGate;
pub use decision::{ActionOutcome, Decision, DecisionEngine};
pub use error::{EngineError, EngineResult};
pub use session::{BotSession, SessionPhase, StartOutcome, StopOutcome};
pub use watcher::ResultWatcher;
