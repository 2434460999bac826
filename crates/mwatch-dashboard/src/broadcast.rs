//! Observer fan-out and command routing.
//!
//! State and log events are already published on the shared `EventBus` by
//! `SharedState` and `LogSink`; the hub only hands each observer a receiver
//! plus the greeting it needs to catch up, and routes incoming commands to
//! the session. It holds no business logic of its own.

use std::sync::Arc;

use mwatch_core::{ControlCommand, HubEvent, RunState};
use mwatch_engine::{BotSession, StartOutcome, StopOutcome};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Sent in place of `log_history` when nothing has been logged yet.
pub const NO_HISTORY_MESSAGE: &str = "Welcome! No log history yet.";

/// Fan-out point between the session and its observers.
#[derive(Clone)]
pub struct BroadcastHub {
    session: Arc<BotSession>,
}

impl BroadcastHub {
    pub fn new(session: Arc<BotSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<BotSession> {
        &self.session
    }

    /// Current run state.
    pub fn snapshot(&self) -> RunState {
        self.session.state().get()
    }

    /// Greeting for a newly connected observer plus its event receiver.
    ///
    /// The greeting is the log replay (or a welcome line) followed by the
    /// current state. Replay, snapshot and subscription are taken while the
    /// log and the state are both held still, so the receiver starts exactly
    /// where the greeting ends: no line twice, no state older than the one
    /// already sent.
    pub fn connect(&self) -> (Vec<HubEvent>, broadcast::Receiver<HubEvent>) {
        let state = self.session.state();
        let (history, (snapshot, events)) = self
            .session
            .log()
            .replay_while(|| state.snapshot_and_subscribe());

        let first = if history.is_empty() {
            HubEvent::log(NO_HISTORY_MESSAGE)
        } else {
            HubEvent::LogHistory { data: history }
        };
        (vec![first, HubEvent::UpdateState(snapshot)], events)
    }

    /// Parse and dispatch a text frame. Unknown commands are ignored.
    pub fn handle_text(&self, text: &str) -> Option<ControlCommand> {
        match ControlCommand::parse(text) {
            Ok(command) => {
                self.dispatch(command);
                Some(command)
            }
            Err(e) => {
                warn!(error = %e, frame = %text, "Ignoring unrecognised observer frame");
                None
            }
        }
    }

    /// Forward a command to the session or the log.
    pub fn dispatch(&self, command: ControlCommand) {
        debug!(command = command.as_str(), "Observer command received");
        match command {
            ControlCommand::StartBot => {
                if let StartOutcome::AlreadyActive(phase) = self.session.start() {
                    debug!(%phase, "start_bot ignored");
                }
            }
            ControlCommand::StopBot => {
                if self.session.stop() == StopOutcome::NotRunning {
                    debug!("stop_bot ignored, nothing running");
                }
            }
            ControlCommand::ToggleAutoBet => {
                self.session.toggle_auto_action();
            }
            ControlCommand::ClearLogs => {
                info!("Clearing log on observer request");
                self.session.log().clear();
            }
        }
    }
}
