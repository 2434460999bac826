//! Observer wire protocol.
//!
//! Events flow from the engine to every connected observer through the
//! [`EventBus`]; commands flow the other way and are decoded with
//! [`ControlCommand::parse`].

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::{CoreError, Result};
use crate::state::RunState;

/// Event emitted to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    /// Current run state (sent on connect and after every mutation).
    UpdateState(RunState),
    /// A single new log line.
    LogMessage {
        data: String,
        /// Set on the sentinel line emitted after the log was cleared.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        clear: bool,
    },
    /// Buffered history replayed to a newly connected observer.
    LogHistory { data: Vec<String> },
}

impl HubEvent {
    pub fn log(line: impl Into<String>) -> Self {
        Self::LogMessage {
            data: line.into(),
            clear: false,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Command received from an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlCommand {
    StartBot,
    StopBot,
    ToggleAutoBet,
    ClearLogs,
}

impl ControlCommand {
    /// Decode a command frame.
    ///
    /// Accepts the tagged JSON form (`{"type":"start_bot"}`) and the bare
    /// command name (`start_bot`).
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.starts_with('{') {
            return Ok(serde_json::from_str(text)?);
        }
        match text {
            "start_bot" => Ok(Self::StartBot),
            "stop_bot" => Ok(Self::StopBot),
            "toggle_auto_bet" => Ok(Self::ToggleAutoBet),
            "clear_logs" => Ok(Self::ClearLogs),
            other => Err(CoreError::UnknownCommand(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartBot => "start_bot",
            Self::StopBot => "stop_bot",
            Self::ToggleAutoBet => "toggle_auto_bet",
            Self::ClearLogs => "clear_logs",
        }
    }
}

/// Fan-out channel for [`HubEvent`]s.
///
/// Cloning is cheap; all clones publish into the same channel. Publishing
/// with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HubEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Returns the number of subscribers that received it.
    pub fn publish(&self, event: HubEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                trace!("No event subscribers connected");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_state_wire_format() {
        let event = HubEvent::UpdateState(RunState {
            running: true,
            auto_action_enabled: false,
            trigger_count: 3,
        });
        let json = event.to_json().unwrap();
        assert!(json.contains("\"type\":\"update_state\""));
        assert!(json.contains("\"running\":true"));
        assert!(json.contains("\"autoActionEnabled\":false"));
        assert!(json.contains("\"triggerCount\":3"));
    }

    #[test]
    fn test_log_message_clear_flag_omitted_when_false() {
        let json = HubEvent::log("hello").to_json().unwrap();
        assert_eq!(json, r#"{"type":"log_message","data":"hello"}"#);

        let cleared = HubEvent::LogMessage {
            data: "cleared".to_string(),
            clear: true,
        };
        assert!(cleared.to_json().unwrap().contains("\"clear\":true"));
    }

    #[test]
    fn test_log_history_wire_format() {
        let event = HubEvent::LogHistory {
            data: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"type":"log_history","data":["a","b"]}"#
        );
    }

    #[test]
    fn test_command_parse_json_and_bare() {
        assert_eq!(
            ControlCommand::parse(r#"{"type":"start_bot"}"#).unwrap(),
            ControlCommand::StartBot
        );
        assert_eq!(
            ControlCommand::parse("toggle_auto_bet").unwrap(),
            ControlCommand::ToggleAutoBet
        );
        assert_eq!(
            ControlCommand::parse(" clear_logs\n").unwrap(),
            ControlCommand::ClearLogs
        );
        assert!(matches!(
            ControlCommand::parse("launch_rockets"),
            Err(CoreError::UnknownCommand(_))
        ));
        assert!(matches!(
            ControlCommand::parse(r#"{"type":"nope"}"#),
            Err(CoreError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_bus_fan_out() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(HubEvent::log("nobody listening")), 0);

        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.publish(HubEvent::log("hi")), 2);
        assert_eq!(a.recv().await.unwrap(), HubEvent::log("hi"));
        assert_eq!(b.recv().await.unwrap(), HubEvent::log("hi"));
    }
}
