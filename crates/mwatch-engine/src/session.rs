//! Monitoring session lifecycle.
//!
//! ```text
//!   Idle ──start──▶ Starting ──spawn──▶ Running ──stop──▶ Stopping
//!    ▲                                     │                 │
//!    └──────────── worker cleanup ◀────────┴── fatal error ──┘
//! ```
//!
//! - `start` is only accepted in `Idle`, which makes the single-worker rule
//!   a property of the state machine rather than of its callers.
//! - `stop` only cancels the token. The worker notices it at its next loop
//!   check (or while idling between polls) and tears itself down.
//! - Cleanup runs in the worker exactly once, whatever ended the loop: it
//!   logs the shutdown, resets `SharedState` and returns the phase to `Idle`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use mwatch_core::SharedState;
use mwatch_persistence::LogSink;
use mwatch_telemetry::Metrics;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::collaborator::DynCollaborator;
use crate::config::EngineConfig;
use crate::cooldown::CooldownGate;
use crate::decision::DecisionEngine;
use crate::error::{EngineError, EngineResult};
use crate::watcher::ResultWatcher;

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Starting,
    Running,
    Stopping,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
        }
    }
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Ignored: a session is already active or winding down.
    AlreadyActive(SessionPhase),
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Cancellation signalled; the worker will wind down.
    Signalled,
    /// A stop is already in progress.
    AlreadyStopping,
    /// Nothing to stop.
    NotRunning,
}

struct SessionControl {
    phase: SessionPhase,
    cancel: Option<CancellationToken>,
    worker: Option<JoinHandle<()>>,
}

/// Owner of the single background monitoring worker.
pub struct BotSession {
    config: EngineConfig,
    state: SharedState,
    log: Arc<LogSink>,
    cooldown: Arc<CooldownGate>,
    collaborator: DynCollaborator,
    control: Arc<Mutex<SessionControl>>,
}

impl BotSession {
    /// Create an idle session.
    ///
    /// The cooldown gate lives as long as the session object, so restarting
    /// monitoring does not reset the time since the last bet.
    pub fn new(
        config: EngineConfig,
        state: SharedState,
        log: Arc<LogSink>,
        collaborator: DynCollaborator,
    ) -> Self {
        let cooldown = Arc::new(CooldownGate::new(config.cooldown()));
        Self {
            config,
            state,
            log,
            cooldown,
            collaborator,
            control: Arc::new(Mutex::new(SessionControl {
                phase: SessionPhase::Idle,
                cancel: None,
                worker: None,
            })),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.control.lock().phase
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn log(&self) -> &Arc<LogSink> {
        &self.log
    }

    pub fn cooldown(&self) -> &Arc<CooldownGate> {
        &self.cooldown
    }

    /// Start monitoring. Must be called from within a Tokio runtime.
    pub fn start(&self) -> StartOutcome {
        let mut control = self.control.lock();
        if control.phase != SessionPhase::Idle {
            info!(phase = %control.phase, "Start ignored, session already active");
            return StartOutcome::AlreadyActive(control.phase);
        }

        control.phase = SessionPhase::Starting;
        self.state.begin_run();
        Metrics::session_running(true);

        let token = CancellationToken::new();
        let worker = Worker {
            poll_interval: self.config.poll_interval(),
            engine: DecisionEngine::new(
                &self.config,
                self.state.clone(),
                self.log.clone(),
                self.cooldown.clone(),
            ),
            state: self.state.clone(),
            log: self.log.clone(),
            collaborator: self.collaborator.clone(),
            token: token.clone(),
            control: self.control.clone(),
        };

        control.worker = Some(tokio::spawn(worker.run()));
        control.cancel = Some(token);
        control.phase = SessionPhase::Running;
        info!("Monitoring session started");

        StartOutcome::Started
    }

    /// Ask the worker to stop. Teardown happens asynchronously.
    pub fn stop(&self) -> StopOutcome {
        let mut control = self.control.lock();
        match control.phase {
            SessionPhase::Running => {
                control.phase = SessionPhase::Stopping;
                // Logged before cancelling so it precedes the worker's shutdown line.
                self.log.append("--- Sending stop signal to bot... ---");
                if let Some(token) = &control.cancel {
                    token.cancel();
                }
                info!("Stop signal sent to monitoring worker");
                StopOutcome::Signalled
            }
            SessionPhase::Stopping => StopOutcome::AlreadyStopping,
            SessionPhase::Idle | SessionPhase::Starting => StopOutcome::NotRunning,
        }
    }

    /// Flip auto-bet. Only effective while running.
    pub fn toggle_auto_action(&self) -> Option<bool> {
        let toggled = self.state.toggle_auto_action();
        match toggled {
            Some(enabled) => info!(
                enabled,
                "Auto-bet toggled to {}",
                if enabled { "ENABLED" } else { "DISABLED" }
            ),
            None => info!("Auto-bet toggle ignored, session not running"),
        }
        toggled
    }

    /// Stop (if running) and wait for the worker to finish its cleanup.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.control.lock().worker.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Monitoring worker join failed");
            }
        }
    }
}

impl std::fmt::Debug for BotSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSession")
            .field("phase", &self.phase())
            .field("state", &self.state.get())
            .finish()
    }
}

/// The background loop. Owned by the spawned task.
struct Worker {
    poll_interval: Duration,
    engine: DecisionEngine,
    state: SharedState,
    log: Arc<LogSink>,
    collaborator: DynCollaborator,
    token: CancellationToken,
    control: Arc<Mutex<SessionControl>>,
}

impl Worker {
    async fn run(self) {
        let outcome = AssertUnwindSafe(self.monitor()).catch_unwind().await;
        let result = match outcome {
            Ok(result) => result,
            Err(panic) => Err(EngineError::WorkerPanicked(panic_message(panic))),
        };

        if let Err(e) = result {
            Metrics::fatal_error();
            error!(error = %e, "Monitoring worker failed");
            self.log
                .append(format!("!!!!!!!! A FATAL ERROR OCCURRED: {e} !!!!!!!!"));
        }

        self.cleanup();
    }

    async fn monitor(&self) -> EngineResult<()> {
        self.collaborator.prepare().await?;
        self.log.append("--- BOT MONITORING STARTED ---");

        let mut watcher = ResultWatcher::new();
        while !self.token.is_cancelled() {
            if let Some(sample) = watcher.poll(self.collaborator.as_ref()).await? {
                self.engine
                    .on_sample(&sample, self.collaborator.as_ref(), Instant::now())
                    .await?;
            }

            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        Ok(())
    }

    fn cleanup(&self) {
        self.log.append("--- Bot thread is shutting down. ---");

        // Same order as `start`: control, then state. Observers told
        // `running=false` can start again straight away.
        let mut control = self.control.lock();
        self.state.end_run();
        Metrics::session_running(false);
        control.phase = SessionPhase::Idle;
        control.cancel = None;
        control.worker = None;
        info!("Monitoring session ended");
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
