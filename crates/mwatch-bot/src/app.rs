//! Main application orchestration.
//!
//! Builds the shared pieces once and hands them out:
//! - `EventBus` + `SharedState`: run state, broadcast on every change
//! - `LogSink`: observer log, file-backed
//! - `BotSession`: owns the monitoring worker and the cooldown gate
//! - dashboard: serves observers until Ctrl-C
//!
//! Monitoring does not start on its own; an observer sends `start_bot`.

use std::future::Future;
use std::sync::Arc;

use mwatch_core::{EventBus, SharedState};
use mwatch_dashboard::{run_server, BroadcastHub};
use mwatch_engine::{BotSession, DynCollaborator};
use mwatch_persistence::LogSink;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::http_collaborator::HttpCollaborator;

/// Capacity of the observer event channel.
const EVENT_BUS_CAPACITY: usize = 1024;

/// Main application.
pub struct Application {
    config: AppConfig,
    session: Arc<BotSession>,
}

impl Application {
    /// Create the application against the configured driver.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let collaborator: DynCollaborator = Arc::new(HttpCollaborator::new(&config.driver)?);
        Ok(Self::with_collaborator(config, collaborator))
    }

    /// Create the application with a custom collaborator.
    pub fn with_collaborator(config: AppConfig, collaborator: DynCollaborator) -> Self {
        let bus = EventBus::new(EVENT_BUS_CAPACITY);
        let state = SharedState::new(bus.clone());
        let log = Arc::new(LogSink::open(&config.log, bus));
        let session = Arc::new(BotSession::new(
            config.engine.clone(),
            state,
            log,
            collaborator,
        ));

        Self { config, session }
    }

    pub fn session(&self) -> &Arc<BotSession> {
        &self.session
    }

    /// Serve observers until Ctrl-C, then stop the worker.
    pub async fn run(self) -> AppResult<()> {
        self.run_until(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await
    }

    /// Serve observers until `shutdown` resolves, then stop the worker.
    pub async fn run_until<F>(self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            threshold = self.config.engine.trigger_threshold,
            cooldown_secs = self.config.engine.cooldown_secs,
            poll_interval_ms = self.config.engine.poll_interval_ms,
            driver = %self.config.driver.base_url,
            log_path = %self.config.log.path.display(),
            "Starting application"
        );

        let hub = BroadcastHub::new(self.session.clone());
        let served = run_server(hub, self.config.dashboard.clone(), shutdown).await;

        self.session.shutdown().await;
        info!("Shutting down");

        served?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwatch_engine::MockCollaborator;
    use mwatch_engine::SessionPhase;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.log.path = dir.path().join("bot_log.txt");
        config.engine.poll_interval_ms = 5;
        config.dashboard.host = "127.0.0.1".to_string();
        config.dashboard.port = 0;
        config
    }

    #[tokio::test]
    async fn test_run_until_stops_running_session() {
        let dir = TempDir::new().unwrap();
        let app = Application::with_collaborator(
            config_in(&dir),
            Arc::new(MockCollaborator::with_samples(["1.0x"])),
        );
        let session = app.session().clone();
        session.start();
        assert_eq!(session.phase(), SessionPhase::Running);

        app.run_until(async {}).await.unwrap();

        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(!session.state().get().running);
    }

    #[tokio::test]
    async fn test_new_builds_http_collaborator() {
        let dir = TempDir::new().unwrap();
        let app = Application::new(config_in(&dir)).unwrap();
        assert_eq!(app.session().phase(), SessionPhase::Idle);
    }
}
