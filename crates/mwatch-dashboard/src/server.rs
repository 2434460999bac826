//! HTTP server implementation using axum.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, StreamExt};
use futures_util::SinkExt;
use mwatch_core::{HubEvent, RunState};
use mwatch_telemetry::Metrics;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::broadcast::BroadcastHub;
use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};

/// Caps concurrent observer connections.
pub struct ConnectionLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    /// Reserve a slot. The slot is released when the guard drops.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current >= self.max {
                return None;
            }
            if self
                .current
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(ConnectionGuard {
                    limiter: Arc::clone(self),
                });
            }
        }
    }

    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

/// Owned connection slot; moves into the upgraded socket task.
pub struct ConnectionGuard {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    hub: BroadcastHub,
    connection_limiter: Arc<ConnectionLimiter>,
    max_connections: usize,
}

impl AppState {
    pub fn new(hub: BroadcastHub, config: &DashboardConfig) -> Self {
        Self {
            hub,
            connection_limiter: Arc::new(ConnectionLimiter::new(config.max_connections)),
            max_connections: config.max_connections,
        }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/state", get(get_state))
        .route("/metrics", get(get_metrics))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn get_state(State(state): State<AppState>) -> Json<RunState> {
    Json(state.hub.snapshot())
}

async fn get_metrics() -> Response {
    match Metrics::render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// WebSocket upgrade handler.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let Some(guard) = state.connection_limiter.try_acquire() else {
        warn!(
            current = state.connection_limiter.current_count(),
            max = state.max_connections,
            "Observer connection limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    };

    info!(
        connections = state.connection_limiter.current_count(),
        "New observer connection"
    );

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, guard))
}

/// Serve one observer until it disconnects.
async fn handle_ws_connection(socket: WebSocket, state: AppState, _guard: ConnectionGuard) {
    Metrics::observer_connected();
    let (mut sender, mut receiver) = socket.split();

    let (greeting, mut events) = state.hub.connect();

    let greeted = async {
        for event in &greeting {
            send_event(&mut sender, event).await?;
        }
        Ok::<(), axum::Error>(())
    };
    if greeted.await.is_err() {
        debug!("Observer left before greeting completed");
        Metrics::observer_disconnected();
        return;
    }

    loop {
        tokio::select! {
            result = events.recv() => {
                let event = match result {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "Observer lagged, resending state");
                        HubEvent::UpdateState(state.hub.snapshot())
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Event bus closed");
                        break;
                    }
                };
                if send_event(&mut sender, &event).await.is_err() {
                    debug!("Failed to send event, observer disconnected");
                    break;
                }
            }
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        state.hub.handle_text(text.as_str());
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Observer closed the connection");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket receive error");
                        break;
                    }
                    // Pings are answered by axum.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    Metrics::observer_disconnected();
    info!(
        connections = state.connection_limiter.current_count().saturating_sub(1),
        "Observer connection closed"
    );
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &HubEvent,
) -> Result<(), axum::Error> {
    match event.to_json() {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            error!(error = %e, "Failed to serialize observer event");
            Ok(())
        }
    }
}

/// Serve the dashboard on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> DashboardResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Bind and run the dashboard HTTP server.
pub async fn run_server<F>(
    hub: BroadcastHub,
    config: DashboardConfig,
    shutdown: F,
) -> DashboardResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| DashboardError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(addr = %addr, "Starting dashboard server");

    serve(listener, AppState::new(hub, &config), shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use mwatch_core::{EventBus, SharedState};
    use mwatch_engine::{BotSession, EngineConfig, MockCollaborator};
    use mwatch_persistence::{LogConfig, LogSink};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app_state(dir: &TempDir) -> AppState {
        let bus = EventBus::new(64);
        let log = Arc::new(LogSink::open(
            &LogConfig {
                path: dir.path().join("bot_log.txt"),
                history_capacity: 200,
            },
            bus.clone(),
        ));
        let session = BotSession::new(
            EngineConfig::default(),
            SharedState::new(bus),
            log,
            Arc::new(MockCollaborator::new()),
        );
        AppState::new(
            BroadcastHub::new(Arc::new(session)),
            &DashboardConfig::default(),
        )
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, String) {
        let response = create_router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_api_state() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get(app_state(&dir), "/api/state").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["running"], false);
        assert_eq!(json["autoActionEnabled"], false);
        assert_eq!(json["triggerCount"], 0);
    }

    #[tokio::test]
    async fn test_index_served() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get(app_state(&dir), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<html"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let dir = TempDir::new().unwrap();
        Metrics::triggered();
        let (status, body) = get(app_state(&dir), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("mwatch_triggers_total"));
    }

    #[test]
    fn test_connection_limiter() {
        let limiter = Arc::new(ConnectionLimiter::new(2));
        let a = limiter.try_acquire().unwrap();
        let _b = limiter.try_acquire().unwrap();
        assert!(limiter.try_acquire().is_none());
        assert_eq!(limiter.current_count(), 2);

        drop(a);
        assert_eq!(limiter.current_count(), 1);
        assert!(limiter.try_acquire().is_some());
    }
}
