//! `BeaconServer`: Axum HTTP + WebSocket front end.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::broadcaster::Broadcaster;
use crate::config::ServerConfig;
use crate::coordinator::Coordinator;
use crate::health::{self, HealthResponse};
use crate::metrics::UPGRADES_REJECTED_TOTAL;
use crate::shutdown::Shutdown;
use crate::transport::PeerConnection;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Where upgraded connections go.
    pub broadcaster: Arc<dyn Broadcaster>,
    /// Connection limits.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus renderer, if a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The relay server.
pub struct BeaconServer {
    config: ServerConfig,
    broadcaster: Arc<dyn Broadcaster>,
    coordinator: Option<Coordinator>,
    coordinator_task: Option<JoinHandle<()>>,
    shutdown: Shutdown,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
}

impl BeaconServer {
    /// Create a server backed by a fresh coordinator.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: ServerConfig) -> Self {
        let shutdown = Shutdown::new();
        let (coordinator, task) =
            Coordinator::spawn(shutdown.token(), config.outbound_queue_capacity);
        Self {
            config,
            broadcaster: Arc::new(coordinator.clone()),
            coordinator: Some(coordinator),
            coordinator_task: Some(task),
            shutdown,
            start_time: Instant::now(),
            metrics: None,
        }
    }

    /// Create a server that hands connections to `broadcaster` instead.
    pub fn with_broadcaster(config: ServerConfig, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            config,
            broadcaster,
            coordinator: None,
            coordinator_task: None,
            shutdown: Shutdown::new(),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            broadcaster: Arc::clone(&self.broadcaster),
            config: Arc::new(self.config.clone()),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind and serve until shutdown is triggered.
    ///
    /// Returns the bound address (useful with port `0`) and the serve task.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        let router = self.router();
        let token = self.shutdown.token();

        let handle = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(%error, "server terminated with error");
            }
        });
        info!(%addr, "listening");
        Ok((addr, handle))
    }

    /// The coordinator, when the server owns one.
    pub fn coordinator(&self) -> Option<&Coordinator> {
        self.coordinator.as_ref()
    }

    /// Take the coordinator loop's task, to await it during shutdown.
    pub fn take_coordinator_task(&mut self) -> Option<JoinHandle<()>> {
        self.coordinator_task.take()
    }

    /// Where upgraded connections go.
    pub fn broadcaster(&self) -> &Arc<dyn Broadcaster> {
        &self.broadcaster
    }

    /// Shutdown signal shared by the listener and the coordinator.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /ws
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let sessions = state.broadcaster.session_count();
    if sessions >= state.config.max_connections {
        warn!(
            sessions,
            limit = state.config.max_connections,
            "connection limit reached, refusing upgrade"
        );
        counter!(UPGRADES_REJECTED_TOTAL).increment(1);
        return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
    }

    let broadcaster = state.broadcaster;
    ws.max_message_size(state.config.max_message_size)
        .on_failed_upgrade(|error| warn!(%error, "websocket upgrade failed"))
        .on_upgrade(move |socket| async move {
            broadcaster.accept(PeerConnection::from(socket));
        })
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.broadcaster.session_count(),
        state.config.max_connections,
        state.broadcaster.last_issued(),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use beacon_core::SessionId;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    use super::*;
    use crate::broadcaster::{MockBroadcaster, NoopBroadcaster};

    fn noop_server() -> BeaconServer {
        BeaconServer::with_broadcaster(ServerConfig::default(), Arc::new(NoopBroadcaster))
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn new_owns_a_coordinator() {
        let mut server = BeaconServer::new(ServerConfig::default());
        assert!(server.coordinator().is_some());
        assert_eq!(server.broadcaster().session_count(), 0);

        let task = server.take_coordinator_task().unwrap();
        assert!(server.take_coordinator_task().is_none());
        server.shutdown().trigger();
        task.await.unwrap();
    }

    #[test]
    fn with_broadcaster_has_no_coordinator() {
        let mut server = noop_server();
        assert!(server.coordinator().is_none());
        assert!(server.take_coordinator_task().is_none());
        assert!(!server.shutdown().is_triggered());
    }

    #[tokio::test]
    async fn health_reports_session_count() {
        let mut mock = MockBroadcaster::new();
        let _ = mock.expect_session_count().return_const(4_usize);
        let _ = mock
            .expect_last_issued()
            .return_const(Some(SessionId::new(9)));
        let server = BeaconServer::with_broadcaster(ServerConfig::default(), Arc::new(mock));

        let (status, body) = get_body(server.router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["sessions"], 4);
        assert_eq!(parsed["last_issued"], "9");
    }

    #[tokio::test]
    async fn health_reports_full_at_the_limit() {
        let mut mock = MockBroadcaster::new();
        let _ = mock.expect_session_count().return_const(2_usize);
        let _ = mock.expect_last_issued().return_const(Some(SessionId::new(2)));
        let config = ServerConfig {
            max_connections: 2,
            ..ServerConfig::default()
        };
        let server = BeaconServer::with_broadcaster(config, Arc::new(mock));

        let (_, body) = get_body(server.router(), "/health").await;
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "full");
        assert_eq!(parsed["max_connections"], 2);
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_404() {
        let (status, _) = get_body(noop_server().router(), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_renders_prometheus_text() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            counter!(UPGRADES_REJECTED_TOTAL).increment(1);
        });
        let server = noop_server().with_metrics(handle);

        let (status, body) = get_body(server.router(), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("beacon_upgrades_rejected_total 1"), "{text}");
    }

    #[tokio::test]
    async fn ws_without_upgrade_headers_is_rejected() {
        let (status, _) = get_body(noop_server().router(), "/ws").await;
        assert!(status.is_client_error(), "{status}");
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (status, _) = get_body(noop_server().router(), "/nonexistent").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listen_binds_an_ephemeral_port() {
        let server = noop_server();
        let (addr, handle) = server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);
        server.shutdown().trigger();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
