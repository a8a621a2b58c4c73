//! HTTP server lifecycle.
//!
//! Binds the listener, spawns the hub and serves three kinds of request on a
//! single port:
//!
//! | Path | Handler |
//! |------|---------|
//! | `/ws` | WebSocket upgrade into the hub |
//! | `/changenumber` | Stateless increment endpoint |
//! | anything else | Static files |

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::hub::Hub;
use crate::transport::ws_upgrade;

use super::config::ServerConfig;
use super::increment::change_number;

// ============================================================================
// Constants
// ============================================================================

/// Path of the WebSocket endpoint.
pub const WS_PATH: &str = "/ws";

/// Path of the increment endpoint.
pub const INCREMENT_PATH: &str = "/changenumber";

// ============================================================================
// Server
// ============================================================================

/// A bound server with a running hub, ready to serve.
///
/// # Example
///
/// ```ignore
/// let config = ServerConfig::builder().build()?;
/// let server = Server::bind(config).await?;
/// println!("Listening on {}", server.local_addr());
/// server.run().await?;
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
    hub: Hub,
}

impl Server {
    /// Binds the listener and spawns the hub.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the address cannot be bound. This is the
    /// only startup failure that should end the process.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::bind(addr, source))?;
        let local_addr = listener.local_addr()?;

        let hub = Hub::spawn(config.initial_count(), config.queue_capacity());
        let router = router(hub.clone(), config.static_dir());

        info!(addr = %local_addr, "Started HTTP Server");

        Ok(Self {
            listener,
            local_addr,
            router,
            hub,
        })
    }

    /// Returns the address the listener is bound to.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns a handle to the server's hub.
    #[inline]
    #[must_use]
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Serves until `shutdown` resolves, then shuts the hub down, closing
    /// every WebSocket connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the accept loop fails.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            listener,
            router,
            hub,
            ..
        } = self;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        hub.shutdown().await;
        info!("HTTP Server stopped");

        Ok(())
    }

    /// Serves until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the accept loop fails.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
            info!("Ctrl+C received, shutting down");
        })
        .await
    }
}

// ============================================================================
// Router
// ============================================================================

/// Builds the application router.
pub fn router(hub: Hub, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route(WS_PATH, get(ws_upgrade))
        .route(INCREMENT_PATH, get(change_number))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::net::{IpAddr, Ipv4Addr};

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_path(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("infallible");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, String::from_utf8(body.to_vec()).expect("utf-8"))
    }

    fn test_config(dir: &Path) -> ServerConfig {
        ServerConfig::builder()
            .bind_addr(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .static_dir(dir)
            .build()
            .expect("config")
    }

    #[tokio::test]
    async fn test_increment_route() {
        let dir = tempfile::tempdir().expect("tempdir");
        let hub = Hub::spawn(0, 8);

        let ok = get_path(router(hub.clone(), dir.path()), "/changenumber?number=5").await;
        assert_eq!(ok, (StatusCode::OK, "6".to_owned()));

        let missing = get_path(router(hub.clone(), dir.path()), "/changenumber").await;
        assert_eq!(
            missing,
            (StatusCode::BAD_REQUEST, "No number provided".to_owned())
        );

        let invalid = get_path(router(hub.clone(), dir.path()), "/changenumber?number=abc").await;
        assert_eq!(invalid.0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(invalid.1, "invalid digit found in string");

        // The endpoint never touches the hub's counter.
        assert_eq!(hub.count(), 0);
    }

    #[tokio::test]
    async fn test_ws_route_rejects_plain_get() {
        let dir = tempfile::tempdir().expect("tempdir");
        let hub = Hub::spawn(0, 8);

        let (status, body) = get_path(router(hub.clone(), dir.path()), "/ws").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("WebSocket upgrade failed: "));
        assert!(hub.members().await.expect("members").is_empty());
    }

    #[tokio::test]
    async fn test_static_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("index.html"), "<h1>counter</h1>").expect("write");
        fs::create_dir(dir.path().join("js")).expect("mkdir");
        fs::write(dir.path().join("js/app.js"), "// app").expect("write");
        let hub = Hub::spawn(0, 8);

        let index = get_path(router(hub.clone(), dir.path()), "/").await;
        assert_eq!(index, (StatusCode::OK, "<h1>counter</h1>".to_owned()));

        let script = get_path(router(hub.clone(), dir.path()), "/js/app.js").await;
        assert_eq!(script, (StatusCode::OK, "// app".to_owned()));

        let missing = get_path(router(hub, dir.path()), "/nope.css").await;
        assert_eq!(missing.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bind_random_port() {
        let dir = tempfile::tempdir().expect("tempdir");
        let server = Server::bind(test_config(dir.path())).await.expect("bind");

        assert!(server.local_addr().port() > 0);
        assert_eq!(server.hub().count(), 0);
    }

    #[tokio::test]
    async fn test_bind_in_use_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = Server::bind(test_config(dir.path())).await.expect("bind");

        let taken = ServerConfig::builder()
            .bind_addr(first.local_addr())
            .static_dir(dir.path())
            .build()
            .expect("config");
        let err = Server::bind(taken).await.err().expect("second bind must fail");

        assert!(matches!(err, Error::Bind { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_run_until_shuts_hub_down() {
        let dir = tempfile::tempdir().expect("tempdir");
        let server = Server::bind(test_config(dir.path())).await.expect("bind");
        let hub = server.hub().clone();

        server.run_until(async {}).await.expect("run");

        assert!(matches!(hub.increment(), Err(Error::HubClosed)));
    }
}
