//! WebSocket upgrade handler.
//!
//! Validates the HTTP handshake, answers `101 Switching Protocols` and, once
//! hyper hands over the raw connection, turns it into a [`Connection`] that
//! joins the hub.
//!
//! # Handshake Flow
//!
//! 1. Client sends `GET /ws` with `Upgrade: websocket` headers
//! 2. Headers are validated; failure answers `500` with the reason
//! 3. Server answers `101` with `Sec-WebSocket-Accept`
//! 4. The upgraded stream becomes a server-role [`WebSocketStream`]
//! 5. The connection is seeded, registered and its duties started

// ============================================================================
// Imports
// ============================================================================

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{Response as HttpResponse, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper_util::rt::TokioIo;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::handshake::server::create_response;
use tokio_tungstenite::tungstenite::protocol::Role;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::hub::Hub;

use super::Connection;

// ============================================================================
// Handler
// ============================================================================

/// Axum handler for the WebSocket endpoint.
///
/// On handshake failure nothing is created and the requester gets
/// `500 Internal Server Error` with a description of what was wrong.
pub async fn ws_upgrade(State(hub): State<Hub>, mut request: Request) -> Response {
    let response = match handshake_response(&request) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "WebSocket handshake rejected");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let on_upgrade = hyper::upgrade::on(&mut request);

    tokio::spawn(async move {
        let upgraded = match on_upgrade.await {
            Ok(upgraded) => upgraded,
            Err(e) => {
                warn!(error = %e, "Connection upgrade failed");
                return;
            }
        };

        let ws_stream =
            WebSocketStream::from_raw_socket(TokioIo::new(upgraded), Role::Server, None).await;
        let connection = Connection::new(ws_stream, &hub);
        let id = connection.id();

        if let Err(e) = connection.start() {
            debug!(connection_id = %id, error = %e, "Connection could not join hub");
        }
    });

    response
}

// ============================================================================
// Handshake
// ============================================================================

/// Validates the upgrade request and builds the `101` response.
///
/// # Errors
///
/// Returns [`Error::Handshake`] if the request is not a valid WebSocket
/// upgrade (wrong method, HTTP version, `Connection`, `Upgrade`,
/// `Sec-WebSocket-Version` or missing `Sec-WebSocket-Key`).
pub fn handshake_response(request: &Request) -> Result<Response> {
    let mut probe = axum::http::Request::new(());
    *probe.method_mut() = request.method().clone();
    *probe.uri_mut() = request.uri().clone();
    *probe.version_mut() = request.version();
    *probe.headers_mut() = request.headers().clone();

    let response: HttpResponse<()> =
        create_response(&probe).map_err(|e| Error::handshake(e.to_string()))?;

    let (parts, ()) = response.into_parts();
    Ok(Response::from_parts(parts, Body::empty()))
}

// ============================================================================
// Tests
// ============================================================================
