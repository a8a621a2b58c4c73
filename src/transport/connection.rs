//! WebSocket connection and its two duties.
//!
//! Each connection runs two tokio tasks:
//!
//! - **inbound duty**: reads frames; every text or binary frame increments
//!   the shared counter. On exit it unregisters the connection, which closes
//!   the outbound queue.
//! - **outbound duty**: drains the outbound queue to the socket. On queue
//!   closure or write failure it sends a close frame and exits, which stops
//!   the inbound duty.
//!
//! Either side ending brings the other one down, so neither duty keeps
//! running against a dead transport.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::hub::{Hub, Payload, WeakHub};
use crate::identifiers::ConnectionId;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound on flushing the close frame to an unresponsive peer.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Connection
// ============================================================================

/// A WebSocket connection that has not joined the hub yet.
///
/// Generic over the underlying byte stream so the same code serves upgraded
/// HTTP connections and in-memory test transports.
pub struct Connection<S> {
    /// Process-unique identity.
    id: ConnectionId,
    /// Underlying WebSocket.
    ws_stream: WebSocketStream<S>,
    /// Sending half of the outbound queue, handed to the hub on join.
    outbound_tx: mpsc::Sender<Payload>,
    /// Receiving half of the outbound queue, drained by the outbound duty.
    outbound_rx: mpsc::Receiver<Payload>,
    /// Non-owning back reference to the hub.
    hub: WeakHub,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps a WebSocket stream with a fresh identity and outbound queue
    /// sized by the hub's queue capacity.
    pub fn new(ws_stream: WebSocketStream<S>, hub: &Hub) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(hub.queue_capacity());

        Self {
            id: ConnectionId::next(),
            ws_stream,
            outbound_tx,
            outbound_rx,
            hub: hub.downgrade(),
        }
    }

    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Joins the hub and starts both duties.
    ///
    /// The current counter value is queued before the connection becomes a
    /// member, so it is always the first frame the client receives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HubClosed`] if the hub has stopped. The transport is
    /// dropped in that case.
    pub fn start(self) -> Result<ConnectionTasks> {
        let Self {
            id,
            ws_stream,
            outbound_tx,
            outbound_rx,
            hub,
        } = self;

        let seed = hub.upgrade().ok_or(Error::HubClosed)?.join(id, outbound_tx)?;

        info!(connection_id = %id, seed, "Connection joined");

        let (ws_write, ws_read) = ws_stream.split();
        let (closed_tx, closed_rx) = oneshot::channel();

        let outbound = tokio::spawn(run_outbound(id, ws_write, outbound_rx, closed_tx));
        let inbound = tokio::spawn(run_inbound(id, ws_read, hub, closed_rx));

        Ok(ConnectionTasks {
            id,
            inbound,
            outbound,
        })
    }
}

// ============================================================================
// ConnectionTasks
// ============================================================================

/// Join handles of a started connection's duties.
#[derive(Debug)]
pub struct ConnectionTasks {
    id: ConnectionId,
    inbound: JoinHandle<()>,
    outbound: JoinHandle<()>,
}

impl ConnectionTasks {
    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Waits until both duties have exited.
    pub async fn join(self) {
        let _ = self.inbound.await;
        let _ = self.outbound.await;
    }
}

// ============================================================================
// Duties
// ============================================================================

/// Drains the outbound queue to the socket.
///
/// `closed` is dropped on exit, which wakes the inbound duty.
async fn run_outbound<S>(
    id: ConnectionId,
    mut ws_write: SplitSink<WebSocketStream<S>, Message>,
    mut outbound: mpsc::Receiver<Payload>,
    closed: oneshot::Sender<()>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(payload) = outbound.recv().await {
        if let Err(e) = ws_write.send(Message::Text(payload)).await {
            debug!(connection_id = %id, error = %e, "WebSocket write failed");
            break;
        }
    }

    drop(closed);

    match timeout(CLOSE_TIMEOUT, ws_write.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => trace!(connection_id = %id, error = %e, "WebSocket close failed"),
        Err(_) => debug!(connection_id = %id, "WebSocket close timed out"),
    }

    debug!(connection_id = %id, "Outbound duty terminated");
}

/// Reads frames and turns each one into a counter increment.
async fn run_inbound<S>(
    id: ConnectionId,
    mut ws_read: SplitStream<WebSocketStream<S>>,
    hub: WeakHub,
    mut closed: oneshot::Receiver<()>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            _ = &mut closed => {
                debug!(connection_id = %id, "Outbound duty ended");
                break;
            }

            message = ws_read.next() => {
                match message {
                    // Content is ignored; any data frame is an increment.
                    Some(Ok(Message::Text(_) | Message::Binary(_))) => {
                        let Some(hub) = hub.upgrade() else {
                            debug!(connection_id = %id, "Hub gone");
                            break;
                        };

                        match hub.increment() {
                            Ok(value) => trace!(connection_id = %id, value, "Counter incremented"),
                            Err(e) => {
                                debug!(connection_id = %id, error = %e, "Increment failed");
                                break;
                            }
                        }
                    }

                    Some(Ok(Message::Close(_))) => {
                        debug!(connection_id = %id, "WebSocket closed by remote");
                        break;
                    }

                    Some(Err(e)) => {
                        debug!(connection_id = %id, error = %e, "WebSocket read failed");
                        break;
                    }

                    None => {
                        debug!(connection_id = %id, "WebSocket stream ended");
                        break;
                    }

                    // Ignore Ping, Pong, raw frames
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    if let Some(hub) = hub.upgrade() {
        hub.unregister(id);
    }

    info!(connection_id = %id, "Connection left");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::DuplexStream;
    use tokio_tungstenite::tungstenite::protocol::Role;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    type Client = WebSocketStream<DuplexStream>;

    /// Starts a connection over an in-memory pipe and returns the client end.
    async fn connect(hub: &Hub) -> (Client, ConnectionTasks) {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;

        let tasks = Connection::new(server, hub).start().expect("start");
        (client, tasks)
    }

    async fn next_text(client: &mut Client) -> String {
        loop {
            let message = timeout(RECV_TIMEOUT, client.next())
                .await
                .expect("timed out waiting for frame")
                .expect("stream ended")
                .expect("read failed");

            if let Message::Text(text) = message {
                return text.as_str().to_owned();
            }
        }
    }

    async fn wait_for_members(hub: &Hub, expected: usize) {
        timeout(RECV_TIMEOUT, async {
            while hub.connection_count().await.expect("members") != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("membership never settled");
    }

    #[tokio::test]
    async fn test_first_frame_is_seed() {
        let hub = Hub::spawn(12, 8);
        let (mut client, tasks) = connect(&hub).await;

        assert_eq!(next_text(&mut client).await, "12");
        assert_eq!(hub.members().await.expect("members"), vec![tasks.id()]);
    }

    #[tokio::test]
    async fn test_inbound_frame_broadcasts_to_everyone() {
        let hub = Hub::spawn(0, 8);
        let (mut a, _a_tasks) = connect(&hub).await;
        let (mut b, _b_tasks) = connect(&hub).await;
        assert_eq!(next_text(&mut a).await, "0");
        assert_eq!(next_text(&mut b).await, "0");

        a.send(Message::text("ignored")).await.expect("send");

        assert_eq!(next_text(&mut a).await, "1");
        assert_eq!(next_text(&mut b).await, "1");
        assert_eq!(hub.count(), 1);
    }

    #[tokio::test]
    async fn test_binary_frame_also_increments() {
        let hub = Hub::spawn(0, 8);
        let (mut client, _tasks) = connect(&hub).await;
        assert_eq!(next_text(&mut client).await, "0");

        client
            .send(Message::binary(vec![1, 2, 3]))
            .await
            .expect("send");
        assert_eq!(next_text(&mut client).await, "1");
    }

    #[tokio::test]
    async fn test_ping_does_not_increment() {
        let hub = Hub::spawn(0, 8);
        let (mut client, _tasks) = connect(&hub).await;
        assert_eq!(next_text(&mut client).await, "0");

        client.send(Message::Ping(Vec::new().into())).await.expect("ping");
        client.send(Message::text("x")).await.expect("send");

        assert_eq!(next_text(&mut client).await, "1");
        assert_eq!(hub.count(), 1);
    }

    #[tokio::test]
    async fn test_client_close_unregisters() {
        let hub = Hub::spawn(0, 8);
        let (mut a, _a_tasks) = connect(&hub).await;
        let (mut b, b_tasks) = connect(&hub).await;
        assert_eq!(next_text(&mut a).await, "0");
        assert_eq!(next_text(&mut b).await, "0");

        b.close(None).await.expect("close");
        timeout(RECV_TIMEOUT, b_tasks.join())
            .await
            .expect("duties did not stop");
        wait_for_members(&hub, 1).await;

        a.send(Message::text("x")).await.expect("send");
        assert_eq!(next_text(&mut a).await, "1");
    }

    #[tokio::test]
    async fn test_dropped_transport_stops_both_duties() {
        let hub = Hub::spawn(0, 8);
        let (client, tasks) = connect(&hub).await;

        drop(client);

        timeout(RECV_TIMEOUT, tasks.join())
            .await
            .expect("duties did not stop");
        wait_for_members(&hub, 0).await;
    }

    #[tokio::test]
    async fn test_hub_shutdown_closes_client() {
        let hub = Hub::spawn(0, 8);
        let (mut client, tasks) = connect(&hub).await;
        assert_eq!(next_text(&mut client).await, "0");

        hub.shutdown().await;

        let message = timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for close");
        assert!(matches!(message, Some(Ok(Message::Close(_))) | None));
        drop(client);

        timeout(RECV_TIMEOUT, tasks.join())
            .await
            .expect("duties did not stop");
    }

    #[tokio::test]
    async fn test_start_fails_when_hub_closed() {
        let hub = Hub::spawn(0, 8);
        hub.shutdown().await;

        let (_client_io, server_io) = tokio::io::duplex(1024);
        let server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;
        let result = Connection::new(server, &hub).start();

        assert!(matches!(result, Err(Error::HubClosed)));
    }
}
