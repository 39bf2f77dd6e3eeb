// WebSocket connection-protocol adapter
//
// Implements the mock engine's client/server connection contract on
// top of a single framework WebSocket route. The client half
// (client.rs) is always live: it maps directly onto the route object.
// The server half (server.rs) stands in for the real upstream
// endpoint, which does not exist until a handler calls `connect()`,
// and buffers everything issued before that point.

mod client;
mod server;

pub use client::RouteClientConnection;
pub use server::RouteServerConnection;

use crate::error::Result;
use crate::routing::{WebSocketRoute, WireMessage};
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Payload accepted by a connection's `send`.
///
/// Covers everything the WebSocket protocol can carry. The route
/// transport is narrower (text and bytes only), so `Blob` payloads are
/// materialized into bytes before they reach the wire.
#[derive(Debug)]
pub enum WebSocketData {
    Text(String),
    Binary(Bytes),
    Blob(Blob),
}

impl From<&str> for WebSocketData {
    fn from(text: &str) -> Self {
        WebSocketData::Text(text.to_string())
    }
}

impl From<String> for WebSocketData {
    fn from(text: String) -> Self {
        WebSocketData::Text(text)
    }
}

impl From<Bytes> for WebSocketData {
    fn from(bytes: Bytes) -> Self {
        WebSocketData::Binary(bytes)
    }
}

impl From<Vec<u8>> for WebSocketData {
    fn from(bytes: Vec<u8>) -> Self {
        WebSocketData::Binary(Bytes::from(bytes))
    }
}

/// Type alias for the boxed future a blob read resolves through
type BlobReadFuture = Pin<Box<dyn Future<Output = Result<Bytes>> + Send>>;

/// A deferred byte payload, read asynchronously at send time.
pub struct Blob {
    read: BlobReadFuture,
}

impl Blob {
    /// Creates a blob whose bytes are already available.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            read: Box::pin(async move { Ok(bytes) }),
        }
    }

    /// Creates a blob backed by an asynchronous read.
    pub fn from_future<F>(read: F) -> Self
    where
        F: Future<Output = Result<Bytes>> + Send + 'static,
    {
        Self {
            read: Box::pin(read),
        }
    }

    /// Reads the blob's bytes.
    pub async fn bytes(self) -> Result<Bytes> {
        self.read.await
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob").finish_non_exhaustive()
    }
}

/// A message event delivered to a connection listener.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub data: WireMessage,
}

/// A close event delivered to a connection listener. Code and reason
/// are carried exactly as the transport reported them.
#[derive(Debug, Clone)]
pub struct CloseEvent {
    pub code: Option<u16>,
    pub reason: Option<String>,
}

/// Event delivered to a connection listener.
#[derive(Debug, Clone)]
pub enum WebSocketEvent {
    Message(MessageEvent),
    Close(CloseEvent),
}

/// Event kinds a connection listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebSocketEventType {
    Message,
    Close,
}

/// Listener registration options.
///
/// `once` is accepted for contract compatibility but not supported by
/// the underlying route transport; requesting it logs a warning and
/// the listener stays registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
    pub once: bool,
}

/// Listener invoked with connection events
pub type EventListener = Arc<dyn Fn(WebSocketEvent) + Send + Sync>;

/// The mock engine's view of the browser-side endpoint of a mocked
/// WebSocket.
///
/// Always live: every operation delegates straight to the route.
pub trait WebSocketClientConnectionProtocol: Send + Sync {
    /// Unique identifier of this connection, minted at construction.
    /// Used for observability only; it is independent of the route's
    /// own identity.
    fn id(&self) -> Uuid;

    /// URL the browser connected to.
    fn url(&self) -> &Url;

    /// Sends data to the browser-side socket.
    ///
    /// Blob payloads are read asynchronously before sending. Such a
    /// send completes in the background and carries no ordering
    /// guarantee relative to other sends issued while the read is
    /// pending.
    fn send(&self, data: WebSocketData);

    /// Closes the browser-side socket. An omitted code defaults
    /// to 1000.
    fn close(&self, code: Option<u16>, reason: Option<String>);

    /// Subscribes to message or close events from the browser side.
    fn add_event_listener(
        &self,
        event: WebSocketEventType,
        listener: EventListener,
        options: ListenerOptions,
    );

    /// Not supported by the route transport; logs a warning and
    /// returns.
    fn remove_event_listener(&self, event: WebSocketEventType);
}

/// The mock engine's view of the actual upstream endpoint of a mocked
/// WebSocket.
///
/// Lazily established: until `connect()` is called there is no live
/// binding, and `send`/`add_event_listener` calls are queued. See
/// [`RouteServerConnection`] for the buffering contract.
pub trait WebSocketServerConnectionProtocol: Send + Sync {
    /// Establishes the connection to the actual server, then replays
    /// buffered listener registrations and buffered outbound data, in
    /// original order, exactly once.
    fn connect(&self) -> Result<()>;

    /// Sends data to the actual server, or queues it until
    /// `connect()`.
    fn send(&self, data: WebSocketData);

    /// Closes the connection to the actual server. Code and reason
    /// pass through unmodified.
    ///
    /// # Errors
    ///
    /// [`crate::Error::NotConnected`] if `connect()` was never called:
    /// a precondition violation, not a network condition.
    fn close(&self, code: Option<u16>, reason: Option<String>) -> Result<()>;

    /// Subscribes to message or close events from the actual server,
    /// or queues the registration until `connect()`.
    fn add_event_listener(
        &self,
        event: WebSocketEventType,
        listener: EventListener,
        options: ListenerOptions,
    );

    /// Not supported by the route transport; logs a warning and
    /// returns.
    fn remove_event_listener(&self, event: WebSocketEventType);
}

/// Installs a connection listener on a live route, wrapping the
/// route's native callbacks into neutral events.
pub(crate) fn attach_route_listener(
    ws: &Arc<dyn WebSocketRoute>,
    event: WebSocketEventType,
    listener: EventListener,
    options: ListenerOptions,
) {
    if options.once {
        tracing::warn!(
            "WebSocketRoute does not support `once` listeners; the listener stays registered"
        );
    }

    match event {
        WebSocketEventType::Message => {
            ws.on_message(Box::new(move |message| {
                listener(WebSocketEvent::Message(MessageEvent { data: message }));
            }));
        }
        WebSocketEventType::Close => {
            ws.on_close(Box::new(move |code, reason| {
                listener(WebSocketEvent::Close(CloseEvent { code, reason }));
            }));
        }
    }
}

/// Normalizes a payload and sends it over a live route.
///
/// Text and bytes go out directly. Blob reads are asynchronous, so the
/// send is spawned and completes in the background; a failed read
/// drops the message with a warning.
pub(crate) fn send_route_data(ws: &Arc<dyn WebSocketRoute>, data: WebSocketData) {
    match data {
        WebSocketData::Text(text) => ws.send(WireMessage::Text(text)),
        WebSocketData::Binary(bytes) => ws.send(WireMessage::Binary(bytes)),
        WebSocketData::Blob(blob) => {
            let ws = Arc::clone(ws);
            tokio::spawn(async move {
                match blob.bytes().await {
                    Ok(bytes) => ws.send(WireMessage::Binary(bytes)),
                    Err(error) => {
                        tracing::warn!("Dropping WebSocket message, blob read failed: {error}");
                    }
                }
            });
        }
    }
}
