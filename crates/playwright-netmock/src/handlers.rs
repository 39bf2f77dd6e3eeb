// Mock-engine collaborator traits and the handler-set lifecycle
//
// Handlers are opaque units of matching + response production owned by
// the mock engine. The fixture only needs to know their kind (HTTP vs
// WebSocket), keep them in registration order, and hand them back to
// the engine; matching and precedence stay on the engine's side of
// the boundary.

use crate::error::Result;
use crate::request::{FetchRequest, RequestResolution};
use crate::ws::{WebSocketClientConnectionProtocol, WebSocketServerConnectionProtocol};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

/// An HTTP request handler as defined by the mock engine.
///
/// Opaque to the fixture. `as_any` is the engine's escape hatch for
/// recovering its concrete handler type during resolution.
pub trait RequestHandler: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Context passed to a WebSocket handler's `run`.
#[derive(Debug, Clone, Default)]
pub struct HandlerRunContext {
    /// Origin of the page that opened the connection, when resolvable.
    pub base_url: Option<String>,
}

/// Metadata about an intercepted WebSocket connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionInfo {
    /// Subprotocols requested by the client. The route transport does
    /// not expose them, so this is empty for routed connections.
    pub protocols: Vec<String>,
}

/// The client/server connection pair handed to WebSocket handlers.
#[derive(Clone)]
pub struct WebSocketConnection {
    /// The mocked browser-side endpoint.
    pub client: Arc<dyn WebSocketClientConnectionProtocol>,
    /// The lazily-connected upstream endpoint.
    pub server: Arc<dyn WebSocketServerConnectionProtocol>,
    /// Connection metadata.
    pub info: ConnectionInfo,
}

/// A WebSocket handler as defined by the mock engine.
#[async_trait]
pub trait WebSocketHandler: Send + Sync {
    /// Invokes the handler with a connection pair. The handler decides
    /// whether and when to `connect()` the server side.
    async fn run(
        &self,
        connection: WebSocketConnection,
        context: &HandlerRunContext,
    ) -> Result<()>;
}

/// Handler kind, the only thing the fixture inspects about a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Http,
    WebSocket,
}

/// A handler of either kind, held in registration order.
#[derive(Clone)]
pub enum MockHandler {
    Http(Arc<dyn RequestHandler>),
    WebSocket(Arc<dyn WebSocketHandler>),
}

impl MockHandler {
    /// Returns the handler's kind.
    pub fn kind(&self) -> HandlerKind {
        match self {
            MockHandler::Http(_) => HandlerKind::Http,
            MockHandler::WebSocket(_) => HandlerKind::WebSocket,
        }
    }
}

impl std::fmt::Debug for MockHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MockHandler").field(&self.kind()).finish()
    }
}

/// Policy for requests no handler matches.
#[derive(Clone, Default)]
pub enum UnhandledRequestStrategy {
    /// Let the real network serve the request. The safe default.
    #[default]
    Bypass,
    /// Log a warning, then bypass.
    Warn,
    /// Fail the request.
    Error,
    /// Invoke a callback with the unmatched request, then bypass.
    Custom(Arc<dyn Fn(&FetchRequest) + Send + Sync>),
}

impl std::fmt::Debug for UnhandledRequestStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnhandledRequestStrategy::Bypass => f.write_str("Bypass"),
            UnhandledRequestStrategy::Warn => f.write_str("Warn"),
            UnhandledRequestStrategy::Error => f.write_str("Error"),
            UnhandledRequestStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options forwarded to the engine alongside every resolution call.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOptions {
    /// Policy for unmatched requests.
    pub on_unhandled_request: UnhandledRequestStrategy,
    /// Base URL for resolving relative handler paths.
    pub base_url: Option<String>,
    /// Suppress the engine's own per-request logging.
    pub quiet: bool,
}

/// The mock engine's request-resolution entry point.
///
/// Matching, handler precedence (last-registered wins on overlapping
/// matches), and response synthesis are the engine's contract; the
/// fixture only marshals values across this boundary.
#[async_trait]
pub trait MockEngine: Send + Sync {
    async fn handle_request(
        &self,
        request: FetchRequest,
        request_id: Uuid,
        handlers: Vec<Arc<dyn RequestHandler>>,
        options: ResolutionOptions,
    ) -> Result<RequestResolution>;
}

/// Ordered, mutable handler set owned by one fixture instance.
///
/// Holds the initial handlers supplied at construction plus any
/// override batches appended with [`use_handlers`]. Later entries take
/// precedence on conflicting matches per the engine's resolution rule.
/// Mutations are atomic with respect to reads: a snapshot sees either
/// all of a batch or none of it.
///
/// [`use_handlers`]: HandlersController::use_handlers
pub struct HandlersController {
    initial: Vec<MockHandler>,
    current: Mutex<Vec<MockHandler>>,
}

impl HandlersController {
    /// Creates a controller seeded with the initial handler set.
    pub fn new(initial: Vec<MockHandler>) -> Self {
        Self {
            current: Mutex::new(initial.clone()),
            initial,
        }
    }

    /// Snapshot of the current handlers, in registration order.
    pub fn current_handlers(&self) -> Vec<MockHandler> {
        self.current.lock().clone()
    }

    /// Snapshot of the current HTTP handlers, in registration order.
    pub fn current_http_handlers(&self) -> Vec<Arc<dyn RequestHandler>> {
        self.current
            .lock()
            .iter()
            .filter_map(|handler| match handler {
                MockHandler::Http(handler) => Some(Arc::clone(handler)),
                MockHandler::WebSocket(_) => None,
            })
            .collect()
    }

    /// Snapshot of the current WebSocket handlers, in registration
    /// order.
    pub fn current_web_socket_handlers(&self) -> Vec<Arc<dyn WebSocketHandler>> {
        self.current
            .lock()
            .iter()
            .filter_map(|handler| match handler {
                MockHandler::WebSocket(handler) => Some(Arc::clone(handler)),
                MockHandler::Http(_) => None,
            })
            .collect()
    }

    /// Appends a batch of override handlers in one atomic step.
    pub fn use_handlers(&self, handlers: impl IntoIterator<Item = MockHandler>) {
        self.current.lock().extend(handlers);
    }

    /// Restores the initial handler set, discarding overrides.
    pub fn reset(&self) {
        *self.current.lock() = self.initial.clone();
    }

    /// Clears all handlers, including the initial set. Idempotent.
    pub fn dispose(&self) {
        self.current.lock().clear();
    }
}
