// Automation-framework route handles
//
// The fixture never talks to a concrete automation framework directly.
// Everything it needs from one is captured by the traits in this
// module: per-context route registration keyed by pattern, an HTTP
// route object with continue/fulfill/abort, and a WebSocket route
// object with send/close/onMessage/onClose/connectToServer. Framework
// bindings implement these; tests substitute fakes.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// URL pattern a route is registered under.
///
/// The framework treats the pattern as the identity of the
/// registration: `unroute` removes exactly the entries registered
/// under an equal pattern. This is what lets the fixture tear down its
/// own catch-all routes without touching routes a test author added.
///
/// The source is a regular expression. [`RoutePattern::matches`] is
/// provided for framework bindings (and fakes) that need to evaluate
/// the pattern against a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern {
    source: String,
}

impl RoutePattern {
    /// Creates a pattern from a regular expression source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Returns the pattern source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Checks if a URL matches this pattern.
    ///
    /// Invalid pattern sources fall back to exact string comparison.
    pub fn matches(&self, url: &str) -> bool {
        match regex::Regex::new(&self.source) {
            Ok(pattern) => pattern.is_match(url),
            Err(_) => self.source == url,
        }
    }
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// A single frame as the route transport understands it.
///
/// The transport carries exactly text and bytes. Richer payload kinds
/// (see [`crate::WebSocketData`]) are normalized before they reach
/// this type.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    Text(String),
    Binary(Bytes),
}

/// Type alias for boxed route handler future
pub type RouteHandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// HTTP route handler callback
pub type HttpRouteHandler = Arc<dyn Fn(Arc<dyn HttpRoute>) -> RouteHandlerFuture + Send + Sync>;

/// WebSocket route handler callback
pub type WebSocketRouteHandler =
    Arc<dyn Fn(Arc<dyn WebSocketRoute>) -> RouteHandlerFuture + Send + Sync>;

/// Message listener installed on a WebSocket route
pub type WireMessageListener = Box<dyn Fn(WireMessage) + Send + Sync>;

/// Close listener installed on a WebSocket route, invoked with the
/// close code and reason as reported by the transport
pub type CloseListener = Box<dyn Fn(Option<u16>, Option<String>) + Send + Sync>;

/// Response payload for fulfilling an intercepted HTTP request.
#[derive(Debug, Clone, Default)]
pub struct FulfillPayload {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as bytes
    pub body: Option<Bytes>,
}

/// An intercepted HTTP request/route, as exposed by the automation
/// framework.
///
/// Exactly one of `continue_request`, `fulfill`, or `abort` is
/// expected to be called per route.
#[async_trait]
pub trait HttpRoute: Send + Sync {
    /// URL of the intercepted request.
    fn url(&self) -> String;

    /// HTTP method of the intercepted request.
    fn method(&self) -> String;

    /// All request headers, including ones added by the browser.
    async fn all_headers(&self) -> Result<HashMap<String, String>>;

    /// Request body bytes, if the request has a body.
    fn post_data(&self) -> Option<Bytes>;

    /// Lets the request proceed to the real network unmodified.
    async fn continue_request(&self) -> Result<()>;

    /// Fulfills the request with a mocked response.
    async fn fulfill(&self, response: FulfillPayload) -> Result<()>;

    /// Aborts the request, simulating a network failure.
    async fn abort(&self) -> Result<()>;
}

/// An intercepted WebSocket upgrade, as exposed by the automation
/// framework.
///
/// The handle stands in for the browser-side endpoint: `send` pushes a
/// frame into the page, `on_message` observes frames the page sends
/// out. `connect_to_server` lazily opens the connection to the real
/// upstream server and returns a second handle representing it.
///
/// Calls are fire-and-forget; the framework queues the work on its own
/// event loop. Listener registration is additive only; the transport
/// has no listener-removal call.
pub trait WebSocketRoute: Send + Sync {
    /// URL of the intercepted WebSocket upgrade.
    fn url(&self) -> String;

    /// Sends a frame to this endpoint.
    fn send(&self, message: WireMessage);

    /// Closes this endpoint.
    fn close(&self, code: Option<u16>, reason: Option<String>);

    /// Registers a listener for incoming frames.
    fn on_message(&self, listener: WireMessageListener);

    /// Registers a listener for the close event.
    fn on_close(&self, listener: CloseListener);

    /// Opens the connection to the actual upstream server and returns
    /// the handle representing it.
    fn connect_to_server(&self) -> Arc<dyn WebSocketRoute>;
}

/// A page within the browser context, used only to resolve the
/// current URL as request-resolution context.
pub trait PageHandle: Send + Sync {
    /// Current URL of the page.
    fn url(&self) -> String;
}

/// A browser context: the scope route registrations live in.
#[async_trait]
pub trait BrowserContextHandle: Send + Sync {
    /// Registers an HTTP interception route under the given pattern.
    async fn route(&self, pattern: RoutePattern, handler: HttpRouteHandler) -> Result<()>;

    /// Removes HTTP routes registered under an equal pattern.
    async fn unroute(&self, pattern: &RoutePattern) -> Result<()>;

    /// Registers a WebSocket interception route under the given pattern.
    async fn route_web_socket(
        &self,
        pattern: RoutePattern,
        handler: WebSocketRouteHandler,
    ) -> Result<()>;

    /// Removes WebSocket routes registered under an equal pattern.
    async fn unroute_web_socket(&self, pattern: &RoutePattern) -> Result<()>;

    /// All open pages in this context, in creation order.
    fn pages(&self) -> Vec<Arc<dyn PageHandle>>;
}
