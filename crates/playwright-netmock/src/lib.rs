//! playwright-netmock: network mocking for Playwright-style browser automation
//!
//! This crate bridges two independently-designed object models: the
//! automation framework's route/interception primitives and a mock
//! engine's handler/connection abstractions. Mocked responses and
//! mocked WebSocket behavior appear transparently inside real browser
//! network calls; the engine keeps full ownership of request matching,
//! handler precedence, and response synthesis.
//!
//! The fixture registers one catch-all HTTP route and one catch-all
//! WebSocket route per browser context. Intercepted requests are
//! rebuilt as neutral [`FetchRequest`] values and resolved through the
//! [`MockEngine`]; intercepted WebSocket upgrades are wrapped in a
//! client/server connection pair and handed to the registered
//! [`WebSocketHandler`]s.
//!
//! # Examples
//!
//! ## Mocking an HTTP endpoint
//!
//! ```ignore
//! use playwright_netmock::{NetworkFixture, NetworkFixtureOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // `context` is the browser context handle, `engine` the mock
//!     // engine; both come from their respective integration crates.
//!     let network = NetworkFixture::new(context, engine, NetworkFixtureOptions::default());
//!     network.start().await?;
//!
//!     // Per-test override: later handlers win on overlapping matches.
//!     network.use_handler(get_resource_handler);
//!
//!     // A real `fetch('/resource')` in the page now resolves against
//!     // the handler set before it can reach the network.
//!
//!     network.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Mocking a WebSocket endpoint
//!
//! ```ignore
//! // Inside a WebSocketHandler's `run`:
//! //
//! // Talk to the browser without any upstream server:
//! connection.client.send("hello world".into());
//!
//! // Or establish the real upstream connection. Everything sent or
//! // subscribed before `connect()` is buffered and replayed in order:
//! connection.server.send("queued until connect".into());
//! connection.server.connect()?;
//! ```

mod assets;
mod error;
mod fixture;
mod handlers;
mod request;
mod routing;
mod ws;

// Re-export error types
pub use error::{Error, Result};

// Re-export the fixture API
pub use fixture::{INTERNAL_MATCH_ALL_PATTERN, NetworkFixture, NetworkFixtureOptions};

// Re-export handler-set and engine-boundary types
pub use handlers::{
    ConnectionInfo, HandlerKind, HandlerRunContext, HandlersController, MockEngine, MockHandler,
    RequestHandler, ResolutionOptions, UnhandledRequestStrategy, WebSocketConnection,
    WebSocketHandler,
};

// Re-export neutral request/response values
pub use request::{FetchRequest, FetchResponse, FetchResponseBuilder, RequestResolution};

// Re-export the automation-framework trait seam
pub use routing::{
    BrowserContextHandle, CloseListener, FulfillPayload, HttpRoute, HttpRouteHandler, PageHandle,
    RouteHandlerFuture, RoutePattern, WebSocketRoute, WebSocketRouteHandler, WireMessage,
    WireMessageListener,
};

// Re-export the WebSocket connection protocol
pub use ws::{
    Blob, CloseEvent, EventListener, ListenerOptions, MessageEvent, RouteClientConnection,
    RouteServerConnection, WebSocketClientConnectionProtocol, WebSocketData, WebSocketEvent,
    WebSocketEventType, WebSocketServerConnectionProtocol,
};
