// Error types for playwright-netmock

use thiserror::Error;

/// Result type alias for playwright-netmock operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when bridging routed traffic to a mock engine
#[derive(Debug, Error)]
pub enum Error {
    /// Server connection was used before `connect()`
    ///
    /// Closing the upstream half of a mocked WebSocket requires the
    /// connection to be established first. This signals a bug in the
    /// calling handler, not a network condition.
    #[error(
        "Failed to close connection to the actual WebSocket server: \
        connection not established. Did you forget to call `connect()`?"
    )]
    NotConnected,

    /// `connect()` was called on an already-connected server connection
    #[error("Connection to the actual WebSocket server is already established")]
    AlreadyConnected,

    /// The automation framework rejected a route operation
    #[error("Route error: {0}")]
    RouteError(String),

    /// A value could not be carried across the framework/engine boundary
    ///
    /// Raised for malformed header values, unreadable bodies, and
    /// similar marshalling failures. These fail the in-flight request;
    /// there is no retry.
    #[error("Translation error: {0}")]
    TranslationError(String),

    /// A request matched no handler and the configured strategy is `Error`
    #[error("Unhandled {method} request to {url}")]
    UnhandledRequest { method: String, url: String },

    /// Reading a deferred (blob) payload failed
    #[error("Failed to read blob payload: {0}")]
    BlobRead(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization error (mocked response bodies)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error with additional context
    #[error("{0}: {1}")]
    Context(String, #[source] Box<Error>),
}

impl Error {
    /// Adds context to the error
    pub fn context(self, msg: impl Into<String>) -> Self {
        Error::Context(msg.into(), Box::new(self))
    }
}
