// Client-side connection adapter
//
// The browser-side endpoint as the mock engine sees it. Maps directly
// onto the live WebSocket route, so no buffering is involved.

use crate::error::Result;
use crate::routing::WebSocketRoute;
use crate::ws::{
    EventListener, ListenerOptions, WebSocketClientConnectionProtocol, WebSocketData,
    WebSocketEventType, attach_route_listener, send_route_data,
};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Normal-closure close code, applied when the caller omits one.
const DEFAULT_CLOSE_CODE: u16 = 1000;

/// [`WebSocketClientConnectionProtocol`] implementation over a
/// framework WebSocket route.
pub struct RouteClientConnection {
    id: Uuid,
    url: Url,
    ws: Arc<dyn WebSocketRoute>,
}

impl RouteClientConnection {
    /// Wraps a route in a client connection.
    ///
    /// # Errors
    ///
    /// Fails when the route reports a URL that does not parse.
    pub fn new(ws: Arc<dyn WebSocketRoute>) -> Result<Self> {
        let url = Url::parse(&ws.url())?;

        Ok(Self {
            id: Uuid::new_v4(),
            url,
            ws,
        })
    }
}

impl WebSocketClientConnectionProtocol for RouteClientConnection {
    fn id(&self) -> Uuid {
        self.id
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn send(&self, data: WebSocketData) {
        send_route_data(&self.ws, data);
    }

    fn close(&self, code: Option<u16>, reason: Option<String>) {
        self.ws.close(Some(code.unwrap_or(DEFAULT_CLOSE_CODE)), reason);
    }

    fn add_event_listener(
        &self,
        event: WebSocketEventType,
        listener: EventListener,
        options: ListenerOptions,
    ) {
        attach_route_listener(&self.ws, event, listener, options);
    }

    fn remove_event_listener(&self, _event: WebSocketEventType) {
        tracing::warn!("WebSocketRoute does not support removing event listeners");
    }
}

impl std::fmt::Debug for RouteClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteClientConnection")
            .field("id", &self.id)
            .field("url", &self.url.as_str())
            .finish()
    }
}
