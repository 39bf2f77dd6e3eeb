// Server-side connection adapter
//
// The real upstream endpoint as the mock engine sees it. The upstream
// connection does not exist until a handler decides to `connect()`,
// but the engine's contract requires `send` and `add_event_listener`
// to be available the whole time. Until the binding exists both are
// queued; `connect()` replays the queues exactly once.

use crate::error::{Error, Result};
use crate::routing::WebSocketRoute;
use crate::ws::{
    EventListener, ListenerOptions, WebSocketData, WebSocketEventType,
    WebSocketServerConnectionProtocol, attach_route_listener, send_route_data,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// A listener registration recorded verbatim for replay.
struct BufferedListener {
    event: WebSocketEventType,
    listener: EventListener,
    options: ListenerOptions,
}

/// Connection state. The buffers live inside the variant so the
/// transition to `Connected` and the hand-off of everything buffered
/// is one atomic operation.
enum ServerState {
    /// No live upstream binding; sends and listener registrations are
    /// queued in call order.
    Unconnected {
        buffered_listeners: Vec<BufferedListener>,
        buffered_data: Vec<WebSocketData>,
    },
    /// Live binding established; operations pass through.
    Connected { server: Arc<dyn WebSocketRoute> },
}

/// [`WebSocketServerConnectionProtocol`] implementation over a
/// framework WebSocket route.
///
/// Buffering contract: every `send` and `add_event_listener` issued
/// before `connect()` is queued, never dropped, and replayed in FIFO
/// order exactly once when the binding is established. Each buffer
/// replays fully before the next starts (all listener registrations
/// first, then all data), so handlers observe responses to their own
/// buffered sends. Ordering between a registration and a send
/// interleaved before `connect()` is not preserved beyond that.
pub struct RouteServerConnection {
    ws: Arc<dyn WebSocketRoute>,
    state: Mutex<ServerState>,
}

impl RouteServerConnection {
    /// Wraps a route in an unconnected server connection.
    pub fn new(ws: Arc<dyn WebSocketRoute>) -> Self {
        Self {
            ws,
            state: Mutex::new(ServerState::Unconnected {
                buffered_listeners: Vec::new(),
                buffered_data: Vec::new(),
            }),
        }
    }
}

impl WebSocketServerConnectionProtocol for RouteServerConnection {
    fn connect(&self) -> Result<()> {
        let (listeners, data, server) = {
            let mut state = self.state.lock();

            match &mut *state {
                ServerState::Connected { .. } => return Err(Error::AlreadyConnected),
                ServerState::Unconnected {
                    buffered_listeners,
                    buffered_data,
                } => {
                    let listeners = std::mem::take(buffered_listeners);
                    let data = std::mem::take(buffered_data);
                    let server = self.ws.connect_to_server();
                    *state = ServerState::Connected {
                        server: Arc::clone(&server),
                    };
                    (listeners, data, server)
                }
            }
        };

        // The route does not buffer, so listeners registered before
        // connect() must be installed before any queued data goes out.
        for BufferedListener {
            event,
            listener,
            options,
        } in listeners
        {
            attach_route_listener(&server, event, listener, options);
        }

        for payload in data {
            send_route_data(&server, payload);
        }

        Ok(())
    }

    fn send(&self, data: WebSocketData) {
        let server = {
            let mut state = self.state.lock();

            match &mut *state {
                ServerState::Unconnected { buffered_data, .. } => {
                    buffered_data.push(data);
                    return;
                }
                ServerState::Connected { server } => Arc::clone(server),
            }
        };

        send_route_data(&server, data);
    }

    fn close(&self, code: Option<u16>, reason: Option<String>) -> Result<()> {
        let server = {
            let state = self.state.lock();

            match &*state {
                ServerState::Unconnected { .. } => return Err(Error::NotConnected),
                ServerState::Connected { server } => Arc::clone(server),
            }
        };

        // No close-code defaulting on this side; the arguments pass
        // through exactly as given.
        server.close(code, reason);
        Ok(())
    }

    fn add_event_listener(
        &self,
        event: WebSocketEventType,
        listener: EventListener,
        options: ListenerOptions,
    ) {
        let server = {
            let mut state = self.state.lock();

            match &mut *state {
                ServerState::Unconnected {
                    buffered_listeners, ..
                } => {
                    buffered_listeners.push(BufferedListener {
                        event,
                        listener,
                        options,
                    });
                    return;
                }
                ServerState::Connected { server } => Arc::clone(server),
            }
        };

        attach_route_listener(&server, event, listener, options);
    }

    fn remove_event_listener(&self, _event: WebSocketEventType) {
        tracing::warn!("WebSocketRoute does not support removing event listeners");
    }
}

impl std::fmt::Debug for RouteServerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        let connected = matches!(&*state, ServerState::Connected { .. });

        f.debug_struct("RouteServerConnection")
            .field("url", &self.ws.url())
            .field("connected", &connected)
            .finish()
    }
}
