// Shared fakes for the collaborator traits
//
// The fixture is designed to be exercised against stand-ins for both
// external object models: fake framework handles (context, HTTP route,
// WebSocket route) that record every call, and a fake mock engine that
// resolves handlers last-registered-wins the way the real engine does.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use playwright_netmock::{
    BrowserContextHandle, CloseListener, Error, FetchRequest, FulfillPayload, HandlerRunContext,
    HttpRoute, HttpRouteHandler, MockEngine, MockHandler, PageHandle, RequestHandler,
    RequestResolution, ResolutionOptions, Result, RoutePattern, UnhandledRequestStrategy,
    WebSocketConnection, WebSocketHandler, WebSocketRoute, WebSocketRouteHandler, WireMessage,
    WireMessageListener,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Installs a fmt subscriber so degradation warnings are visible when
/// tests run with RUST_LOG set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

// ---------------------------------------------------------------------------
// WebSocket route fake
// ---------------------------------------------------------------------------

#[derive(Default)]
struct WebSocketRouteState {
    sent: Vec<WireMessage>,
    closes: Vec<(Option<u16>, Option<String>)>,
    message_listeners: Vec<WireMessageListener>,
    close_listeners: Vec<CloseListener>,
    server: Option<Arc<FakeWebSocketRoute>>,
    connect_calls: usize,
    call_log: Vec<String>,
}

/// Recording stand-in for the framework's WebSocket route object.
///
/// `connect_to_server` lazily creates a second fake route representing
/// the upstream side, mirroring the real transport.
pub struct FakeWebSocketRoute {
    url: String,
    state: Mutex<WebSocketRouteState>,
}

impl FakeWebSocketRoute {
    pub fn new(url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            url: url.into(),
            state: Mutex::new(WebSocketRouteState::default()),
        })
    }

    pub fn sent(&self) -> Vec<WireMessage> {
        self.state.lock().sent.clone()
    }

    pub fn closes(&self) -> Vec<(Option<u16>, Option<String>)> {
        self.state.lock().closes.clone()
    }

    pub fn message_listener_count(&self) -> usize {
        self.state.lock().message_listeners.len()
    }

    pub fn close_listener_count(&self) -> usize {
        self.state.lock().close_listeners.len()
    }

    pub fn connect_calls(&self) -> usize {
        self.state.lock().connect_calls
    }

    /// The upstream route created by `connect_to_server`, if any.
    pub fn server(&self) -> Option<Arc<FakeWebSocketRoute>> {
        self.state.lock().server.clone()
    }

    /// Order of listener installations and sends, for replay-order
    /// assertions.
    pub fn call_log(&self) -> Vec<String> {
        self.state.lock().call_log.clone()
    }

    /// Simulates an incoming frame from this endpoint.
    pub fn emit_message(&self, message: WireMessage) {
        let state = self.state.lock();
        for listener in &state.message_listeners {
            listener(message.clone());
        }
    }

    /// Simulates this endpoint closing.
    pub fn emit_close(&self, code: Option<u16>, reason: Option<String>) {
        let state = self.state.lock();
        for listener in &state.close_listeners {
            listener(code, reason.clone());
        }
    }
}

impl WebSocketRoute for FakeWebSocketRoute {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn send(&self, message: WireMessage) {
        let mut state = self.state.lock();
        let entry = match &message {
            WireMessage::Text(text) => format!("send:{text}"),
            WireMessage::Binary(_) => "send:<binary>".to_string(),
        };
        state.call_log.push(entry);
        state.sent.push(message);
    }

    fn close(&self, code: Option<u16>, reason: Option<String>) {
        let mut state = self.state.lock();
        state.call_log.push(format!("close:{code:?}"));
        state.closes.push((code, reason));
    }

    fn on_message(&self, listener: WireMessageListener) {
        let mut state = self.state.lock();
        state.call_log.push("on_message".to_string());
        state.message_listeners.push(listener);
    }

    fn on_close(&self, listener: CloseListener) {
        let mut state = self.state.lock();
        state.call_log.push("on_close".to_string());
        state.close_listeners.push(listener);
    }

    fn connect_to_server(&self) -> Arc<dyn WebSocketRoute> {
        let mut state = self.state.lock();
        state.connect_calls += 1;
        let server = state
            .server
            .get_or_insert_with(|| FakeWebSocketRoute::new(format!("{}#server", self.url)))
            .clone();
        server
    }
}

// ---------------------------------------------------------------------------
// HTTP route fake
// ---------------------------------------------------------------------------

/// Terminal call recorded on a fake HTTP route.
#[derive(Debug, Clone)]
pub enum RouteOutcome {
    Continued,
    Aborted,
    Fulfilled(FulfillPayload),
}

/// Recording stand-in for the framework's HTTP route object.
pub struct FakeHttpRoute {
    url: String,
    method: String,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    outcomes: Mutex<Vec<RouteOutcome>>,
}

impl FakeHttpRoute {
    pub fn get(url: &str) -> Arc<Self> {
        Self::request("GET", url, &[], None)
    }

    pub fn request(
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> Arc<Self> {
        Arc::new(Self {
            url: url.to_string(),
            method: method.to_string(),
            headers: headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            body: body.map(Bytes::copy_from_slice),
            outcomes: Mutex::new(Vec::new()),
        })
    }

    pub fn outcomes(&self) -> Vec<RouteOutcome> {
        self.outcomes.lock().clone()
    }
}

#[async_trait]
impl HttpRoute for FakeHttpRoute {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn method(&self) -> String {
        self.method.clone()
    }

    async fn all_headers(&self) -> Result<HashMap<String, String>> {
        Ok(self.headers.clone())
    }

    fn post_data(&self) -> Option<Bytes> {
        self.body.clone()
    }

    async fn continue_request(&self) -> Result<()> {
        self.outcomes.lock().push(RouteOutcome::Continued);
        Ok(())
    }

    async fn fulfill(&self, response: FulfillPayload) -> Result<()> {
        self.outcomes.lock().push(RouteOutcome::Fulfilled(response));
        Ok(())
    }

    async fn abort(&self) -> Result<()> {
        self.outcomes.lock().push(RouteOutcome::Aborted);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Browser context fake
// ---------------------------------------------------------------------------

pub struct FakePage {
    url: String,
}

impl PageHandle for FakePage {
    fn url(&self) -> String {
        self.url.clone()
    }
}

/// Recording stand-in for the framework's browser context.
///
/// Routes are kept in registration order; dispatch picks the last
/// matching registration, matching the framework's own resolution.
#[derive(Default)]
pub struct FakeBrowserContext {
    http_routes: Mutex<Vec<(RoutePattern, HttpRouteHandler)>>,
    ws_routes: Mutex<Vec<(RoutePattern, WebSocketRouteHandler)>>,
    pages: Mutex<Vec<Arc<dyn PageHandle>>>,
}

impl FakeBrowserContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn open_page(&self, url: &str) {
        self.pages.lock().push(Arc::new(FakePage {
            url: url.to_string(),
        }));
    }

    pub fn http_route_patterns(&self) -> Vec<RoutePattern> {
        self.http_routes
            .lock()
            .iter()
            .map(|(pattern, _)| pattern.clone())
            .collect()
    }

    pub fn ws_route_patterns(&self) -> Vec<RoutePattern> {
        self.ws_routes
            .lock()
            .iter()
            .map(|(pattern, _)| pattern.clone())
            .collect()
    }

    /// Dispatches an intercepted request to the last matching HTTP
    /// route registration.
    pub async fn dispatch_http(&self, route: Arc<dyn HttpRoute>) -> Result<()> {
        let handler = {
            let routes = self.http_routes.lock();
            routes
                .iter()
                .rev()
                .find(|(pattern, _)| pattern.matches(&route.url()))
                .map(|(_, handler)| Arc::clone(handler))
        };

        match handler {
            Some(handler) => handler(route).await,
            None => Ok(()),
        }
    }

    /// Dispatches an intercepted upgrade to the last matching
    /// WebSocket route registration.
    pub async fn dispatch_web_socket(&self, route: Arc<dyn WebSocketRoute>) -> Result<()> {
        let handler = {
            let routes = self.ws_routes.lock();
            routes
                .iter()
                .rev()
                .find(|(pattern, _)| pattern.matches(&route.url()))
                .map(|(_, handler)| Arc::clone(handler))
        };

        match handler {
            Some(handler) => handler(route).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BrowserContextHandle for FakeBrowserContext {
    async fn route(&self, pattern: RoutePattern, handler: HttpRouteHandler) -> Result<()> {
        self.http_routes.lock().push((pattern, handler));
        Ok(())
    }

    async fn unroute(&self, pattern: &RoutePattern) -> Result<()> {
        self.http_routes
            .lock()
            .retain(|(registered, _)| registered != pattern);
        Ok(())
    }

    async fn route_web_socket(
        &self,
        pattern: RoutePattern,
        handler: WebSocketRouteHandler,
    ) -> Result<()> {
        self.ws_routes.lock().push((pattern, handler));
        Ok(())
    }

    async fn unroute_web_socket(&self, pattern: &RoutePattern) -> Result<()> {
        self.ws_routes
            .lock()
            .retain(|(registered, _)| registered != pattern);
        Ok(())
    }

    fn pages(&self) -> Vec<Arc<dyn PageHandle>> {
        self.pages.lock().clone()
    }
}

// ---------------------------------------------------------------------------
// Mock engine fakes
// ---------------------------------------------------------------------------

/// Handler stand-in matching on method and exact path ("*" matches any
/// path).
pub struct TestRequestHandler {
    pub method: String,
    pub path: String,
    pub resolution: RequestResolution,
}

impl TestRequestHandler {
    pub fn get(path: &str, resolution: RequestResolution) -> MockHandler {
        MockHandler::Http(Arc::new(Self {
            method: "GET".to_string(),
            path: path.to_string(),
            resolution,
        }))
    }

    pub fn matches(&self, request: &FetchRequest) -> bool {
        self.method.eq_ignore_ascii_case(&request.method)
            && (self.path == "*" || request.url.path() == self.path)
    }
}

impl RequestHandler for TestRequestHandler {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Engine stand-in resolving handlers last-registered-wins, the
/// precedence rule the real engine applies to overlapping matches.
/// Records every resolution call for bypass/skip assertions.
#[derive(Default)]
pub struct LastWinsEngine {
    requests: Mutex<Vec<FetchRequest>>,
    base_urls: Mutex<Vec<Option<String>>>,
}

impl LastWinsEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn resolved_requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().clone()
    }

    pub fn resolved_base_urls(&self) -> Vec<Option<String>> {
        self.base_urls.lock().clone()
    }
}

#[async_trait]
impl MockEngine for LastWinsEngine {
    async fn handle_request(
        &self,
        request: FetchRequest,
        _request_id: Uuid,
        handlers: Vec<Arc<dyn RequestHandler>>,
        options: ResolutionOptions,
    ) -> Result<RequestResolution> {
        self.requests.lock().push(request.clone());
        self.base_urls.lock().push(options.base_url.clone());

        for handler in handlers.iter().rev() {
            let Some(handler) = handler.as_any().downcast_ref::<TestRequestHandler>() else {
                continue;
            };
            if handler.matches(&request) {
                return Ok(handler.resolution.clone());
            }
        }

        match options.on_unhandled_request {
            UnhandledRequestStrategy::Bypass => Ok(RequestResolution::Unhandled),
            UnhandledRequestStrategy::Warn => {
                tracing::warn!(
                    "intercepted a request without a matching request handler: {} {}",
                    request.method,
                    request.url
                );
                Ok(RequestResolution::Unhandled)
            }
            UnhandledRequestStrategy::Error => Err(Error::UnhandledRequest {
                method: request.method.clone(),
                url: request.url.to_string(),
            }),
            UnhandledRequestStrategy::Custom(callback) => {
                callback(&request);
                Ok(RequestResolution::Unhandled)
            }
        }
    }
}

/// WebSocket handler stand-in delegating to a closure.
pub struct TestWebSocketHandler {
    on_connection: Box<dyn Fn(WebSocketConnection, HandlerRunContext) + Send + Sync>,
}

impl TestWebSocketHandler {
    pub fn new(
        on_connection: impl Fn(WebSocketConnection, HandlerRunContext) + Send + Sync + 'static,
    ) -> MockHandler {
        MockHandler::WebSocket(Arc::new(Self {
            on_connection: Box::new(on_connection),
        }))
    }
}

#[async_trait]
impl WebSocketHandler for TestWebSocketHandler {
    async fn run(
        &self,
        connection: WebSocketConnection,
        context: &HandlerRunContext,
    ) -> Result<()> {
        (self.on_connection)(connection, context.clone());
        Ok(())
    }
}
