// Network fixture
//
// The route-registration facade: one catch-all HTTP route and one
// catch-all WebSocket route per browser context, translating between
// the framework's route objects and the mock engine's request/handler
// model. Start/stop lifecycle is explicit; handler state is owned per
// fixture instance so independent test runs never share it.

use crate::assets::is_common_asset_request;
use crate::error::Result;
use crate::handlers::{
    ConnectionInfo, HandlerRunContext, HandlersController, MockEngine, MockHandler,
    ResolutionOptions, UnhandledRequestStrategy, WebSocketConnection, WebSocketHandler,
};
use crate::request::{FetchRequest, RequestResolution};
use crate::routing::{
    BrowserContextHandle, FulfillPayload, HttpRoute, HttpRouteHandler, PageHandle,
    RouteHandlerFuture, RoutePattern, WebSocketRoute, WebSocketRouteHandler,
};
use crate::ws::{RouteClientConnection, RouteServerConnection};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Pattern source the fixture registers its catch-all routes under.
///
/// The framework treats the pattern as the identity of the
/// registration, so the source doubles as the fixture's claim check:
/// it matches every URL (the marker group is optional), yet no test
/// author would register under it, which lets `stop()` remove exactly
/// the fixture's own entries without carrying handler references
/// around.
pub const INTERNAL_MATCH_ALL_PATTERN: &str = ".+(__PLAYWRIGHT_NETMOCK_PREDICATE__)?";

/// Configuration for a [`NetworkFixture`].
#[derive(Clone)]
pub struct NetworkFixtureOptions {
    /// Handlers active from the start of the run.
    pub initial_handlers: Vec<MockHandler>,
    /// Policy for requests no handler matches.
    pub on_unhandled_request: UnhandledRequestStrategy,
    /// Continue well-known static-asset requests without consulting
    /// the engine. Defaults to `true`.
    pub skip_asset_requests: bool,
}

impl Default for NetworkFixtureOptions {
    fn default() -> Self {
        Self {
            initial_handlers: Vec::new(),
            on_unhandled_request: UnhandledRequestStrategy::default(),
            skip_asset_requests: true,
        }
    }
}

/// Controls the network for one browser context.
///
/// Registers interception routes on [`start`], resolves intercepted
/// traffic through the mock engine, and restores the context's prior
/// routing state on [`stop`]. Routes registered by the test author
/// outside the fixture are never touched.
///
/// # Example
///
/// ```ignore
/// use playwright_netmock::{NetworkFixture, NetworkFixtureOptions};
///
/// let network = NetworkFixture::new(context, engine, NetworkFixtureOptions::default());
/// network.start().await?;
/// network.use_handler(my_override_handler);
/// // ... drive the page ...
/// network.stop().await?;
/// ```
///
/// [`start`]: NetworkFixture::start
/// [`stop`]: NetworkFixture::stop
pub struct NetworkFixture {
    context: Arc<dyn BrowserContextHandle>,
    engine: Arc<dyn MockEngine>,
    handlers: Arc<HandlersController>,
    on_unhandled_request: UnhandledRequestStrategy,
    skip_asset_requests: bool,
}

impl NetworkFixture {
    /// Creates a fixture for the given context and engine.
    pub fn new(
        context: Arc<dyn BrowserContextHandle>,
        engine: Arc<dyn MockEngine>,
        options: NetworkFixtureOptions,
    ) -> Self {
        Self {
            context,
            engine,
            handlers: Arc::new(HandlersController::new(options.initial_handlers)),
            on_unhandled_request: options.on_unhandled_request,
            skip_asset_requests: options.skip_asset_requests,
        }
    }

    /// Appends override handlers. Later handlers take precedence over
    /// earlier ones on conflicting matches. The batch becomes visible
    /// atomically.
    pub fn use_handlers(&self, handlers: impl IntoIterator<Item = MockHandler>) {
        self.handlers.use_handlers(handlers);
    }

    /// Appends a single override handler.
    pub fn use_handler(&self, handler: MockHandler) {
        self.handlers.use_handlers([handler]);
    }

    /// Restores the initial handler set, discarding overrides.
    pub fn reset_handlers(&self) {
        self.handlers.reset();
    }

    /// The fixture's handler set.
    pub fn handlers(&self) -> &Arc<HandlersController> {
        &self.handlers
    }

    /// Registers the fixture's catch-all HTTP and WebSocket routes on
    /// the context.
    pub async fn start(&self) -> Result<()> {
        let pattern = RoutePattern::new(INTERNAL_MATCH_ALL_PATTERN);

        let engine = Arc::clone(&self.engine);
        let handlers = Arc::clone(&self.handlers);
        let strategy = self.on_unhandled_request.clone();
        let skip_asset_requests = self.skip_asset_requests;
        let http_handler: HttpRouteHandler = Arc::new(move |route| -> RouteHandlerFuture {
            let engine = Arc::clone(&engine);
            let handlers = Arc::clone(&handlers);
            let strategy = strategy.clone();
            Box::pin(async move {
                handle_http_route(route, engine, handlers, strategy, skip_asset_requests).await
            })
        });
        self.context.route(pattern.clone(), http_handler).await?;

        let handlers = Arc::clone(&self.handlers);
        let context = Arc::clone(&self.context);
        let ws_handler: WebSocketRouteHandler = Arc::new(move |route| -> RouteHandlerFuture {
            let handlers = Arc::clone(&handlers);
            let context = Arc::clone(&context);
            Box::pin(async move { handle_web_socket_route(route, handlers, context).await })
        });
        self.context.route_web_socket(pattern, ws_handler).await?;

        Ok(())
    }

    /// Disposes the handler set and removes the fixture's own routes.
    ///
    /// Routes registered outside the fixture remain untouched. Safe to
    /// call on an already-stopped fixture.
    pub async fn stop(&self) -> Result<()> {
        self.handlers.dispose();

        let pattern = RoutePattern::new(INTERNAL_MATCH_ALL_PATTERN);
        self.context.unroute(&pattern).await?;
        self.context.unroute_web_socket(&pattern).await?;

        Ok(())
    }
}

impl std::fmt::Debug for NetworkFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkFixture")
            .field("handlers", &self.handlers.current_handlers().len())
            .field("on_unhandled_request", &self.on_unhandled_request)
            .field("skip_asset_requests", &self.skip_asset_requests)
            .finish()
    }
}

/// Resolves one intercepted HTTP request through the engine.
async fn handle_http_route(
    route: Arc<dyn HttpRoute>,
    engine: Arc<dyn MockEngine>,
    handlers: Arc<HandlersController>,
    strategy: UnhandledRequestStrategy,
    skip_asset_requests: bool,
) -> Result<()> {
    let url = Url::parse(&route.url())?;

    if skip_asset_requests && is_common_asset_request(&url) {
        return route.continue_request().await;
    }

    let request = FetchRequest {
        method: route.method(),
        url,
        headers: route.all_headers().await?,
        body: route.post_data(),
    };
    let base_url = request.referer_origin()?;

    let resolution = engine
        .handle_request(
            request,
            Uuid::new_v4(),
            handlers.current_http_handlers(),
            ResolutionOptions {
                on_unhandled_request: strategy,
                base_url,
                quiet: true,
            },
        )
        .await?;

    match resolution {
        RequestResolution::Unhandled => route.continue_request().await,
        RequestResolution::NetworkError => route.abort().await,
        RequestResolution::Response(response) => {
            route
                .fulfill(FulfillPayload {
                    status: response.status,
                    headers: response.headers,
                    body: response.body,
                })
                .await
        }
    }
}

/// Hands one intercepted WebSocket upgrade to the WebSocket handlers.
async fn handle_web_socket_route(
    route: Arc<dyn WebSocketRoute>,
    handlers: Arc<HandlersController>,
    context: Arc<dyn BrowserContextHandle>,
) -> Result<()> {
    let ws_handlers = handlers.current_web_socket_handlers();

    if ws_handlers.is_empty() {
        // Nothing to mock; wire the route straight through.
        route.connect_to_server();
        return Ok(());
    }

    let client = Arc::new(RouteClientConnection::new(Arc::clone(&route))?);
    let server = Arc::new(RouteServerConnection::new(route));

    let base_url = context
        .pages()
        .last()
        .and_then(|page| page_origin(page.as_ref()));
    let run_context = HandlerRunContext { base_url };

    for handler in ws_handlers {
        handler
            .run(
                WebSocketConnection {
                    client: client.clone(),
                    server: server.clone(),
                    info: ConnectionInfo::default(),
                },
                &run_context,
            )
            .await?;
    }

    Ok(())
}

/// Origin of a page's current URL, skipping blank pages and opaque
/// origins.
fn page_origin(page: &dyn PageHandle) -> Option<String> {
    let url = page.url();

    if url == "about:blank" {
        return None;
    }

    let origin = Url::parse(&url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
