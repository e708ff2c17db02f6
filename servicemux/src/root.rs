//! The composition facade.
//!
//! [`Root`] ties the pieces together: it owns a [`TransportRegistry`], hands
//! out routers pre-wired to that registry, and resolves clients, servers and
//! proxies through it. One `Root` per process is the usual shape, but
//! nothing prevents several with disjoint registries.

use std::sync::Arc;

use servicemux_core::{Context, MuxError, RequestFuture, Requester};

use crate::{
    registry::{Registration, TransportModule, TransportRegistry},
    route::Endpoint,
    router::{Router, RouterOptions},
    transport::{Client, ClientOptions, OutboundHandler, ServerHandle, ServerOptions},
};

/// Construction options for [`Root`].
#[derive(Debug, Clone, Default)]
pub struct RootOptions {
    /// Default logging setting for routers this root creates.
    pub logging: bool,
    /// Default timing setting for routers this root creates.
    pub timing: bool,
}

/// The facade everything is created through.
#[derive(Debug)]
pub struct Root {
    registry: Arc<TransportRegistry>,
    defaults: RootOptions,
}

impl Root {
    /// A root with an empty registry and defaults off.
    pub fn new() -> Self {
        Root::with_options(RootOptions::default())
    }

    /// A root with the given defaults.
    pub fn with_options(options: RootOptions) -> Self {
        Root {
            registry: TransportRegistry::new(),
            defaults: options,
        }
    }

    /// The transport registry this root resolves against.
    pub fn registry(&self) -> &Arc<TransportRegistry> {
        &self.registry
    }

    /// Register a transport module.
    pub fn register(&self, module: TransportModule) -> Registration {
        self.registry.register(module)
    }

    /// A fresh router inheriting this root's defaults, wired to the
    /// registry so `Router::proxy` resolves.
    pub fn router(&self) -> Router {
        self.router_with(RouterOptions::default())
    }

    /// A fresh router with explicit options. The root's logging/timing
    /// defaults apply unless the options turn them on themselves.
    pub fn router_with(&self, options: RouterOptions) -> Router {
        let mut router = Router::with_options(RouterOptions {
            name: options.name,
            logging: options.logging || self.defaults.logging,
            timing: options.timing || self.defaults.timing,
        });
        router.set_registry(Arc::clone(&self.registry));
        router
    }

    /// Resolve and connect a client.
    pub async fn client(&self, options: impl Into<ClientOptions>) -> Result<Client, MuxError> {
        self.registry.client(options).await
    }

    /// Resolve a server transport and start serving `app`.
    pub async fn server(
        &self,
        app: impl Into<Arc<Router>>,
        options: impl Into<ServerOptions>,
    ) -> Result<Box<dyn ServerHandle>, MuxError> {
        self.registry.server(app, options).await
    }

    /// A standalone reverse proxy: a router whose sole route forwards every
    /// call, original URI intact, to the remote service.
    pub async fn proxy(&self, options: impl Into<ClientOptions>) -> Result<Proxy, MuxError> {
        let client = self.registry.client(options).await?;
        let mut router = self.router();
        router.mount("/", Endpoint::handler(OutboundHandler::new(client.clone())))?;
        Ok(Proxy { router, client })
    }
}

impl Default for Root {
    fn default() -> Self {
        Root::new()
    }
}

/// A router/client pair forwarding everything to one remote service.
#[derive(Debug)]
pub struct Proxy {
    router: Router,
    client: Client,
}

impl Proxy {
    /// The forwarding router, e.g. to expose through a server.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Give up the pair.
    pub fn into_parts(self) -> (Router, Client) {
        (self.router, self.client)
    }
}

impl Requester for Proxy {
    fn request<'a>(&'a self, ctx: &'a mut Context) -> RequestFuture<'a> {
        Box::pin(self.router.request(ctx))
    }
}
