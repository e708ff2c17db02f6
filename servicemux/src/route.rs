//! A single registered route.
//!
//! A [`Route`] binds a compiled URI template and an optional verb filter to
//! an [`Endpoint`]. Endpoints are resolved at registration time into a
//! tagged variant (plain handler, handler chain, mounted sub-router or
//! remote client), so dispatch never has to probe capabilities per call.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use servicemux_core::{
    Context, DynHandler, Handler, Match, MatchOptions, Matcher, MuxError, Outcome, Verb,
};

use crate::{pattern::Pattern, router::Router, transport::Client};

/// What a route dispatches into, resolved at registration time.
pub enum Endpoint {
    /// A single handler.
    Handler(Arc<dyn DynHandler>),
    /// An ordered handler sequence; the first defined result wins.
    Chain(Vec<Arc<dyn DynHandler>>),
    /// A mounted sub-router, dispatched through its `execute`.
    Router(Arc<Router>),
    /// A mounted remote client, dispatched through its `request`.
    Client(Client),
}

impl Endpoint {
    /// Wrap a single handler.
    pub fn handler<H: Handler>(handler: H) -> Self {
        Endpoint::Handler(Arc::new(handler))
    }

    /// Wrap an ordered handler sequence.
    pub fn chain(handlers: Vec<Arc<dyn DynHandler>>) -> Self {
        Endpoint::Chain(handlers)
    }

    /// Whether dispatch into this endpoint crosses a mount boundary and
    /// needs URI rewriting.
    pub fn is_mount(&self) -> bool {
        matches!(self, Endpoint::Router(_) | Endpoint::Client(_))
    }
}

impl From<Router> for Endpoint {
    fn from(router: Router) -> Self {
        Endpoint::Router(Arc::new(router))
    }
}

impl From<Arc<Router>> for Endpoint {
    fn from(router: Arc<Router>) -> Self {
        Endpoint::Router(router)
    }
}

impl From<Client> for Endpoint {
    fn from(client: Client) -> Self {
        Endpoint::Client(client)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Handler(_) => f.write_str("Handler"),
            Endpoint::Chain(handlers) => write!(f, "Chain({})", handlers.len()),
            Endpoint::Router(router) => write!(f, "Router({} routes)", router.routes().len()),
            Endpoint::Client(_) => f.write_str("Client"),
        }
    }
}

pub(crate) struct RouteConfig {
    pub uri: String,
    pub verb: Option<Verb>,
    pub endpoint: Endpoint,
    pub options: MatchOptions,
    pub logging: bool,
    pub timing: bool,
}

/// One registered URI pattern bound to an endpoint.
pub struct Route {
    uri: String,
    verb: Option<Verb>,
    endpoint: Endpoint,
    matcher: Box<dyn Matcher>,
    options: MatchOptions,
    // Live settings, cascaded from the owning router on change. Atomic so
    // the cascade can reach routes inside an already-shared sub-router.
    logging: AtomicBool,
    timing: AtomicBool,
}

impl Route {
    pub(crate) fn new(config: RouteConfig) -> Result<Self, MuxError> {
        let matcher = Pattern::compile(&config.uri, config.options)?;
        Ok(Route {
            uri: config.uri,
            verb: config.verb,
            endpoint: config.endpoint,
            matcher: Box::new(matcher),
            options: config.options,
            logging: AtomicBool::new(config.logging),
            timing: AtomicBool::new(config.timing),
        })
    }

    pub(crate) fn set_logging(&self, enabled: bool) {
        self.logging.store(enabled, Ordering::Relaxed);
        if let Endpoint::Router(router) = &self.endpoint {
            router.set_logging(enabled);
        }
    }

    pub(crate) fn set_timing(&self, enabled: bool) {
        self.timing.store(enabled, Ordering::Relaxed);
        if let Endpoint::Router(router) = &self.endpoint {
            router.set_timing(enabled);
        }
    }

    /// The URI template this route was registered with.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The verb filter, if any.
    pub fn verb(&self) -> Option<Verb> {
        self.verb
    }

    /// The endpoint this route dispatches into.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The matching options the template was compiled with.
    pub fn match_options(&self) -> MatchOptions {
        self.options
    }

    /// Whether this route mounts a sub-router or remote client.
    pub fn is_mount(&self) -> bool {
        self.endpoint.is_mount()
    }

    /// Match the route against the current context. The verb filter applies
    /// first, independent of the URI.
    pub(crate) fn matches(&self, ctx: &Context) -> Option<Match> {
        if let Some(required) = self.verb
            && ctx.verb != Some(required)
        {
            return None;
        }
        self.matcher.matches(&ctx.uri)
    }

    pub(crate) async fn dispatch(&self, ctx: &mut Context) -> Result<Outcome, MuxError> {
        let logging = self.logging.load(Ordering::Relaxed);
        let timing = self.timing.load(Ordering::Relaxed);
        let started = (logging && timing).then(Instant::now);
        if logging {
            tracing::debug!(route = %self.uri, uri = %ctx.uri, verb = ?ctx.verb, "route dispatch");
        }

        let outcome = match &self.endpoint {
            Endpoint::Handler(handler) => {
                handler.call_dyn(ctx).await.map_err(MuxError::Handler)?
            }
            Endpoint::Chain(handlers) => {
                let mut outcome = Outcome::Pass;
                for handler in handlers {
                    match handler.call_dyn(ctx).await.map_err(MuxError::Handler)? {
                        Outcome::Pass => {}
                        handled => {
                            outcome = handled;
                            break;
                        }
                    }
                }
                outcome
            }
            Endpoint::Router(router) => router.execute(ctx).await?.into(),
            Endpoint::Client(client) => client.request(ctx).await?.into(),
        };

        if let Some(t) = started {
            tracing::debug!(
                route = %self.uri,
                elapsed_ms = t.elapsed().as_millis() as u64,
                "route complete"
            );
        }
        Ok(outcome)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("uri", &self.uri)
            .field("verb", &self.verb)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
