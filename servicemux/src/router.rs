//! The routing engine.
//!
//! A [`Router`] owns an ordered list of routes. Dispatch walks that list top
//! to bottom and the first route whose pattern and verb filter accept the
//! call gets it; there is no specificity ranking. A route's handler may
//! decline with `Outcome::Pass`, in which case the walk continues with the
//! next candidate.
//!
//! Routers compose by mounting: a route registered with [`Router::mount`]
//! matches a path prefix and forwards the remainder into a sub-router or
//! remote client, rewriting `uri`/`base_uri` on the way down and restoring
//! them on the way back up. The same [`Context`] instance travels the whole
//! chain.
//!
//! Registration takes `&mut self`, so a router cannot be altered while a
//! dispatch borrows it. Concurrent top-level calls are fine as long as each
//! uses its own `Context`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures::future::BoxFuture;
use serde_json::Value;
use servicemux_core::{
    Context, MatchOptions, MuxError, Notice, Observers, Outcome, RequestFuture, Requester, Topic,
    Verb,
};

use crate::{
    registry::TransportRegistry,
    route::{Endpoint, Route, RouteConfig},
    transport::{ClientOptions, OutboundHandler},
};

/// Construction options for [`Router`].
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// A name surfaced in request logs.
    pub name: Option<String>,
    /// Start with request logging enabled.
    pub logging: bool,
    /// Start with request timing enabled. Only observable while logging is
    /// also on.
    pub timing: bool,
}

/// Per-registration options for [`Router::add_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AddOptions {
    /// Only accept calls carrying this verb.
    pub verb: Option<Verb>,
    /// Compare literal segments case-sensitively.
    pub case_sensitive: bool,
    /// Treat a trailing slash as significant.
    pub strict: bool,
}

/// An ordered, first-match-wins dispatch table.
pub struct Router {
    name: Option<String>,
    routes: Vec<Route>,
    observers: Observers,
    logging: AtomicBool,
    timing: AtomicBool,
    registry: Option<Arc<TransportRegistry>>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Router::with_options(RouterOptions::default())
    }

    /// Create an empty router with the given options.
    pub fn with_options(options: RouterOptions) -> Self {
        Router {
            name: options.name,
            routes: Vec::new(),
            observers: Observers::new(),
            logging: AtomicBool::new(options.logging),
            timing: AtomicBool::new(options.timing),
            registry: None,
        }
    }

    /// The router's name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The registered routes, in dispatch order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Register a leaf route: the template must consume the whole remaining
    /// path.
    pub fn add(&mut self, uri: &str, endpoint: impl Into<Endpoint>) -> Result<(), MuxError> {
        self.add_with(uri, endpoint, AddOptions::default())
    }

    /// Register a leaf route restricted to one verb.
    pub fn add_verb(
        &mut self,
        verb: Verb,
        uri: &str,
        endpoint: impl Into<Endpoint>,
    ) -> Result<(), MuxError> {
        self.add_with(
            uri,
            endpoint,
            AddOptions {
                verb: Some(verb),
                ..AddOptions::default()
            },
        )
    }

    /// Register a leaf route with explicit matching options.
    pub fn add_with(
        &mut self,
        uri: &str,
        endpoint: impl Into<Endpoint>,
        options: AddOptions,
    ) -> Result<(), MuxError> {
        if uri.is_empty() {
            return Err(MuxError::MissingParameter("uri"));
        }
        let match_options = MatchOptions {
            case_sensitive: options.case_sensitive,
            strict: options.strict,
            end: true,
        };
        self.push(uri, options.verb, endpoint.into(), match_options)?;
        self.observers.emit(&Notice::Add {
            uri,
            verb: options.verb,
        });
        Ok(())
    }

    /// Mount a sub-router, client or middleware handler under a path prefix.
    ///
    /// Mounts match a prefix at a segment boundary and never care about a
    /// trailing slash. An empty `uri` mounts at `/`, which consumes nothing
    /// and sees every call.
    pub fn mount(&mut self, uri: &str, endpoint: impl Into<Endpoint>) -> Result<(), MuxError> {
        self.mount_with(uri, endpoint, false)
    }

    /// [`Router::mount`] with case-sensitive literal segments.
    pub fn mount_with(
        &mut self,
        uri: &str,
        endpoint: impl Into<Endpoint>,
        case_sensitive: bool,
    ) -> Result<(), MuxError> {
        let uri = if uri.is_empty() { "/" } else { uri };
        let match_options = MatchOptions {
            case_sensitive,
            strict: false,
            end: false,
        };
        self.push(uri, None, endpoint.into(), match_options)?;
        self.observers.emit(&Notice::Use { uri });
        Ok(())
    }

    /// Mount a reverse proxy: calls matching `uri` are forwarded to the
    /// remote service described by `options`, through a client resolved from
    /// the attached transport registry.
    ///
    /// With `change_origin` the forwarded call keeps the caller's full URI;
    /// without it the mount prefix is stripped like any other mount.
    pub async fn proxy(
        &mut self,
        uri: &str,
        options: impl Into<ClientOptions>,
        change_origin: bool,
    ) -> Result<(), MuxError> {
        let registry = self
            .registry
            .clone()
            .ok_or(MuxError::MissingParameter("registry"))?;
        let options = options.into();
        let target = options.uri.clone().unwrap_or_default();
        let client = registry.client(options).await?;

        self.observers.emit(&Notice::Proxy {
            uri,
            target: &target,
        });

        if change_origin {
            self.mount(uri, Endpoint::handler(OutboundHandler::new(client)))
        } else {
            self.mount(uri, client)
        }
    }

    /// Remove every registered route.
    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Enable or disable request logging, cascading into every route and
    /// mounted sub-router.
    pub fn set_logging(&self, enabled: bool) {
        self.logging.store(enabled, Ordering::Relaxed);
        for route in &self.routes {
            route.set_logging(enabled);
        }
    }

    /// Enable or disable request timing, cascading into every route and
    /// mounted sub-router.
    pub fn set_timing(&self, enabled: bool) {
        self.timing.store(enabled, Ordering::Relaxed);
        for route in &self.routes {
            route.set_timing(enabled);
        }
    }

    /// Register an observer for a notice topic.
    pub fn on<F>(&mut self, topic: Topic, callback: F)
    where
        F: Fn(&Notice<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.observers.on(topic, callback);
    }

    /// Attach the transport registry [`Router::proxy`] resolves clients
    /// against.
    pub fn set_registry(&mut self, registry: Arc<TransportRegistry>) {
        self.registry = Some(registry);
    }

    pub(crate) fn emit(&self, notice: &Notice<'_>) -> Option<Value> {
        self.observers.emit(notice)
    }

    fn push(
        &mut self,
        uri: &str,
        verb: Option<Verb>,
        endpoint: Endpoint,
        options: MatchOptions,
    ) -> Result<(), MuxError> {
        if let Endpoint::Chain(handlers) = &endpoint
            && handlers.is_empty()
        {
            return Err(MuxError::MissingParameter("handler"));
        }
        let route = Route::new(RouteConfig {
            uri: uri.to_string(),
            verb,
            endpoint,
            options,
            logging: self.logging.load(Ordering::Relaxed),
            timing: self.timing.load(Ordering::Relaxed),
        })?;
        self.routes.push(route);
        Ok(())
    }

    /// Walk the route list and dispatch into the first match.
    ///
    /// This is the raw dispatch loop: `Ok(None)` means no route matched or
    /// every matching handler passed, and handler failures propagate without
    /// touching the error notice. [`Router::request`] is the wrapped entry
    /// point callers normally want.
    ///
    /// The context is mutated in place while the call descends through
    /// mounts and is restored to its entry `uri`, `base_uri` and `params` on
    /// every exit path.
    pub fn execute<'a>(
        &'a self,
        ctx: &'a mut Context,
    ) -> BoxFuture<'a, Result<Option<Value>, MuxError>> {
        Box::pin(async move {
            if ctx.original_uri.is_none() {
                ctx.original_uri = Some(ctx.uri.clone());
            }
            let entry_uri = ctx.uri.clone();
            let entry_base = ctx.base_uri.clone();
            let entry_params = ctx.params.clone();

            for route in &self.routes {
                ctx.uri.clone_from(&entry_uri);
                ctx.base_uri.clone_from(&entry_base);
                ctx.params.clone_from(&entry_params);

                let Some(matched) = route.matches(ctx) else {
                    continue;
                };

                // Matched parameters win over inherited ones.
                for (name, value) in matched.params {
                    ctx.params.insert(name, value);
                }

                if route.is_mount() {
                    let remainder = ctx.uri[matched.prefix.len()..].to_string();
                    ctx.base_uri.push_str(&matched.prefix);
                    ctx.uri = if remainder.is_empty() {
                        String::from("/")
                    } else {
                        remainder
                    };
                }

                let result = route.dispatch(ctx).await;

                // Restore before propagating anything, errors included.
                ctx.uri.clone_from(&entry_uri);
                ctx.base_uri.clone_from(&entry_base);

                match result {
                    Ok(Outcome::Pass) => {}
                    other => {
                        ctx.params = entry_params;
                        return other.map(Outcome::into_value);
                    }
                }
            }

            ctx.params = entry_params;
            Ok(None)
        })
    }

    /// Dispatch a call with logging, timing and error recovery.
    ///
    /// A handler failure is offered to the `error` observers; the first one
    /// to return a value recovers the call with that value, otherwise the
    /// failure propagates.
    pub async fn request(&self, ctx: &mut Context) -> Result<Option<Value>, MuxError> {
        if ctx.uri.is_empty() {
            return Err(MuxError::MissingParameter("uri"));
        }
        let logging = self.logging.load(Ordering::Relaxed);
        let timing = self.timing.load(Ordering::Relaxed);
        let started = (logging && timing).then(Instant::now);
        if logging {
            tracing::info!(
                router = self.name.as_deref().unwrap_or_default(),
                uri = %ctx.uri,
                verb = ?ctx.verb,
                "request"
            );
        }

        let result = match self.execute(ctx).await {
            Err(err) if err.is_recoverable() && self.observers.has(Topic::Error) => {
                match self.observers.emit(&Notice::Error { error: &err, ctx }) {
                    Some(value) => Ok(Some(value)),
                    None => Err(err),
                }
            }
            other => other,
        };

        if logging {
            match (&result, started) {
                (Ok(outcome), Some(t)) => tracing::info!(
                    router = self.name.as_deref().unwrap_or_default(),
                    handled = outcome.is_some(),
                    elapsed_ms = t.elapsed().as_millis() as u64,
                    "request complete"
                ),
                (Ok(outcome), None) => tracing::info!(
                    router = self.name.as_deref().unwrap_or_default(),
                    handled = outcome.is_some(),
                    "request complete"
                ),
                (Err(err), _) => tracing::warn!(
                    router = self.name.as_deref().unwrap_or_default(),
                    error = %err,
                    "request failed"
                ),
            }
        }
        result
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::new()
    }
}

impl Requester for Router {
    fn request<'a>(&'a self, ctx: &'a mut Context) -> RequestFuture<'a> {
        Box::pin(Router::request(self, ctx))
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("name", &self.name)
            .field("routes", &self.routes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PassHandler, StaticHandler};
    use serde_json::json;

    #[tokio::test]
    async fn first_match_wins() {
        let mut router = Router::new();
        router
            .add("/users", Endpoint::handler(StaticHandler::new(json!("a"))))
            .unwrap();
        router
            .add("/users", Endpoint::handler(StaticHandler::new(json!("b"))))
            .unwrap();

        let mut ctx = Context::new("/users");
        assert_eq!(router.request(&mut ctx).await.unwrap(), Some(json!("a")));
    }

    #[tokio::test]
    async fn pass_falls_through_to_next_route() {
        let mut router = Router::new();
        router
            .add("/users", Endpoint::handler(PassHandler))
            .unwrap();
        router
            .add("/users", Endpoint::handler(StaticHandler::new(json!("b"))))
            .unwrap();

        let mut ctx = Context::new("/users");
        assert_eq!(router.request(&mut ctx).await.unwrap(), Some(json!("b")));
    }

    #[tokio::test]
    async fn no_match_is_none() {
        let mut router = Router::new();
        router
            .add("/users", Endpoint::handler(StaticHandler::new(json!(1))))
            .unwrap();

        let mut ctx = Context::new("/posts");
        assert_eq!(router.request(&mut ctx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn verb_filter_applies_before_uri() {
        let mut router = Router::new();
        router
            .add_verb(
                Verb::Post,
                "/users",
                Endpoint::handler(StaticHandler::new(json!("created"))),
            )
            .unwrap();

        let mut get = Context::get("/users");
        assert_eq!(router.request(&mut get).await.unwrap(), None);

        let mut post = Context::post("/users");
        assert_eq!(
            router.request(&mut post).await.unwrap(),
            Some(json!("created"))
        );
    }

    #[tokio::test]
    async fn empty_uri_is_rejected() {
        let router = Router::new();
        let mut ctx = Context::new("");
        assert!(matches!(
            router.request(&mut ctx).await,
            Err(MuxError::MissingParameter("uri"))
        ));
    }
}
