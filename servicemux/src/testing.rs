//! Testing utilities for servicemux.
//!
//! Everything a transport or application test needs to exercise routing
//! without a network:
//!
//! - [`StaticHandler`] / [`PassHandler`] / [`FailHandler`]: canned handler
//!   outcomes
//! - [`RecordingHandler`]: records every context it sees
//! - [`StaticClient`] / [`RecordingClient`]: canned remote endpoints
//! - [`Loopback`]: an in-process transport whose servers and clients meet
//!   in a shared table, so the full facade path (register, serve, resolve,
//!   proxy) runs end to end in one process

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use serde_json::Value;
use servicemux_core::{BoxError, Context, Handler, MuxError, Outcome};

use crate::{
    registry::TransportModule,
    router::Router,
    transport::{
        ClientFactory, ClientHandle, ClientOptions, ServerFactory, ServerHandle, ServerOptions,
    },
};

// ============================================================================
// Handlers
// ============================================================================

/// A handler that always produces the same value.
#[derive(Clone)]
pub struct StaticHandler {
    value: Value,
}

impl StaticHandler {
    /// Always answer with `value`.
    pub fn new(value: Value) -> Self {
        StaticHandler { value }
    }
}

impl Handler for StaticHandler {
    fn call(&self, _ctx: &mut Context) -> impl Future<Output = Result<Outcome, BoxError>> + Send {
        let value = self.value.clone();
        async move { Ok(Outcome::Handled(value)) }
    }
}

/// A handler that always declines.
#[derive(Clone, Copy)]
pub struct PassHandler;

impl Handler for PassHandler {
    fn call(&self, _ctx: &mut Context) -> impl Future<Output = Result<Outcome, BoxError>> + Send {
        async { Ok(Outcome::Pass) }
    }
}

/// A handler that always fails.
#[derive(Clone)]
pub struct FailHandler {
    message: String,
}

impl FailHandler {
    /// Always fail with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        FailHandler {
            message: message.into(),
        }
    }
}

impl Handler for FailHandler {
    fn call(&self, _ctx: &mut Context) -> impl Future<Output = Result<Outcome, BoxError>> + Send {
        let message = self.message.clone();
        async move { Err(message.into()) }
    }
}

/// A handler that records every context it receives.
///
/// Clones share the same recording, so keep one clone outside the router to
/// inspect afterwards.
#[derive(Clone)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<Context>>>,
    outcome: Outcome,
}

impl RecordingHandler {
    /// Record and decline every call.
    pub fn new() -> Self {
        RecordingHandler::with_outcome(Outcome::Pass)
    }

    /// Record every call and answer with a fixed outcome.
    pub fn with_outcome(outcome: Outcome) -> Self {
        RecordingHandler {
            calls: Arc::new(Mutex::new(Vec::new())),
            outcome,
        }
    }

    /// The recorded contexts, in call order.
    pub fn calls(&self) -> Vec<Context> {
        self.calls.lock().unwrap().clone()
    }

    /// How many calls were recorded.
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for RecordingHandler {
    fn default() -> Self {
        RecordingHandler::new()
    }
}

impl Handler for RecordingHandler {
    fn call(&self, ctx: &mut Context) -> impl Future<Output = Result<Outcome, BoxError>> + Send {
        self.calls.lock().unwrap().push(ctx.clone());
        let outcome = self.outcome.clone();
        async move { Ok(outcome) }
    }
}

// ============================================================================
// Clients
// ============================================================================

/// A remote endpoint that always answers with the same value.
#[derive(Clone)]
pub struct StaticClient {
    value: Value,
}

impl StaticClient {
    /// Always answer with `value`.
    pub fn new(value: Value) -> Self {
        StaticClient { value }
    }
}

#[async_trait]
impl ClientHandle for StaticClient {
    async fn request(&self, _ctx: &mut Context) -> Result<Option<Value>, MuxError> {
        Ok(Some(self.value.clone()))
    }
}

/// A remote endpoint that records every context it receives.
#[derive(Clone)]
pub struct RecordingClient {
    calls: Arc<Mutex<Vec<Context>>>,
    result: Option<Value>,
}

impl RecordingClient {
    /// Record and answer with `result` (`None` reports a remote pass).
    pub fn new(result: Option<Value>) -> Self {
        RecordingClient {
            calls: Arc::new(Mutex::new(Vec::new())),
            result,
        }
    }

    /// The recorded contexts, in call order.
    pub fn calls(&self) -> Vec<Context> {
        self.calls.lock().unwrap().clone()
    }

    /// How many calls were recorded.
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ClientHandle for RecordingClient {
    async fn request(&self, ctx: &mut Context) -> Result<Option<Value>, MuxError> {
        self.calls.lock().unwrap().push(ctx.clone());
        Ok(self.result.clone())
    }
}

// ============================================================================
// Loopback transport
// ============================================================================

type ServiceTable = Arc<Mutex<HashMap<String, Arc<Router>>>>;

/// The part of a URI that names a loopback service: the authority, e.g.
/// `orders` in `loop://orders/users`.
fn service_key(uri: &str) -> String {
    let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest).to_string()
}

/// An in-process transport.
///
/// Servers register their router under the URI authority; clients resolve
/// the same authority and dispatch straight into that router. The call
/// context crosses the "wire" through its serde representation, so what a
/// real JSON transport would transmit is exactly what arrives.
#[derive(Clone, Default)]
pub struct Loopback {
    services: ServiceTable,
}

impl Loopback {
    /// An empty loopback fabric.
    pub fn new() -> Self {
        Loopback::default()
    }

    /// A transport module serving this fabric, registrable under any name.
    pub fn module(&self, name: impl Into<String>) -> TransportModule {
        TransportModule::new(name)
            .with_client(LoopbackClientFactory {
                services: Arc::clone(&self.services),
            })
            .with_server(LoopbackServerFactory {
                services: Arc::clone(&self.services),
            })
    }

    /// The currently served authorities.
    pub fn served(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.services.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

struct LoopbackClientFactory {
    services: ServiceTable,
}

#[async_trait]
impl ClientFactory for LoopbackClientFactory {
    async fn create(&self, options: &ClientOptions) -> Result<Arc<dyn ClientHandle>, MuxError> {
        let uri = options
            .uri
            .as_deref()
            .ok_or(MuxError::MissingParameter("uri"))?;
        let key = service_key(uri);
        let app = self
            .services
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| MuxError::handler(format!("no loopback service at `{key}`")))?;
        Ok(Arc::new(LoopbackHandle { app }))
    }
}

struct LoopbackHandle {
    app: Arc<Router>,
}

#[async_trait]
impl ClientHandle for LoopbackHandle {
    async fn request(&self, ctx: &mut Context) -> Result<Option<Value>, MuxError> {
        // Round-trip through the wire representation, like a real JSON
        // transport would.
        let wire = serde_json::to_value(&*ctx).map_err(MuxError::handler)?;
        let mut remote: Context = serde_json::from_value(wire).map_err(MuxError::handler)?;
        self.app.request(&mut remote).await
    }
}

struct LoopbackServerFactory {
    services: ServiceTable,
}

#[async_trait]
impl ServerFactory for LoopbackServerFactory {
    async fn create(
        &self,
        app: Arc<Router>,
        options: &ServerOptions,
    ) -> Result<Box<dyn ServerHandle>, MuxError> {
        let uri = options
            .uri
            .as_deref()
            .ok_or(MuxError::MissingParameter("uri"))?;
        let key = service_key(uri);
        self.services.lock().unwrap().insert(key.clone(), app);
        Ok(Box::new(LoopbackServer {
            key,
            services: Arc::downgrade(&self.services),
        }))
    }
}

struct LoopbackServer {
    key: String,
    services: Weak<Mutex<HashMap<String, Arc<Router>>>>,
}

#[async_trait]
impl ServerHandle for LoopbackServer {
    async fn close(&self) -> Result<(), MuxError> {
        if let Some(services) = self.services.upgrade() {
            services.lock().unwrap().remove(&self.key);
        }
        Ok(())
    }
}
