//! Transport contracts.
//!
//! The engine never opens a socket. A transport module supplies a client
//! factory (outbound calls) and a server factory (inbound calls dispatched
//! into a router), and the [`TransportRegistry`] resolves a protocol name to
//! the right factory. This module defines the contracts those factories
//! implement and [`Client`], the engine-side wrapper every resolved client
//! is handed out as.
//!
//! [`TransportRegistry`]: crate::TransportRegistry

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use servicemux_core::{
    BoxError, Context, Handler, MuxError, Outcome, RequestFuture, Requester,
};

use crate::router::Router;

/// Options for resolving and constructing a client.
///
/// Deserializable, so a service's remote endpoints can come straight out of
/// a JSON configuration record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOptions {
    /// The remote service URI, e.g. `ws://orders.internal/`.
    pub uri: Option<String>,
    /// Explicit transport name; overrides the URI scheme.
    pub transport: Option<String>,
    /// Default timeout in milliseconds applied to calls that don't carry
    /// their own.
    pub timeout: Option<u64>,
}

impl ClientOptions {
    /// Options targeting the given URI.
    pub fn uri(uri: impl Into<String>) -> Self {
        ClientOptions {
            uri: Some(uri.into()),
            ..ClientOptions::default()
        }
    }
}

impl From<&str> for ClientOptions {
    fn from(uri: &str) -> Self {
        ClientOptions::uri(uri)
    }
}

impl From<String> for ClientOptions {
    fn from(uri: String) -> Self {
        ClientOptions::uri(uri)
    }
}

/// Options for resolving and starting a server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerOptions {
    /// The URI to serve on, e.g. `ws://0.0.0.0:8080/`.
    pub uri: Option<String>,
    /// Explicit transport name; overrides the URI scheme.
    pub transport: Option<String>,
}

impl ServerOptions {
    /// Options serving on the given URI.
    pub fn uri(uri: impl Into<String>) -> Self {
        ServerOptions {
            uri: Some(uri.into()),
            ..ServerOptions::default()
        }
    }
}

impl From<&str> for ServerOptions {
    fn from(uri: &str) -> Self {
        ServerOptions::uri(uri)
    }
}

/// The scheme of a URI, if it has one.
pub(crate) fn scheme_of(uri: &str) -> Option<&str> {
    let (scheme, _) = uri.split_once("://")?;
    if scheme.is_empty() { None } else { Some(scheme) }
}

/// Resolve a transport name: explicit tag first, then the URI scheme, then
/// `http`. Always lowercased.
pub(crate) fn resolve_scheme(transport: Option<&str>, uri: Option<&str>) -> String {
    transport
        .or_else(|| uri.and_then(scheme_of))
        .unwrap_or("http")
        .to_ascii_lowercase()
}

/// A connected outbound endpoint, as implemented by a transport module.
#[async_trait]
pub trait ClientHandle: Send + Sync {
    /// Send the call and wait for its result. `Ok(None)` reports the remote
    /// side passed on the call.
    async fn request(&self, ctx: &mut Context) -> Result<Option<Value>, MuxError>;

    /// Send the call without waiting for a result.
    async fn notify(&self, ctx: &Context) -> Result<(), MuxError> {
        let _ = ctx;
        Ok(())
    }

    /// Whether the underlying connection is usable right now.
    fn ready(&self) -> bool {
        true
    }
}

/// Builds client handles for one transport.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Connect to the remote service described by `options`.
    async fn create(&self, options: &ClientOptions) -> Result<Arc<dyn ClientHandle>, MuxError>;
}

/// A running server. Dropping the handle does not stop the server; call
/// [`ServerHandle::close`].
#[async_trait]
pub trait ServerHandle: Send + Sync {
    /// Stop accepting calls.
    async fn close(&self) -> Result<(), MuxError>;
}

/// Builds servers for one transport.
#[async_trait]
pub trait ServerFactory: Send + Sync {
    /// Start serving `app` as described by `options`.
    async fn create(
        &self,
        app: Arc<Router>,
        options: &ServerOptions,
    ) -> Result<Box<dyn ServerHandle>, MuxError>;
}

/// An outbound endpoint, mountable on a router.
///
/// `Client` wraps the transport's [`ClientHandle`] and applies the
/// construction-time default timeout to calls that don't set their own. It
/// implements [`Requester`], so the verb shorthands work on clients exactly
/// as on routers.
#[derive(Clone)]
pub struct Client {
    handle: Arc<dyn ClientHandle>,
    target: Option<String>,
    default_timeout: Option<u64>,
}

impl Client {
    /// Wrap a transport handle.
    pub fn new(handle: Arc<dyn ClientHandle>, options: &ClientOptions) -> Self {
        Client {
            handle,
            target: options.uri.clone(),
            default_timeout: options.timeout,
        }
    }

    /// The remote URI this client was resolved for, if known.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Send the call and wait for its result.
    pub async fn request(&self, ctx: &mut Context) -> Result<Option<Value>, MuxError> {
        if ctx.timeout.is_none() {
            ctx.timeout = self.default_timeout;
        }
        self.handle.request(ctx).await
    }

    /// Send the call without waiting for a result.
    pub async fn notify(&self, ctx: &Context) -> Result<(), MuxError> {
        self.handle.notify(ctx).await
    }

    /// Whether the underlying connection is usable right now.
    pub fn ready(&self) -> bool {
        self.handle.ready()
    }
}

impl Requester for Client {
    fn request<'a>(&'a self, ctx: &'a mut Context) -> RequestFuture<'a> {
        Box::pin(Client::request(self, ctx))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("target", &self.target)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

/// Forwards calls to a client without mount rewriting.
///
/// Mounted as a plain handler, so the forwarded context keeps the caller's
/// full URI. This is what a proxy with `change_origin` mounts.
pub struct OutboundHandler {
    client: Client,
}

impl OutboundHandler {
    /// Forward into the given client.
    pub fn new(client: Client) -> Self {
        OutboundHandler { client }
    }
}

impl Handler for OutboundHandler {
    fn call(
        &self,
        ctx: &mut Context,
    ) -> impl std::future::Future<Output = Result<Outcome, BoxError>> + Send {
        async move {
            let value = self.client.request(ctx).await?;
            Ok(value.into())
        }
    }
}
