//! The shared request surface.
//!
//! Routers, clients and proxies all answer calls through the same `request`
//! operation; the verb shorthands (`get`, `post`, `put`, `delete`) are
//! provided on top of it.

use std::{future::Future, pin::Pin};

use serde_json::Value;

use crate::{
    context::{Context, Verb},
    error::MuxError,
};

/// The boxed future returned by [`Requester::request`].
pub type RequestFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<Value>, MuxError>> + Send + 'a>>;

/// Anything that can answer a call: a router, a remote client, a proxy.
///
/// `Arc<T>` delegates to `T`, so shared handles answer calls the same way
/// as the value they wrap.
///
/// `Ok(None)` is the normal not-found outcome: no route matched, or every
/// matching handler passed. A defined-but-empty result is
/// `Ok(Some(Value::Null))`.
pub trait Requester: Send + Sync {
    /// Dispatch the call described by `ctx`.
    fn request<'a>(&'a self, ctx: &'a mut Context) -> RequestFuture<'a>;

    /// Dispatch a call with an explicit verb and optional payload.
    fn send(&self, uri: &str, verb: Verb, data: Option<Value>) -> RequestFuture<'_>
    where
        Self: Sized,
    {
        let mut ctx = Context::new(uri).verb(verb);
        ctx.data = data;
        Box::pin(async move {
            let mut ctx = ctx;
            self.request(&mut ctx).await
        })
    }

    /// GET shorthand.
    fn get(&self, uri: &str, data: impl Into<Option<Value>>) -> RequestFuture<'_>
    where
        Self: Sized,
    {
        self.send(uri, Verb::Get, data.into())
    }

    /// POST shorthand.
    fn post(&self, uri: &str, data: impl Into<Option<Value>>) -> RequestFuture<'_>
    where
        Self: Sized,
    {
        self.send(uri, Verb::Post, data.into())
    }

    /// PUT shorthand.
    fn put(&self, uri: &str, data: impl Into<Option<Value>>) -> RequestFuture<'_>
    where
        Self: Sized,
    {
        self.send(uri, Verb::Put, data.into())
    }

    /// DELETE shorthand.
    fn delete(&self, uri: &str, data: impl Into<Option<Value>>) -> RequestFuture<'_>
    where
        Self: Sized,
    {
        self.send(uri, Verb::Delete, data.into())
    }
}

impl<T: Requester> Requester for std::sync::Arc<T> {
    fn request<'a>(&'a self, ctx: &'a mut Context) -> RequestFuture<'a> {
        (**self).request(ctx)
    }
}
