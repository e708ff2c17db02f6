//! # Handler layer
//!
//! A handler is the unit of work a route binds to: it receives exclusive
//! access to the in-flight [`Context`] and either produces a result or
//! declines, letting dispatch fall through to the next candidate.
//!
//! # Pass-through convention
//!
//! A handler either produces a value or declines, and "no value" must stay
//! distinct from "a null value". [`Outcome`] makes that protocol a tagged
//! type: [`Outcome::Pass`] falls through to the next candidate route,
//! [`Outcome::Handled`] terminates dispatch, and
//! `Outcome::Handled(Value::Null)` is a defined, empty result that still
//! terminates.
//!
//! # Static vs dynamic dispatch
//!
//! [`Handler`] uses native `async fn`-style methods for static dispatch.
//! Routers store handlers as [`DynHandler`] trait objects; a blanket
//! implementation bridges the two.

use std::{future::Future, pin::Pin};

use serde_json::Value;

use crate::{context::Context, error::BoxError};

/// What a handler did with the call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The handler declined; dispatch continues with the next candidate.
    Pass,
    /// The handler produced a result; dispatch terminates with this value.
    /// A JSON `null` is a defined result.
    Handled(Value),
}

impl Outcome {
    /// Whether this outcome lets dispatch continue.
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    /// The produced value, if any.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Pass => None,
            Outcome::Handled(value) => Some(value),
        }
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Handled(value)
    }
}

impl From<Option<Value>> for Outcome {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Outcome::Pass, Outcome::Handled)
    }
}

/// The boxed future returned by dynamic handlers.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Outcome, BoxError>> + Send + 'a>>;

/// A route endpoint.
///
/// Handlers receive the call context by exclusive reference: the router owns
/// the mutate-and-restore discipline around the call, the handler only reads
/// and (for transport concerns) amends it.
pub trait Handler: Send + Sync + 'static {
    /// Handle the call, or decline it with [`Outcome::Pass`].
    fn call(&self, ctx: &mut Context) -> impl Future<Output = Result<Outcome, BoxError>> + Send;
}

/// Dynamic object-safe version of [`Handler`].
///
/// Routers store registered handlers through this trait.
pub trait DynHandler: Send + Sync + 'static {
    /// Handle the call (dynamic dispatch version).
    fn call_dyn<'a>(&'a self, ctx: &'a mut Context) -> HandlerFuture<'a>;
}

// Blanket implementation: any Handler is a DynHandler.
impl<T: Handler> DynHandler for T {
    fn call_dyn<'a>(&'a self, ctx: &'a mut Context) -> HandlerFuture<'a> {
        Box::pin(self.call(ctx))
    }
}

// Functions with the boxed-future signature are handlers directly, so a
// plain `fn hello(ctx: &mut Context) -> HandlerFuture<'_>` can be registered
// without a wrapper.
impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Context) -> HandlerFuture<'a> + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut Context) -> impl Future<Output = Result<Outcome, BoxError>> + Send {
        (self)(ctx)
    }
}
