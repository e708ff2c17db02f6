//! # servicemux-core
//!
//! Core types and traits for the servicemux composition framework.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! transport modules and extensions that don't need the full `servicemux`
//! engine.
//!
//! # Layers
//!
//! ## Context
//!
//! [`Context`] is the mutable per-call record: the remaining path, the
//! prefix consumed by enclosing mounts, merged path parameters and the
//! opaque transport payload. One instance exists per top-level call and is
//! mutated and restored in place as dispatch descends through mounts.
//!
//! ## Handler
//!
//! [`Handler`] is the unit of work a route binds to. Its [`Outcome`] encodes
//! the pass-through convention: `Pass` falls through to the next candidate
//! route, `Handled` terminates dispatch with a value. [`DynHandler`] is the
//! object-safe companion routers store.
//!
//! ## Matcher
//!
//! [`Matcher`] is the seam for the URI-template capability: compiled
//! elsewhere, consumed here as match/no-match plus the consumed prefix and
//! extracted parameters.
//!
//! ## Requester
//!
//! [`Requester`] is the shared call surface implemented by routers, clients
//! and proxies, with verb shorthands layered on top.
//!
//! # Errors and notices
//!
//! [`MuxError`] is the whole taxonomy; only handler failures are
//! recoverable, through the [`Observers`] `error` notice.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod context;
mod error;
mod events;
mod handler;
mod matcher;
mod requester;

// Re-exports
pub use context::{Context, Params, ParseVerbError, Verb};
pub use error::{BoxError, MuxError};
pub use events::{Notice, Observers, Topic};
pub use handler::{DynHandler, Handler, HandlerFuture, Outcome};
pub use matcher::{Match, MatchOptions, Matcher};
pub use requester::{RequestFuture, Requester};
