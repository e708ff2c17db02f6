//! # servicemux: microservice composition
//!
//! A microservice application is a tree of [`Router`]s: each router holds an
//! ordered list of routes, the first match wins, and a route may lead to a
//! handler, a chain of handlers, a mounted sub-router or a remote service
//! behind a [`Client`]. Local and remote calls share one surface, so a
//! service can be split out of a process by swapping a mounted router for a
//! client, without touching its callers.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use serde_json::json;
//! use servicemux::{Endpoint, Requester, Root, Router};
//!
//! let root = Root::new();
//! let mut users = root.router();
//! users.add("/users/:id", Endpoint::handler(find_user))?;
//!
//! let mut app = root.router();
//! app.mount("/api", users)?;
//!
//! let result = app.get("/api/users/42", None).await?;
//! ```
//!
//! ## Pieces
//!
//! - [`Router`]: ordered first-match-wins dispatch, mounts, observers
//! - [`Endpoint`]: what a route leads to, resolved at registration
//! - [`Pattern`]: the `/users/:id` template matcher
//! - [`Root`]: the facade for routers, clients, servers and proxies
//! - [`TransportRegistry`] / [`TransportModule`]: pluggable protocols
//! - [`testing`]: canned handlers, recording clients, an in-process
//!   loopback transport

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod pattern;
mod registry;
mod root;
mod route;
mod router;
mod transport;

pub mod testing;

pub use pattern::Pattern;
pub use registry::{Registration, TransportModule, TransportRegistry};
pub use root::{Proxy, Root, RootOptions};
pub use route::{Endpoint, Route};
pub use router::{AddOptions, Router, RouterOptions};
pub use transport::{
    Client, ClientFactory, ClientHandle, ClientOptions, OutboundHandler, ServerFactory,
    ServerHandle, ServerOptions,
};

pub use servicemux_core::{
    BoxError, Context, DynHandler, Handler, HandlerFuture, Match, MatchOptions, Matcher, MuxError,
    Notice, Observers, Outcome, Params, ParseVerbError, RequestFuture, Requester, Topic, Verb,
};
