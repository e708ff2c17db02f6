//! Observer notifications.
//!
//! Routers expose a handful of hook points (`add`, `use`, `error`,
//! `server`, `proxy`) as notices with a first-defined-result-wins
//! aggregation rule. Observers may inspect every notice; only the `error`
//! notice acts on the returned value, where a `Some` recovers the failed
//! request with that value.
//!
//! Emission stays out of the hot dispatch path: notices fire at registration
//! time and on request failure, never per matched route.

use serde_json::Value;

use crate::{context::Context, context::Verb, error::MuxError};

/// The hook points a router exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    /// A leaf route is being registered.
    Add,
    /// A mount or middleware is being registered.
    Use,
    /// A handler failed during `request`; returning `Some` recovers.
    Error,
    /// A server is about to be started for this router.
    Server,
    /// A proxy is being mounted on this router.
    Proxy,
}

/// The payload delivered to observers.
#[derive(Debug)]
pub enum Notice<'a> {
    /// Leaf route registration.
    Add {
        /// The URI template being registered.
        uri: &'a str,
        /// The verb filter, if any.
        verb: Option<Verb>,
    },
    /// Mount/middleware registration.
    Use {
        /// The mount path.
        uri: &'a str,
    },
    /// Handler failure during a request.
    Error {
        /// The failure.
        error: &'a MuxError,
        /// The context of the failed call, restored to its entry state.
        ctx: &'a Context,
    },
    /// Server start for this router.
    Server {
        /// The resolved transport identifier.
        scheme: &'a str,
        /// The requested server URI, if any.
        uri: Option<&'a str>,
    },
    /// Proxy mount.
    Proxy {
        /// The mount path.
        uri: &'a str,
        /// The proxy target URI.
        target: &'a str,
    },
}

impl Notice<'_> {
    /// The topic this notice belongs to.
    pub fn topic(&self) -> Topic {
        match self {
            Notice::Add { .. } => Topic::Add,
            Notice::Use { .. } => Topic::Use,
            Notice::Error { .. } => Topic::Error,
            Notice::Server { .. } => Topic::Server,
            Notice::Proxy { .. } => Topic::Proxy,
        }
    }
}

type Callback = Box<dyn Fn(&Notice<'_>) -> Option<Value> + Send + Sync>;

/// An ordered collection of observers.
#[derive(Default)]
pub struct Observers {
    entries: Vec<(Topic, Callback)>,
}

impl Observers {
    /// Create an empty collection.
    pub fn new() -> Self {
        Observers::default()
    }

    /// Register an observer for a topic. Observers fire in registration
    /// order.
    pub fn on<F>(&mut self, topic: Topic, callback: F)
    where
        F: Fn(&Notice<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.entries.push((topic, Box::new(callback)));
    }

    /// Deliver a notice to every observer of its topic. The first observer
    /// to return a defined value wins; later observers still run.
    pub fn emit(&self, notice: &Notice<'_>) -> Option<Value> {
        let topic = notice.topic();
        let mut result = None;
        for (t, callback) in &self.entries {
            if *t != topic {
                continue;
            }
            let returned = callback(notice);
            if result.is_none() {
                result = returned;
            }
        }
        result
    }

    /// Whether any observer is registered for the topic.
    pub fn has(&self, topic: Topic) -> bool {
        self.entries.iter().any(|(t, _)| *t == topic)
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish()
    }
}
