//! Transport registration and resolution.
//!
//! A [`TransportModule`] bundles the client and/or server factory for one
//! protocol name. The [`TransportRegistry`] maps lowercased names to those
//! factories and resolves them on demand; resolution order is the explicit
//! `transport` tag, then the URI scheme, then `http`.
//!
//! Registration is idempotent (re-registering a name replaces its
//! factories) and nothing is ever removed implicitly; the [`Registration`]
//! returned by [`TransportRegistry::register`] is the explicit removal
//! capability. The maps are unsynchronized with in-flight dispatch: a
//! resolution races a concurrent register/unregister and simply sees the map
//! before or after it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use servicemux_core::{MuxError, Notice};

use crate::{
    router::Router,
    transport::{
        Client, ClientFactory, ClientOptions, ServerFactory, ServerHandle, ServerOptions,
        resolve_scheme,
    },
};

/// The factories one protocol contributes.
pub struct TransportModule {
    name: String,
    client: Option<Arc<dyn ClientFactory>>,
    server: Option<Arc<dyn ServerFactory>>,
}

impl TransportModule {
    /// A module for the given protocol name, with no factories yet.
    pub fn new(name: impl Into<String>) -> Self {
        TransportModule {
            name: name.into(),
            client: None,
            server: None,
        }
    }

    /// Contribute a client factory.
    pub fn with_client(mut self, factory: impl ClientFactory + 'static) -> Self {
        self.client = Some(Arc::new(factory));
        self
    }

    /// Contribute a server factory.
    pub fn with_server(mut self, factory: impl ServerFactory + 'static) -> Self {
        self.server = Some(Arc::new(factory));
        self
    }

    /// The protocol name this module registers under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for TransportModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportModule")
            .field("name", &self.name)
            .field("client", &self.client.is_some())
            .field("server", &self.server.is_some())
            .finish()
    }
}

/// Protocol name to factory maps.
#[derive(Default)]
pub struct TransportRegistry {
    clients: RwLock<HashMap<String, Arc<dyn ClientFactory>>>,
    servers: RwLock<HashMap<String, Arc<dyn ServerFactory>>>,
}

impl TransportRegistry {
    /// An empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(TransportRegistry::default())
    }

    /// Register a transport module under its lowercased name, replacing any
    /// factories already registered for that name.
    pub fn register(self: &Arc<Self>, module: TransportModule) -> Registration {
        let name = module.name.to_ascii_lowercase();
        if let Some(factory) = module.client {
            self.clients
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .insert(name.clone(), factory);
        }
        if let Some(factory) = module.server {
            self.servers
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .insert(name.clone(), factory);
        }
        Registration {
            name,
            registry: Arc::downgrade(self),
        }
    }

    /// The protocol names with a registered client factory.
    pub fn client_schemes(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .clients
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Resolve and connect a client.
    ///
    /// Requires a URI; the transport is the explicit `transport` tag, else
    /// the URI scheme, else `http`.
    pub async fn client(&self, options: impl Into<ClientOptions>) -> Result<Client, MuxError> {
        let options = options.into();
        if options.uri.is_none() {
            return Err(MuxError::MissingParameter("uri"));
        }
        let scheme = resolve_scheme(options.transport.as_deref(), options.uri.as_deref());
        let factory = self
            .clients
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&scheme)
            .cloned()
            .ok_or_else(|| MuxError::UnsupportedType(scheme))?;
        let handle = factory.create(&options).await?;
        Ok(Client::new(handle, &options))
    }

    /// Resolve a server factory and start serving `app`.
    ///
    /// Emits the `server` notice on `app` before the factory runs, so
    /// observers see every server start.
    pub async fn server(
        &self,
        app: impl Into<Arc<Router>>,
        options: impl Into<ServerOptions>,
    ) -> Result<Box<dyn ServerHandle>, MuxError> {
        let app = app.into();
        let options = options.into();
        let scheme = resolve_scheme(options.transport.as_deref(), options.uri.as_deref());
        let factory = self
            .servers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&scheme)
            .cloned()
            .ok_or_else(|| MuxError::UnsupportedType(scheme.clone()))?;

        app.emit(&Notice::Server {
            scheme: &scheme,
            uri: options.uri.as_deref(),
        });

        factory.create(app, &options).await
    }

    fn unregister(&self, name: &str) {
        self.clients
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        self.servers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
    }
}

impl fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRegistry")
            .field("clients", &self.client_schemes())
            .finish()
    }
}

/// The capability to remove a registered transport. Dropping it without
/// calling [`Registration::unregister`] leaves the transport in place.
#[derive(Debug)]
pub struct Registration {
    name: String,
    registry: Weak<TransportRegistry>,
}

impl Registration {
    /// The name this registration covers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove the transport's factories from the registry.
    pub fn unregister(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(&self.name);
        }
    }
}
