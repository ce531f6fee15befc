//! The aggregate client and its startup sequence.
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use kindred_client::{ClientFactory, MemoryClientFactory};
use kindred_core::{Resource, ResourceRegistry};
use kindred_runtime::ControllerFactory;

use crate::ResourceClient;

/// Entry point tying together object clients, controllers and the
/// resource registry.
///
/// Typed access goes through [`Client::resource`], which registers the
/// kind and hands out a [`ResourceClient`]. Register every kind and
/// attach handlers first, then call [`Client::start`] once; controllers
/// created afterwards need their run loop spawned by the caller.
pub struct Client {
    pub(crate) clients: Arc<dyn ClientFactory>,
    pub(crate) controllers: Arc<ControllerFactory>,
    pub(crate) registry: Arc<ResourceRegistry>,
}

impl Clone for Client {
    fn clone(&self) -> Self {
        Self {
            clients: self.clients.clone(),
            controllers: self.controllers.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl Client {
    /// Create a client over the given transport.
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self {
            controllers: Arc::new(ControllerFactory::new(clients.clone())),
            clients,
            registry: Arc::new(ResourceRegistry::new()),
        }
    }

    /// A client backed by in-process state, for tests and local runs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryClientFactory::new()))
    }

    /// The registry of every kind this client has seen.
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// The typed surface for kind `K`, bound to `namespace`.
    ///
    /// Registers the kind as a side effect; calling this repeatedly for
    /// the same kind and namespace shares one controller underneath.
    pub fn resource<K: Resource>(&self, namespace: Option<&str>) -> ResourceClient<K> {
        self.registry.register::<K>();
        ResourceClient::new(self, namespace)
    }

    /// Spawn the run loop of every controller created so far. Runs until
    /// `token` is cancelled.
    pub fn start(&self, token: &CancellationToken) {
        self.controllers.start(token);
    }
}
