//! The combined per-kind surface: CRUD, cached reads and registration.
use std::{future::Future, sync::Arc, time::Duration};

use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use kindred_client::{ObjectClient, Result, TypedClient};
use kindred_core::{
    params::{DeleteParams, GetParams, ListParams, Patch, PatchParams},
    ApiResource, ObjectList, Resource, ResourceRegistry, WatchEvent,
};
use kindred_runtime::{
    lifecycle::new_lifecycle_adapter, Controller, FeatureGate, HandlerFn, Lifecycle,
    LifecycleDelegate, Lister, SyncResult,
};

use crate::Client;

/// Everything one kind offers in a single handle.
///
/// Combines the typed CRUD client, the shared controller for the kind's
/// family and the lifecycle registration helpers. Obtained from
/// [`Client::resource`]; handles for the same kind and namespace share
/// their controller and cache.
pub struct ResourceClient<K> {
    client: TypedClient<K>,
    controller: Controller<K>,
    registry: Arc<ResourceRegistry>,
}

impl<K> Clone for ResourceClient<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            controller: self.controller.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<K: Resource> ResourceClient<K> {
    pub(crate) fn new(client: &Client, namespace: Option<&str>) -> Self {
        let resource = ApiResource::erase::<K>();
        let object_client = client.clients.object_client(&resource);
        let generic = client.controllers.for_resource(&resource, namespace);
        Self {
            client: TypedClient::new(object_client, namespace),
            controller: Controller::new(generic),
            registry: client.registry.clone(),
        }
    }

    /// The typed CRUD client underneath.
    pub fn client(&self) -> &TypedClient<K> {
        &self.client
    }

    /// The untyped transport client underneath.
    pub fn object_client(&self) -> &Arc<dyn ObjectClient> {
        self.client.object_client()
    }

    /// The shared controller for this kind's family.
    pub fn controller(&self) -> &Controller<K> {
        &self.controller
    }

    /// A cache-backed lister bound to this handle's namespace.
    pub fn lister(&self) -> Lister<K> {
        self.controller.lister()
    }

    /// Persist a new object
    pub async fn create(&self, obj: &K) -> Result<K> {
        self.client.create(obj).await
    }

    /// Fetch a named object from the bound namespace
    pub async fn get(&self, name: &str, gp: &GetParams) -> Result<K> {
        self.client.get(name, gp).await
    }

    /// Fetch a named object from an explicit namespace
    pub async fn get_namespaced(&self, namespace: &str, name: &str, gp: &GetParams) -> Result<K> {
        self.client.get_namespaced(namespace, name, gp).await
    }

    /// Replace an existing object
    pub async fn update(&self, obj: &K) -> Result<K> {
        self.client.update(obj).await
    }

    /// Replace only the status of an existing object
    pub async fn update_status(&self, obj: &K) -> Result<K> {
        self.client.update_status(obj).await
    }

    /// Delete a named object from the bound namespace
    pub async fn delete(&self, name: &str, dp: &DeleteParams) -> Result<()> {
        self.client.delete(name, dp).await
    }

    /// Delete a named object from an explicit namespace
    pub async fn delete_namespaced(
        &self,
        namespace: &str,
        name: &str,
        dp: &DeleteParams,
    ) -> Result<()> {
        self.client.delete_namespaced(namespace, name, dp).await
    }

    /// List objects in the bound namespace
    pub async fn list(&self, lp: &ListParams) -> Result<ObjectList<K>> {
        self.client.list(lp).await
    }

    /// List objects in an explicit namespace
    pub async fn list_namespaced(&self, namespace: &str, lp: &ListParams) -> Result<ObjectList<K>> {
        self.client.list_namespaced(namespace, lp).await
    }

    /// Open a typed watch stream over the bound namespace
    pub async fn watch(
        &self,
        lp: &ListParams,
    ) -> Result<BoxStream<'static, Result<WatchEvent<K>>>> {
        self.client.watch(lp).await
    }

    /// Apply a patch to a named object in the bound namespace
    pub async fn patch(&self, name: &str, patch: &Patch, pp: &PatchParams) -> Result<K> {
        self.client.patch(name, patch, pp).await
    }

    /// Delete every object matching `lp` in the bound namespace
    pub async fn delete_collection(&self, dp: &DeleteParams, lp: &ListParams) -> Result<()> {
        self.client.delete_collection(dp, lp).await
    }

    /// Schedule a sync for the named object
    pub fn enqueue(&self, namespace: &str, name: &str) {
        self.controller.enqueue(namespace, name);
    }

    /// Schedule a sync for the named object after a delay
    pub fn enqueue_after(&self, namespace: &str, name: &str, after: Duration) {
        self.controller.enqueue_after(namespace, name, after);
    }

    /// Register a sync handler under `name`, live until `token` is
    /// cancelled
    pub fn add_handler(&self, token: &CancellationToken, name: &str, handler: HandlerFn<K>) {
        self.controller.add_handler(token, name, handler);
    }

    /// Register a handler consulted only while `enabled` returns true
    pub fn add_feature_handler(
        &self,
        token: &CancellationToken,
        enabled: FeatureGate,
        name: &str,
        handler: HandlerFn<K>,
    ) {
        self.controller.add_feature_handler(token, enabled, name, handler);
    }

    /// Register a handler that only sees objects belonging to `cluster`
    pub fn add_cluster_scoped_handler(
        &self,
        token: &CancellationToken,
        name: &str,
        cluster: &str,
        handler: HandlerFn<K>,
    ) {
        self.controller
            .add_cluster_scoped_handler(token, name, cluster, handler);
    }

    /// Register a feature-gated handler scoped to `cluster`
    pub fn add_cluster_scoped_feature_handler(
        &self,
        token: &CancellationToken,
        enabled: FeatureGate,
        name: &str,
        cluster: &str,
        handler: HandlerFn<K>,
    ) {
        self.controller
            .add_cluster_scoped_feature_handler(token, enabled, name, cluster, handler);
    }

    /// Run `lifecycle` under `name` with finalizer bookkeeping.
    pub fn add_lifecycle(
        &self,
        token: &CancellationToken,
        name: &str,
        lifecycle: Arc<dyn Lifecycle<K>>,
    ) {
        let handler =
            new_lifecycle_adapter(name, false, &self.registry, self.client.clone(), lifecycle);
        self.controller.add_handler(token, name, handler);
    }

    /// Like [`add_lifecycle`](Self::add_lifecycle), gated on `enabled`.
    pub fn add_feature_lifecycle(
        &self,
        token: &CancellationToken,
        enabled: FeatureGate,
        name: &str,
        lifecycle: Arc<dyn Lifecycle<K>>,
    ) {
        let handler =
            new_lifecycle_adapter(name, false, &self.registry, self.client.clone(), lifecycle);
        self.controller.add_feature_handler(token, enabled, name, handler);
    }

    /// Run `lifecycle` for the objects belonging to `cluster`.
    ///
    /// The registered name is suffixed with the cluster, so each
    /// cluster's lifecycle stamps its own finalizer.
    pub fn add_cluster_scoped_lifecycle(
        &self,
        token: &CancellationToken,
        name: &str,
        cluster: &str,
        lifecycle: Arc<dyn Lifecycle<K>>,
    ) {
        let scoped = format!("{name}_{cluster}");
        let handler =
            new_lifecycle_adapter(&scoped, true, &self.registry, self.client.clone(), lifecycle);
        self.controller
            .add_cluster_scoped_handler(token, &scoped, cluster, handler);
    }

    /// Like [`add_cluster_scoped_lifecycle`](Self::add_cluster_scoped_lifecycle),
    /// gated on `enabled`.
    pub fn add_cluster_scoped_feature_lifecycle(
        &self,
        token: &CancellationToken,
        enabled: FeatureGate,
        name: &str,
        cluster: &str,
        lifecycle: Arc<dyn Lifecycle<K>>,
    ) {
        let scoped = format!("{name}_{cluster}");
        let handler =
            new_lifecycle_adapter(&scoped, true, &self.registry, self.client.clone(), lifecycle);
        self.controller
            .add_cluster_scoped_feature_handler(token, enabled, &scoped, cluster, handler);
    }

    /// Run `f` once per object, with finalizer-free bookkeeping.
    pub fn on_create<F, Fut>(&self, token: &CancellationToken, name: &str, f: F)
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SyncResult<K>> + Send + 'static,
    {
        self.add_lifecycle(token, name, Arc::new(LifecycleDelegate::new().with_create(f)));
    }

    /// Run `f` on every sync of a live object.
    pub fn on_change<F, Fut>(&self, token: &CancellationToken, name: &str, f: F)
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SyncResult<K>> + Send + 'static,
    {
        self.add_lifecycle(token, name, Arc::new(LifecycleDelegate::new().with_change(f)));
    }

    /// Run `f` before deletion completes; a finalizer holds the object
    /// until `f` succeeds.
    pub fn on_remove<F, Fut>(&self, token: &CancellationToken, name: &str, f: F)
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SyncResult<K>> + Send + 'static,
    {
        self.add_lifecycle(token, name, Arc::new(LifecycleDelegate::new().with_remove(f)));
    }
}
