//! Lifecycle hooks with finalizer-backed removal.
//!
//! A [`Lifecycle`] turns the raw sync signal into three object-level
//! hooks. The adapter produced by [`new_lifecycle_adapter`] does the
//! bookkeeping: it stamps a finalizer so deletion waits for `remove`,
//! and a created-annotation so `create` runs exactly once per object.
use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use futures::{future::BoxFuture, FutureExt};

use kindred_client::TypedClient;
use kindred_core::{Resource, ResourceExt, ResourceRegistry};

use crate::controller::{HandlerFn, SyncResult};

/// Prefix of the finalizer the adapter manages.
pub const FINALIZER_PREFIX: &str = "controller.kindred.dev/";
/// Prefix of the annotation marking that `create` already ran.
pub const CREATED_PREFIX: &str = "lifecycle.kindred.dev/create.";

/// Object-level hooks invoked by a lifecycle adapter.
///
/// Each hook receives a copy of the object and may hand back a changed
/// one; `Ok(None)` leaves it untouched. Errors requeue the object.
#[async_trait]
pub trait Lifecycle<K>: Send + Sync {
    /// Called once for every object, before the first `updated`.
    async fn create(&self, obj: K) -> SyncResult<K>;
    /// Called when the object is being deleted, before the finalizer is
    /// released. An error keeps the finalizer in place.
    async fn remove(&self, obj: K) -> SyncResult<K>;
    /// Called on every subsequent sync of a live object.
    async fn updated(&self, obj: K) -> SyncResult<K>;

    /// Whether `create` should run at all. Defaults to true.
    fn has_create(&self) -> bool {
        true
    }
    /// Whether deletion should be held back for `remove`. Defaults to
    /// true; when false no finalizer is stamped.
    fn has_finalize(&self) -> bool {
        true
    }
}

struct LifecycleAdapter<K: Resource> {
    finalizer: String,
    created_annotation: String,
    client: TypedClient<K>,
    lifecycle: Arc<dyn Lifecycle<K>>,
}

impl<K: Resource> LifecycleAdapter<K> {
    fn new(name: &str, client: TypedClient<K>, lifecycle: Arc<dyn Lifecycle<K>>) -> Self {
        Self {
            finalizer: format!("{FINALIZER_PREFIX}{name}"),
            created_annotation: format!("{CREATED_PREFIX}{name}"),
            client,
            lifecycle,
        }
    }

    fn has_finalizer(&self, obj: &K) -> bool {
        obj.finalizers().iter().any(|f| f == &self.finalizer)
    }

    fn is_initialized(&self, obj: &K) -> bool {
        obj.annotations()
            .get(&self.created_annotation)
            .is_some_and(|v| v == "true")
    }

    async fn sync(&self, obj: Option<K>) -> SyncResult<K> {
        let Some(obj) = obj else { return Ok(None) };
        if obj.meta().deletion_timestamp.is_some() {
            return self.finalize(obj).await;
        }
        if !self.is_initialized(&obj) {
            return self.initialize(obj).await;
        }
        let current = obj.clone();
        match self.lifecycle.updated(obj).await? {
            Some(changed) => self.persist_if_changed(&current, changed).await,
            None => Ok(None),
        }
    }

    // Stamp the bookkeeping fields in one update, then run the create
    // hook on the stamped object.
    async fn initialize(&self, mut obj: K) -> SyncResult<K> {
        if self.lifecycle.has_finalize() && !self.has_finalizer(&obj) {
            obj.finalizers_mut().push(self.finalizer.clone());
        }
        obj.annotations_mut()
            .insert(self.created_annotation.clone(), "true".to_string());
        let stamped = self.client.update(&obj).await?;

        if !self.lifecycle.has_create() {
            return Ok(Some(stamped));
        }
        let current = stamped.clone();
        match self.lifecycle.create(stamped).await? {
            Some(changed) => self.persist_if_changed(&current, changed).await,
            None => Ok(Some(current)),
        }
    }

    // Remove runs first; only a clean return releases the finalizer, so
    // a failing hook keeps the object pinned until it succeeds.
    async fn finalize(&self, obj: K) -> SyncResult<K> {
        if !self.lifecycle.has_finalize() || !self.has_finalizer(&obj) {
            return Ok(None);
        }
        let mut finished = match self.lifecycle.remove(obj.clone()).await? {
            Some(changed) => changed,
            None => obj,
        };
        finished.finalizers_mut().retain(|f| f != &self.finalizer);
        let released = self.client.update(&finished).await?;
        Ok(Some(released))
    }

    async fn persist_if_changed(&self, current: &K, changed: K) -> SyncResult<K> {
        if &changed == current {
            return Ok(Some(changed));
        }
        let updated = self.client.update(&changed).await?;
        Ok(Some(updated))
    }
}

/// Build a handler running `lifecycle` with finalizer bookkeeping.
///
/// `name` scopes the finalizer and created-annotation, so independent
/// lifecycles on the same kind do not interfere. A cluster-scoped
/// lifecycle additionally records the kind's family in `registry`, which
/// downstream consumers use to tell cluster-scoped families apart.
pub fn new_lifecycle_adapter<K: Resource>(
    name: &str,
    cluster_scoped: bool,
    registry: &Arc<ResourceRegistry>,
    client: TypedClient<K>,
    lifecycle: Arc<dyn Lifecycle<K>>,
) -> HandlerFn<K> {
    if cluster_scoped {
        registry.put_cluster_scoped(K::gvr());
    }
    let adapter = Arc::new(LifecycleAdapter::new(name, client, lifecycle));
    Arc::new(move |_key, obj| {
        let adapter = adapter.clone();
        async move { adapter.sync(obj).await }.boxed()
    })
}

type HookFn<K> = Arc<dyn Fn(K) -> BoxFuture<'static, SyncResult<K>> + Send + Sync>;

/// A [`Lifecycle`] assembled from individual closures.
///
/// Hooks left unset report themselves absent through `has_create` and
/// `has_finalize`, so a change-only lifecycle never stamps a finalizer.
pub struct LifecycleDelegate<K> {
    create: Option<HookFn<K>>,
    change: Option<HookFn<K>>,
    remove: Option<HookFn<K>>,
}

impl<K> Default for LifecycleDelegate<K> {
    fn default() -> Self {
        Self {
            create: None,
            change: None,
            remove: None,
        }
    }
}

impl<K: Resource> LifecycleDelegate<K> {
    /// A delegate with no hooks set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the create hook.
    pub fn with_create<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SyncResult<K>> + Send + 'static,
    {
        self.create = Some(Arc::new(move |obj| f(obj).boxed()));
        self
    }

    /// Set the change hook.
    pub fn with_change<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SyncResult<K>> + Send + 'static,
    {
        self.change = Some(Arc::new(move |obj| f(obj).boxed()));
        self
    }

    /// Set the remove hook.
    pub fn with_remove<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SyncResult<K>> + Send + 'static,
    {
        self.remove = Some(Arc::new(move |obj| f(obj).boxed()));
        self
    }
}

#[async_trait]
impl<K: Resource> Lifecycle<K> for LifecycleDelegate<K> {
    async fn create(&self, obj: K) -> SyncResult<K> {
        match &self.create {
            Some(f) => f(obj).await,
            None => Ok(None),
        }
    }

    async fn remove(&self, obj: K) -> SyncResult<K> {
        match &self.remove {
            Some(f) => f(obj).await,
            None => Ok(None),
        }
    }

    async fn updated(&self, obj: K) -> SyncResult<K> {
        match &self.change {
            Some(f) => f(obj).await,
            None => Ok(None),
        }
    }

    fn has_create(&self) -> bool {
        self.create.is_some()
    }

    fn has_finalize(&self) -> bool {
        self.remove.is_some()
    }
}
