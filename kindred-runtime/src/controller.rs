//! Watch-driven controllers with a shared cache and a keyed work queue.
//!
//! One [`GenericController`] exists per resource family (and namespace
//! binding); every typed [`Controller`] for that family is a view over
//! it. Handlers are registered untyped internally, with the typed
//! adapters doing a checked kind conversion at dispatch time so that
//! multiple kinds' handlers can safely share one queue.
use std::{future::Future, marker::PhantomData, sync::Arc, time::Duration};

use ahash::{AHashMap, AHashSet};
use backon::{BackoffBuilder, ExponentialBuilder};
use futures::{future::BoxFuture, FutureExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use kindred_client::{ClientFactory, ObjectClient};
use kindred_core::{
    params::ListParams, ApiResource, BoxError, DynamicObject, Resource, WatchEvent,
};

use crate::{
    store::{store_key, Event, Store, Writer},
    Error, Lister,
};

/// What a handler did to the object it was called with.
///
/// `Ok(None)` means no change; `Ok(Some(obj))` hands back a modified
/// object. Errors cause the key to be requeued with backoff.
pub type SyncResult<K> = Result<Option<K>, BoxError>;

/// A typed handler invoked with an object's cache key and its current
/// cached state, `None` once the object is gone.
pub type HandlerFn<K> =
    Arc<dyn Fn(String, Option<K>) -> BoxFuture<'static, SyncResult<K>> + Send + Sync>;

/// Predicate consulted on every dispatch of a feature-gated handler.
pub type FeatureGate = Arc<dyn Fn() -> bool + Send + Sync>;

type DynHandlerFn =
    Arc<dyn Fn(String, Option<Arc<DynamicObject>>) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Wrap an async closure as a [`HandlerFn`].
pub fn handler_fn<K, F, Fut>(f: F) -> HandlerFn<K>
where
    F: Fn(String, Option<K>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SyncResult<K>> + Send + 'static,
{
    Arc::new(move |key, obj| f(key, obj).boxed())
}

/// Convert a typed handler into the untyped form the queue dispatches.
///
/// Deletion tombstones (`None`) always reach the handler. A present
/// object only reaches it after a checked kind test; objects of another
/// kind sharing the queue are skipped without error, while an object
/// that claims the right kind but fails to decode surfaces the decode
/// error.
fn typed_adapter<K: Resource>(handler: HandlerFn<K>) -> DynHandlerFn {
    Arc::new(move |key, obj| {
        let handler = handler.clone();
        async move {
            match obj {
                None => handler(key, None).await.map(|_| ()),
                Some(dynobj) => {
                    if !dynobj.is_kind::<K>() {
                        return Ok(());
                    }
                    let typed = (*dynobj).clone().try_parse::<K>().map_err(BoxError::from)?;
                    handler(key, Some(typed)).await.map(|_| ())
                }
            }
        }
        .boxed()
    })
}

/// Like [`typed_adapter`], additionally skipping present objects that do
/// not belong to `cluster`. Tombstones still pass through.
fn cluster_scoped_adapter<K: Resource>(cluster: String, handler: HandlerFn<K>) -> DynHandlerFn {
    Arc::new(move |key, obj| {
        let handler = handler.clone();
        let cluster = cluster.clone();
        async move {
            match obj {
                None => handler(key, None).await.map(|_| ()),
                Some(dynobj) => {
                    if !dynobj.is_kind::<K>() || !object_in_cluster(&cluster, &dynobj) {
                        return Ok(());
                    }
                    let typed = (*dynobj).clone().try_parse::<K>().map_err(BoxError::from)?;
                    handler(key, Some(typed)).await.map(|_| ())
                }
            }
        }
        .boxed()
    })
}

// The gate runs before anything else, including the tombstone check.
fn gated(enabled: FeatureGate, inner: DynHandlerFn) -> DynHandlerFn {
    Arc::new(move |key, obj| {
        if !enabled() {
            return futures::future::ok(()).boxed();
        }
        inner(key, obj)
    })
}

/// Whether `obj` belongs to the named cluster.
///
/// The cluster is read from `clusterName` or `spec.clusterName`, then
/// from the part of `projectName` or `spec.projectName` before the `:`,
/// and finally falls back to the object's namespace.
pub fn object_in_cluster(cluster: &str, obj: &DynamicObject) -> bool {
    cluster_of(obj).as_deref() == Some(cluster)
}

fn cluster_of(obj: &DynamicObject) -> Option<String> {
    let data = &obj.data;
    let spec = data.get("spec");
    for field in [
        data.get("clusterName"),
        spec.and_then(|s| s.get("clusterName")),
    ] {
        if let Some(name) = field.and_then(|v| v.as_str()) {
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    for field in [
        data.get("projectName"),
        spec.and_then(|s| s.get("projectName")),
    ] {
        if let Some((name, _)) = field.and_then(|v| v.as_str()).and_then(|p| p.split_once(':')) {
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    obj.metadata.namespace.clone()
}

struct HandlerEntry {
    name: String,
    token: CancellationToken,
    handler: DynHandlerFn,
}

/// The untyped controller for one resource family.
///
/// Owns the watch, the backing cache and the work queue. Obtained from a
/// [`ControllerFactory`], which guarantees one instance per family and
/// namespace binding.
pub struct GenericController {
    resource: ApiResource,
    namespace: Option<String>,
    client: Arc<dyn ObjectClient>,
    writer: Mutex<Writer>,
    store: Store,
    handlers: RwLock<Vec<HandlerEntry>>,
    queue_tx: mpsc::UnboundedSender<String>,
    queue_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl GenericController {
    fn new(resource: ApiResource, namespace: Option<&str>, client: Arc<dyn ObjectClient>) -> Self {
        let writer = Writer::default();
        let store = writer.as_reader();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            namespace: if resource.namespaced {
                namespace.map(str::to_string)
            } else {
                None
            },
            resource,
            client,
            writer: Mutex::new(writer),
            store,
            handlers: RwLock::new(Vec::new()),
            queue_tx,
            queue_rx: Mutex::new(Some(queue_rx)),
        }
    }

    /// The resource family this controller watches.
    pub fn resource(&self) -> &ApiResource {
        &self.resource
    }

    /// A read handle to the controller's cache.
    pub fn store(&self) -> Store {
        self.store.clone()
    }

    fn add_handler(&self, token: &CancellationToken, name: &str, handler: DynHandlerFn) {
        self.handlers.write().push(HandlerEntry {
            name: name.to_string(),
            token: token.clone(),
            handler,
        });
    }

    /// Schedule a sync for the named object.
    pub fn enqueue(&self, namespace: &str, name: &str) {
        let ns = if namespace.is_empty() { None } else { Some(namespace) };
        let _ = self.queue_tx.send(store_key(ns, name));
    }

    /// Schedule a sync for the named object after a delay.
    pub fn enqueue_after(&self, namespace: &str, name: &str, after: Duration) {
        let ns = if namespace.is_empty() { None } else { Some(namespace) };
        let key = store_key(ns, name);
        let tx = self.queue_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(key);
        });
    }

    fn requeue_after(&self, key: String, after: Duration) {
        let tx = self.queue_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(key);
        });
    }

    async fn dispatch(&self, key: &str) -> Result<(), BoxError> {
        let obj = self.store.get(key);
        let handlers = {
            // registrations die with their token
            let mut entries = self.handlers.write();
            entries.retain(|e| !e.token.is_cancelled());
            entries
                .iter()
                .map(|e| (e.name.clone(), e.handler.clone()))
                .collect::<Vec<_>>()
        };
        let mut failed = None;
        for (name, handler) in handlers {
            if let Err(err) = handler(key.to_string(), obj.clone()).await {
                warn!(
                    resource = %self.resource.gvr(),
                    handler = %name,
                    %key,
                    error = %err,
                    "handler failed"
                );
                failed = Some(err);
            }
        }
        failed.map_or(Ok(()), Err)
    }

    async fn relist(&self) -> Result<(), Error> {
        let list = self
            .client
            .list(self.namespace.as_deref(), &ListParams::default())
            .await?;
        let objs = list.items.into_iter().map(Arc::new).collect::<Vec<_>>();
        let keys = objs
            .iter()
            .map(|o| crate::store::object_key(o))
            .collect::<Vec<_>>();
        // Objects that vanished while the watch was down still owe
        // their handlers a tombstone.
        let gone = {
            let fresh = keys.iter().map(String::as_str).collect::<AHashSet<_>>();
            self.store
                .state()
                .iter()
                .map(|o| crate::store::object_key(o))
                .filter(|k| !fresh.contains(k.as_str()))
                .collect::<Vec<_>>()
        };
        self.writer.lock().apply_watcher_event(&Event::Restarted(objs));
        for key in gone.into_iter().chain(keys) {
            let _ = self.queue_tx.send(key);
        }
        Ok(())
    }

    // Backends may fan out a wider stream than the namespace binding.
    fn in_scope(&self, obj: &DynamicObject) -> bool {
        match self.namespace.as_deref() {
            Some(ns) if self.resource.namespaced => obj.metadata.namespace.as_deref() == Some(ns),
            _ => true,
        }
    }

    fn absorb(&self, event: WatchEvent<DynamicObject>) -> Option<String> {
        match event {
            WatchEvent::Added(obj) | WatchEvent::Modified(obj) => {
                if !self.in_scope(&obj) {
                    return None;
                }
                let obj = Arc::new(obj);
                let key = crate::store::object_key(&obj);
                self.writer.lock().apply_watcher_event(&Event::Applied(obj));
                Some(key)
            }
            WatchEvent::Deleted(obj) => {
                if !self.in_scope(&obj) {
                    return None;
                }
                let obj = Arc::new(obj);
                let key = crate::store::object_key(&obj);
                self.writer.lock().apply_watcher_event(&Event::Deleted(obj));
                Some(key)
            }
            WatchEvent::Bookmark(_) => None,
            WatchEvent::Error(e) => {
                warn!(resource = %self.resource.gvr(), error = %e, "watch error event");
                None
            }
        }
    }

    /// Run the controller until `token` is cancelled.
    ///
    /// Lists once to seed the cache, enqueues everything, then follows
    /// the watch. Keys whose handlers fail are requeued with exponential
    /// backoff; the backoff resets once the key syncs cleanly. A second
    /// call returns [`Error::AlreadyStarted`].
    pub async fn run(self: Arc<Self>, token: CancellationToken) -> Result<(), Error> {
        let mut queue_rx = self
            .queue_rx
            .lock()
            .take()
            .ok_or_else(|| Error::AlreadyStarted(self.resource.gvr().to_string()))?;
        let mut backoffs: AHashMap<String, backon::ExponentialBackoff> = AHashMap::new();

        'relist: loop {
            if token.is_cancelled() {
                return Ok(());
            }
            self.relist().await?;
            let mut watch = self
                .client
                .watch(self.namespace.as_deref(), &ListParams::default())
                .await?;
            debug!(resource = %self.resource.gvr(), "controller started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => return Ok(()),
                    event = watch.next() => {
                        match event {
                            Some(Ok(ev)) => {
                                if let Some(key) = self.absorb(ev) {
                                    let _ = self.queue_tx.send(key);
                                }
                            }
                            Some(Err(err)) => {
                                warn!(resource = %self.resource.gvr(), error = %err, "watch stream error");
                            }
                            None => {
                                tokio::time::sleep(Duration::from_secs(1)).await;
                                continue 'relist;
                            }
                        }
                    }
                    key = queue_rx.recv() => {
                        // The controller holds a sender, so the queue never closes.
                        let Some(key) = key else { return Ok(()) };
                        match self.dispatch(&key).await {
                            Ok(()) => {
                                backoffs.remove(&key);
                            }
                            Err(_) => {
                                let backoff = backoffs
                                    .entry(key.clone())
                                    .or_insert_with(|| retry_backoff().build());
                                if let Some(delay) = backoff.next() {
                                    self.requeue_after(key, delay);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn retry_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(30))
        .without_max_times()
}

/// Creates and caches [`GenericController`]s, one per resource family
/// and namespace binding.
pub struct ControllerFactory {
    clients: Arc<dyn ClientFactory>,
    controllers: Mutex<AHashMap<String, Arc<GenericController>>>,
}

impl ControllerFactory {
    /// Create a factory drawing object clients from `clients`.
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self {
            clients,
            controllers: Mutex::new(AHashMap::new()),
        }
    }

    /// The controller for `resource` bound to `namespace`, created on
    /// first use.
    pub fn for_resource(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
    ) -> Arc<GenericController> {
        let key = format!("{}@{}", resource.gvr(), namespace.unwrap_or_default());
        let mut controllers = self.controllers.lock();
        controllers
            .entry(key)
            .or_insert_with(|| {
                let client = self.clients.object_client(resource);
                Arc::new(GenericController::new(resource.clone(), namespace, client))
            })
            .clone()
    }

    /// Spawn the run loop of every controller created so far.
    ///
    /// Controllers created after this call must be started separately.
    pub fn start(&self, token: &CancellationToken) {
        let controllers = self
            .controllers
            .lock()
            .values()
            .cloned()
            .collect::<Vec<_>>();
        for controller in controllers {
            let token = token.clone();
            let gvr = controller.resource().gvr().to_string();
            tokio::spawn(async move {
                if let Err(err) = controller.run(token).await {
                    warn!(resource = %gvr, error = %err, "controller stopped");
                }
            });
        }
    }
}

/// A typed view over a [`GenericController`].
pub struct Controller<K> {
    generic: Arc<GenericController>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for Controller<K> {
    fn clone(&self) -> Self {
        Self {
            generic: self.generic.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: Resource> Controller<K> {
    /// Wrap the untyped controller for `K`'s family.
    pub fn new(generic: Arc<GenericController>) -> Self {
        Self {
            generic,
            _kind: PhantomData,
        }
    }

    /// The untyped controller this view delegates to.
    pub fn generic(&self) -> &Arc<GenericController> {
        &self.generic
    }

    /// The shared cache for this controller's family.
    pub fn store(&self) -> Store {
        self.generic.store()
    }

    /// A lister over the controller's cache, bound to the controller's
    /// namespace.
    pub fn lister(&self) -> Lister<K> {
        Lister::new(self.generic.store(), self.generic.namespace.as_deref())
    }

    /// Register `handler` under `name` for every sync of this family.
    /// The registration lives until `token` is cancelled.
    pub fn add_handler(&self, token: &CancellationToken, name: &str, handler: HandlerFn<K>) {
        self.generic.add_handler(token, name, typed_adapter(handler));
    }

    /// Register a handler that only runs while `enabled` returns true.
    /// The gate is consulted on every dispatch.
    pub fn add_feature_handler(
        &self,
        token: &CancellationToken,
        enabled: FeatureGate,
        name: &str,
        handler: HandlerFn<K>,
    ) {
        self.generic
            .add_handler(token, name, gated(enabled, typed_adapter(handler)));
    }

    /// Register a handler that only sees objects belonging to `cluster`.
    pub fn add_cluster_scoped_handler(
        &self,
        token: &CancellationToken,
        name: &str,
        cluster: &str,
        handler: HandlerFn<K>,
    ) {
        self.generic
            .add_handler(token, name, cluster_scoped_adapter(cluster.to_string(), handler));
    }

    /// Register a feature-gated handler that only sees objects belonging
    /// to `cluster`.
    pub fn add_cluster_scoped_feature_handler(
        &self,
        token: &CancellationToken,
        enabled: FeatureGate,
        name: &str,
        cluster: &str,
        handler: HandlerFn<K>,
    ) {
        self.generic.add_handler(
            token,
            name,
            gated(enabled, cluster_scoped_adapter(cluster.to_string(), handler)),
        );
    }

    /// Schedule a sync for the named object.
    pub fn enqueue(&self, namespace: &str, name: &str) {
        self.generic.enqueue(namespace, name);
    }

    /// Schedule a sync for the named object after a delay.
    pub fn enqueue_after(&self, namespace: &str, name: &str, after: Duration) {
        self.generic.enqueue_after(namespace, name, after);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use kindred_core::{impl_resource, new_object, ObjectMeta, TypeMeta};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Widget {
        #[serde(flatten)]
        types: TypeMeta,
        #[serde(default)]
        metadata: ObjectMeta,
        #[serde(default)]
        spec: serde_json::Value,
    }
    impl_resource!(Widget, "example.dev", "v1", "Widget", "widgets", "widget", namespaced: true);

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Gadget {
        #[serde(flatten)]
        types: TypeMeta,
        #[serde(default)]
        metadata: ObjectMeta,
    }
    impl_resource!(Gadget, "example.dev", "v1", "Gadget", "gadgets", "gadget", namespaced: true);

    fn counting_handler(hits: Arc<AtomicUsize>) -> HandlerFn<Widget> {
        handler_fn(move |_key, _obj: Option<Widget>| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        })
    }

    fn erased(obj: &Widget) -> Arc<DynamicObject> {
        Arc::new(DynamicObject::from_resource(obj).unwrap())
    }

    #[tokio::test]
    async fn wrong_kind_is_skipped_without_error() {
        let hits = Arc::new(AtomicUsize::new(0));
        let adapter = typed_adapter::<Widget>(counting_handler(hits.clone()));

        let gadget = DynamicObject::from_resource(&new_object("ns1", "g", Gadget::default())).unwrap();
        let outcome = adapter("ns1/g".to_string(), Some(Arc::new(gadget))).await;

        assert!(outcome.is_ok());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tombstone_reaches_handler() {
        let seen_none = Arc::new(AtomicUsize::new(0));
        let counter = seen_none.clone();
        let adapter = typed_adapter::<Widget>(handler_fn(move |_key, obj: Option<Widget>| {
            let counter = counter.clone();
            async move {
                if obj.is_none() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                Ok(None)
            }
        }));

        adapter("ns1/gone".to_string(), None).await.unwrap();
        assert_eq!(seen_none.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn feature_gate_runs_before_everything() {
        let hits = Arc::new(AtomicUsize::new(0));
        let adapter = gated(
            Arc::new(|| false),
            typed_adapter::<Widget>(counting_handler(hits.clone())),
        );

        // even tombstones are suppressed while the gate is closed
        adapter("ns1/x".to_string(), None).await.unwrap();
        adapter(
            "ns1/x".to_string(),
            Some(erased(&new_object("ns1", "x", Widget::default()))),
        )
        .await
        .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cluster_scope_filters_foreign_objects() {
        let hits = Arc::new(AtomicUsize::new(0));
        let adapter = cluster_scoped_adapter::<Widget>(
            "c-local".to_string(),
            counting_handler(hits.clone()),
        );

        let mut foreign = new_object("other-ns", "w", Widget::default());
        foreign.spec = json!({"clusterName": "c-other"});
        adapter("other-ns/w".to_string(), Some(erased(&foreign))).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let mut local = new_object("ns1", "w", Widget::default());
        local.spec = json!({"clusterName": "c-local"});
        adapter("ns1/w".to_string(), Some(erased(&local))).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // tombstones bypass the cluster check
        adapter("ns1/w".to_string(), None).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_registration_stops_dispatching() {
        let factory =
            ControllerFactory::new(Arc::new(kindred_client::MemoryClientFactory::new()));
        let generic = factory.for_resource(&ApiResource::erase::<Widget>(), Some("ns1"));
        let controller: Controller<Widget> = Controller::new(generic.clone());

        let hits = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();
        controller.add_handler(&token, "counting", counting_handler(hits.clone()));

        generic.dispatch("ns1/x").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        token.cancel();
        generic.dispatch("ns1/x").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn absorb_drops_foreign_namespace_events() {
        let factory =
            ControllerFactory::new(Arc::new(kindred_client::MemoryClientFactory::new()));
        let generic = factory.for_resource(&ApiResource::erase::<Widget>(), Some("ns1"));
        let controller: Controller<Widget> = Controller::new(generic.clone());

        let foreign =
            DynamicObject::from_resource(&new_object("ns2", "w", Widget::default())).unwrap();
        assert_eq!(generic.absorb(WatchEvent::Added(foreign)), None);
        assert!(controller.store().get("ns2/w").is_none());

        let local =
            DynamicObject::from_resource(&new_object("ns1", "w", Widget::default())).unwrap();
        assert_eq!(
            generic.absorb(WatchEvent::Added(local)),
            Some("ns1/w".to_string())
        );
        assert!(controller.store().get("ns1/w").is_some());
    }

    #[tokio::test]
    async fn relist_tombstones_vanished_objects() {
        let factory =
            ControllerFactory::new(Arc::new(kindred_client::MemoryClientFactory::new()));
        let generic = factory.for_resource(&ApiResource::erase::<Widget>(), Some("ns1"));

        let obj =
            DynamicObject::from_resource(&new_object("ns1", "w", Widget::default())).unwrap();
        generic
            .client
            .create(Some("ns1"), obj, &Default::default())
            .await
            .unwrap();
        generic.relist().await.unwrap();
        assert!(generic.store().get("ns1/w").is_some());

        generic
            .client
            .delete(Some("ns1"), "w", &Default::default())
            .await
            .unwrap();
        generic.relist().await.unwrap();
        assert!(generic.store().get("ns1/w").is_none());

        let mut rx = generic.queue_rx.lock().take().unwrap();
        let mut keys = Vec::new();
        while let Ok(key) = rx.try_recv() {
            keys.push(key);
        }
        // once from the first relist, once as the tombstone
        assert_eq!(keys, vec!["ns1/w".to_string(), "ns1/w".to_string()]);
    }

    #[test]
    fn cluster_resolution_order() {
        let resource = ApiResource::erase::<Widget>();
        let top = DynamicObject::new("a", &resource).data(json!({"clusterName": "c1"}));
        assert!(object_in_cluster("c1", &top));

        let project = DynamicObject::new("b", &resource).data(json!({"projectName": "c2:p1"}));
        assert!(object_in_cluster("c2", &project));
        assert!(!object_in_cluster("p1", &project));

        let by_ns = DynamicObject::new("c", &resource).within("c3");
        assert!(object_in_cluster("c3", &by_ns));
        assert!(!object_in_cluster("c4", &by_ns));
    }
}
