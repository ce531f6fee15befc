//! An in-process [`ObjectClient`] with apiserver-like semantics.
//!
//! Backs tests and local development: create/update conflicts, NotFound
//! responses, label-selector filtering, finalizer-aware deletion and a
//! broadcast watch channel all behave like the real thing, minus
//! anything wire-level. Watch subscribers only observe events emitted
//! after they subscribe; callers that need a consistent snapshot should
//! list first, as the controller loop does.
use std::{collections::BTreeMap, sync::Arc};

use async_broadcast::{InactiveReceiver, Sender};
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use kindred_core::{
    params::{DeleteParams, GetParams, ListParams, Patch, PatchParams, PostParams},
    ApiResource, DynamicObject, ErrorResponse, ListMeta, ObjectList, Selector, WatchEvent,
};

use crate::{
    object_client::{ClientFactory, ObjectClient, WatchStream},
    Error, Result,
};

const WATCH_CAPACITY: usize = 256;

/// In-memory object store for one resource family.
pub struct MemoryObjectClient {
    resource: ApiResource,
    state: RwLock<State>,
    events: Sender<WatchEvent<DynamicObject>>,
    // Keeps the channel open while no watcher is subscribed.
    _idle: InactiveReceiver<WatchEvent<DynamicObject>>,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<String, DynamicObject>,
    revision: u64,
}

impl State {
    fn next_revision(&mut self) -> String {
        self.revision += 1;
        self.revision.to_string()
    }
}

impl MemoryObjectClient {
    /// Create an empty store for `resource`.
    pub fn new(resource: ApiResource) -> Self {
        let (mut events, rx) = async_broadcast::broadcast(WATCH_CAPACITY);
        events.set_overflow(true);
        Self {
            resource,
            state: RwLock::new(State::default()),
            events,
            _idle: rx.deactivate(),
        }
    }

    fn key(&self, namespace: Option<&str>, name: &str) -> String {
        match namespace {
            Some(ns) if self.resource.namespaced && !ns.is_empty() => format!("{ns}/{name}"),
            _ => name.to_string(),
        }
    }

    fn not_found(&self, name: &str) -> Error {
        Error::Api(ErrorResponse::not_found(
            &self.resource.group,
            &self.resource.plural,
            name,
        ))
    }

    fn broadcast(&self, event: WatchEvent<DynamicObject>) {
        // Dropped when the ring is full; watchers are best-effort here.
        let _ = self.events.try_broadcast(event);
    }

    fn selected(&self, namespace: Option<&str>, lp: &ListParams) -> Result<Vec<DynamicObject>> {
        let selector: Selector = match &lp.label_selector {
            Some(raw) => raw
                .parse()
                .map_err(|e: kindred_core::labels::ParseSelectorError| Error::Service(e.into()))?,
            None => Selector::default(),
        };
        let state = self.state.read();
        let mut out = Vec::new();
        for obj in state.objects.values() {
            if self.resource.namespaced {
                if let Some(ns) = namespace {
                    if !ns.is_empty() && obj.metadata.namespace.as_deref() != Some(ns) {
                        continue;
                    }
                }
            }
            let empty = BTreeMap::new();
            let labels = obj.metadata.labels.as_ref().unwrap_or(&empty);
            if !selector.matches(labels) {
                continue;
            }
            out.push(obj.clone());
        }
        Ok(out)
    }

    // Deletion honoring finalizers: objects with finalizers get a deletion
    // timestamp and a Modified event; the actual removal happens once the
    // last finalizer is gone.
    fn delete_inner(&self, key: &str, name: &str) -> Result<()> {
        let mut state = self.state.write();
        let Some(obj) = state.objects.get(key).cloned() else {
            return Err(self.not_found(name));
        };
        let has_finalizers = obj
            .metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| !f.is_empty());
        if has_finalizers && obj.metadata.deletion_timestamp.is_none() {
            let mut doomed = obj;
            doomed.metadata.deletion_timestamp = Some(now());
            doomed.metadata.resource_version = Some(state.next_revision());
            state.objects.insert(key.to_string(), doomed.clone());
            drop(state);
            debug!(%key, resource = %self.resource.plural, "delete deferred on finalizers");
            self.broadcast(WatchEvent::Modified(doomed));
        } else {
            state.objects.remove(key);
            drop(state);
            debug!(%key, resource = %self.resource.plural, "deleted object");
            self.broadcast(WatchEvent::Deleted(obj));
        }
        Ok(())
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn name_of(obj: &DynamicObject) -> Result<String> {
    obj.metadata
        .name
        .clone()
        .ok_or_else(|| Error::Service("object has no name".into()))
}

// RFC 7386 style merge; both patch flavors collapse to this in memory.
fn merge_value(base: &mut serde_json::Value, patch: &serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(patch_map)) => {
            for (k, v) in patch_map {
                if v.is_null() {
                    base_map.remove(k);
                } else {
                    merge_value(base_map.entry(k.clone()).or_insert(serde_json::Value::Null), v);
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

#[async_trait]
impl ObjectClient for MemoryObjectClient {
    fn resource(&self) -> &ApiResource {
        &self.resource
    }

    async fn create(
        &self,
        namespace: Option<&str>,
        mut obj: DynamicObject,
        _pp: &PostParams,
    ) -> Result<DynamicObject> {
        let name = name_of(&obj)?;
        if self.resource.namespaced {
            if obj.metadata.namespace.is_none() {
                obj.metadata.namespace = namespace.map(str::to_string);
            }
        } else {
            obj.metadata.namespace = None;
        }
        let key = self.key(obj.metadata.namespace.as_deref(), &name);

        let mut state = self.state.write();
        if state.objects.contains_key(&key) {
            return Err(Error::Api(ErrorResponse::already_exists(
                &self.resource.group,
                &self.resource.plural,
                &name,
            )));
        }
        obj.types = Some(kindred_core::TypeMeta::new(
            &self.resource.api_version,
            &self.resource.kind,
        ));
        obj.metadata.uid = Some(format!("uid-{}", state.revision + 1));
        obj.metadata.creation_timestamp = Some(now());
        obj.metadata.resource_version = Some(state.next_revision());
        state.objects.insert(key, obj.clone());
        drop(state);

        debug!(name = %name, resource = %self.resource.plural, "created object");
        self.broadcast(WatchEvent::Added(obj.clone()));
        Ok(obj)
    }

    async fn get(
        &self,
        namespace: Option<&str>,
        name: &str,
        _gp: &GetParams,
    ) -> Result<DynamicObject> {
        let key = self.key(namespace, name);
        self.state
            .read()
            .objects
            .get(&key)
            .cloned()
            .ok_or_else(|| self.not_found(name))
    }

    async fn update(
        &self,
        namespace: Option<&str>,
        mut obj: DynamicObject,
        _pp: &PostParams,
    ) -> Result<DynamicObject> {
        let name = name_of(&obj)?;
        let ns = obj
            .metadata
            .namespace
            .clone()
            .or_else(|| namespace.map(str::to_string));
        let key = self.key(ns.as_deref(), &name);

        let mut state = self.state.write();
        let Some(existing) = state.objects.get(&key).cloned() else {
            return Err(self.not_found(&name));
        };
        // Server-owned fields cannot be overwritten by writers.
        obj.metadata.uid = existing.metadata.uid.clone();
        obj.metadata.creation_timestamp = existing.metadata.creation_timestamp.clone();
        obj.metadata.deletion_timestamp = existing.metadata.deletion_timestamp.clone();
        obj.metadata.resource_version = Some(state.next_revision());

        // Once deletion is pending and the last finalizer is removed the
        // object goes away instead of persisting.
        let finalizers_empty = obj
            .metadata
            .finalizers
            .as_ref()
            .map_or(true, |f| f.is_empty());
        if obj.metadata.deletion_timestamp.is_some() && finalizers_empty {
            state.objects.remove(&key);
            drop(state);
            self.broadcast(WatchEvent::Deleted(obj.clone()));
            return Ok(obj);
        }

        state.objects.insert(key, obj.clone());
        drop(state);
        self.broadcast(WatchEvent::Modified(obj.clone()));
        Ok(obj)
    }

    async fn update_status(
        &self,
        namespace: Option<&str>,
        obj: DynamicObject,
        _pp: &PostParams,
    ) -> Result<DynamicObject> {
        let name = name_of(&obj)?;
        let ns = obj
            .metadata
            .namespace
            .clone()
            .or_else(|| namespace.map(str::to_string));
        let key = self.key(ns.as_deref(), &name);

        let mut state = self.state.write();
        let Some(mut existing) = state.objects.get(&key).cloned() else {
            return Err(self.not_found(&name));
        };
        let status = obj.data.get("status").cloned().unwrap_or(serde_json::Value::Null);
        if let serde_json::Value::Object(map) = &mut existing.data {
            if status.is_null() {
                map.remove("status");
            } else {
                map.insert("status".to_string(), status);
            }
        }
        existing.metadata.resource_version = Some(state.next_revision());
        state.objects.insert(key, existing.clone());
        drop(state);
        self.broadcast(WatchEvent::Modified(existing.clone()));
        Ok(existing)
    }

    async fn delete(&self, namespace: Option<&str>, name: &str, _dp: &DeleteParams) -> Result<()> {
        let key = self.key(namespace, name);
        self.delete_inner(&key, name)
    }

    async fn list(
        &self,
        namespace: Option<&str>,
        lp: &ListParams,
    ) -> Result<ObjectList<DynamicObject>> {
        let items = self.selected(namespace, lp)?;
        let revision = self.state.read().revision.to_string();
        Ok(ObjectList {
            metadata: ListMeta {
                resource_version: Some(revision),
                continue_token: None,
            },
            items,
        })
    }

    async fn watch(&self, namespace: Option<&str>, lp: &ListParams) -> Result<WatchStream> {
        let selector: Selector = match &lp.label_selector {
            Some(raw) => raw
                .parse()
                .map_err(|e: kindred_core::labels::ParseSelectorError| Error::Service(e.into()))?,
            None => Selector::default(),
        };
        let ns = namespace
            .filter(|ns| self.resource.namespaced && !ns.is_empty())
            .map(str::to_string);
        let rx = self.events.new_receiver();
        Ok(rx
            .filter(move |event| {
                let keep = match event {
                    WatchEvent::Added(obj)
                    | WatchEvent::Modified(obj)
                    | WatchEvent::Deleted(obj) => {
                        let in_namespace = match &ns {
                            Some(ns) => obj.metadata.namespace.as_deref() == Some(ns.as_str()),
                            None => true,
                        };
                        let empty = BTreeMap::new();
                        let labels = obj.metadata.labels.as_ref().unwrap_or(&empty);
                        in_namespace && selector.matches(labels)
                    }
                    WatchEvent::Bookmark(_) | WatchEvent::Error(_) => true,
                };
                futures::future::ready(keep)
            })
            .map(Ok)
            .boxed())
    }

    async fn patch(
        &self,
        namespace: Option<&str>,
        name: &str,
        patch: &Patch,
        _pp: &PatchParams,
    ) -> Result<DynamicObject> {
        let key = self.key(namespace, name);
        let mut state = self.state.write();
        let Some(existing) = state.objects.get(&key).cloned() else {
            return Err(self.not_found(name));
        };
        let mut value = serde_json::to_value(&existing).map_err(Error::SerdeError)?;
        let payload = match patch {
            Patch::Merge(v) | Patch::Strategic(v) => v,
        };
        merge_value(&mut value, payload);
        let mut patched: DynamicObject =
            serde_json::from_value(value).map_err(Error::SerdeError)?;
        patched.metadata.uid = existing.metadata.uid.clone();
        patched.metadata.resource_version = Some(state.next_revision());
        state.objects.insert(key, patched.clone());
        drop(state);
        self.broadcast(WatchEvent::Modified(patched.clone()));
        Ok(patched)
    }

    async fn delete_collection(
        &self,
        namespace: Option<&str>,
        _dp: &DeleteParams,
        lp: &ListParams,
    ) -> Result<()> {
        let doomed = self.selected(namespace, lp)?;
        for obj in doomed {
            if let Some(name) = obj.metadata.name.as_deref() {
                let key = self.key(obj.metadata.namespace.as_deref(), name);
                self.delete_inner(&key, name)?;
            }
        }
        Ok(())
    }
}

/// [`ClientFactory`] handing out shared [`MemoryObjectClient`]s.
///
/// Clients are cached per family so a typed client and the controller
/// watching the same kind observe one store.
#[derive(Default)]
pub struct MemoryClientFactory {
    clients: Mutex<BTreeMap<String, Arc<MemoryObjectClient>>>,
}

impl MemoryClientFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientFactory for MemoryClientFactory {
    fn object_client(&self, resource: &ApiResource) -> Arc<dyn ObjectClient> {
        let key = format!("{}/{}", resource.api_version, resource.plural);
        let mut clients = self.clients.lock();
        clients
            .entry(key)
            .or_insert_with(|| Arc::new(MemoryObjectClient::new(resource.clone())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::{impl_resource, new_object, ObjectMeta, TypeMeta};
    use serde::{Deserialize, Serialize};

    use crate::TypedClient;

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

    fn typed(ns: Option<&str>) -> TypedClient<Widget> {
        let factory = MemoryClientFactory::new();
        let oc = factory.object_client(&ApiResource::erase::<Widget>());
        TypedClient::new(oc, ns)
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let client = typed(Some("ns1"));
        let mut w = new_object("ns1", "foo", Widget::default());
        w.spec = serde_json::json!({"size": 1});

        let created = client.create(&w).await.unwrap();
        assert!(created.metadata.resource_version.is_some());
        assert!(created.metadata.uid.is_some());

        let dup = client.create(&w).await;
        assert!(matches!(dup, Err(Error::Api(e)) if e.code == 409));

        let mut changed = created.clone();
        changed.spec = serde_json::json!({"size": 2});
        let updated = client.update(&changed).await.unwrap();
        assert_ne!(
            updated.metadata.resource_version,
            created.metadata.resource_version
        );

        let fetched = client.get("foo", &Default::default()).await.unwrap();
        assert_eq!(fetched.spec, serde_json::json!({"size": 2}));

        client.delete("foo", &Default::default()).await.unwrap();
        let missing = client.get("foo", &Default::default()).await;
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_filters_namespace_and_labels() {
        let factory = MemoryClientFactory::new();
        let oc = factory.object_client(&ApiResource::erase::<Widget>());
        let ns1: TypedClient<Widget> = TypedClient::new(oc.clone(), Some("ns1"));
        let ns2: TypedClient<Widget> = TypedClient::new(oc, Some("ns2"));

        let mut a = new_object("ns1", "a", Widget::default());
        a.metadata.labels = Some([("app".to_string(), "web".to_string())].into());
        ns1.create(&a).await.unwrap();
        ns1.create(&new_object("ns1", "b", Widget::default()))
            .await
            .unwrap();
        ns2.create(&new_object("ns2", "c", Widget::default()))
            .await
            .unwrap();

        let all_ns1 = ns1.list(&ListParams::default()).await.unwrap();
        assert_eq!(all_ns1.items.len(), 2);

        let web = ns1
            .list(&ListParams::default().labels("app=web"))
            .await
            .unwrap();
        assert_eq!(web.items.len(), 1);
        assert_eq!(web.items[0].metadata.name.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn finalizers_defer_removal() {
        let client = typed(Some("ns1"));
        let mut w = new_object("ns1", "guarded", Widget::default());
        w.metadata.finalizers = Some(vec!["controller.kindred.dev/test".into()]);
        let created = client.create(&w).await.unwrap();

        client.delete("guarded", &Default::default()).await.unwrap();
        let mut pending = client.get("guarded", &Default::default()).await.unwrap();
        assert!(pending.metadata.deletion_timestamp.is_some());

        pending.metadata.finalizers = Some(vec![]);
        client.update(&pending).await.unwrap();
        assert!(client
            .get("guarded", &Default::default())
            .await
            .unwrap_err()
            .is_not_found());
        drop(created);
    }

    #[tokio::test]
    async fn watch_sees_subsequent_events() {
        let client = typed(Some("ns1"));
        let mut stream = client.watch(&ListParams::default()).await.unwrap();

        client
            .create(&new_object("ns1", "w1", Widget::default()))
            .await
            .unwrap();

        match stream.next().await {
            Some(Ok(WatchEvent::Added(w))) => {
                assert_eq!(w.metadata.name.as_deref(), Some("w1"));
            }
            other => panic!("expected Added event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn watch_is_scoped_to_its_namespace() {
        let client = typed(Some("ns1"));
        let mut stream = client.watch(&ListParams::default()).await.unwrap();

        client
            .create(&new_object("ns2", "other", Widget::default()))
            .await
            .unwrap();
        client
            .create(&new_object("ns1", "mine", Widget::default()))
            .await
            .unwrap();

        // the ns2 event never reaches an ns1-bound watcher
        match stream.next().await {
            Some(Ok(WatchEvent::Added(w))) => {
                assert_eq!(w.metadata.namespace.as_deref(), Some("ns1"));
                assert_eq!(w.metadata.name.as_deref(), Some("mine"));
            }
            other => panic!("expected Added event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_status_only_touches_status() {
        let client = typed(Some("ns1"));
        let mut w = new_object("ns1", "s", Widget::default());
        w.spec = serde_json::json!({"size": 5});
        let created = client.create(&w).await.unwrap();

        let mut with_status = created.clone();
        with_status.spec = serde_json::json!({"size": 999});
        let dynobj = DynamicObject::from_resource(&with_status)
            .unwrap()
            .data(serde_json::json!({"spec": {"size": 999}, "status": {"ready": true}}));
        client
            .object_client()
            .update_status(Some("ns1"), dynobj, &Default::default())
            .await
            .unwrap();

        let fetched = client
            .object_client()
            .get(Some("ns1"), "s", &Default::default())
            .await
            .unwrap();
        assert_eq!(fetched.data["spec"]["size"], 5);
        assert_eq!(fetched.data["status"]["ready"], true);
    }
}
