//! Shared object caches fed by a watch.
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;

use kindred_core::DynamicObject;

/// A single cache mutation, as observed on the watch.
pub enum Event {
    /// An object was added or updated
    Applied(Arc<DynamicObject>),
    /// An object was deleted
    Deleted(Arc<DynamicObject>),
    /// The watch restarted with a full relist
    Restarted(Vec<Arc<DynamicObject>>),
}

/// Extractor for a named index. Returns every index value the object
/// should be findable under.
pub type IndexFunc = Arc<dyn Fn(&DynamicObject) -> Vec<String> + Send + Sync>;

#[derive(Default)]
struct Shared {
    objects: AHashMap<String, Arc<DynamicObject>>,
    // index name -> index value -> object keys
    indices: AHashMap<String, AHashMap<String, AHashSet<String>>>,
}

struct Inner {
    shared: RwLock<Shared>,
    indexers: RwLock<Vec<(String, IndexFunc)>>,
}

/// The cache key for an object, `{namespace}/{name}` for namespaced
/// objects and plain `{name}` otherwise.
pub fn store_key(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{ns}/{name}"),
        _ => name.to_string(),
    }
}

/// The cache key of `obj`, derived from its metadata.
pub fn object_key(obj: &DynamicObject) -> String {
    store_key(
        obj.metadata.namespace.as_deref(),
        obj.metadata.name.as_deref().unwrap_or_default(),
    )
}

/// A writable store handle.
///
/// Exclusive to one watch loop; `Restarted` events clobber the whole
/// state, so a single writer must own the feed.
pub struct Writer {
    inner: Arc<Inner>,
}

impl Default for Writer {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: RwLock::new(Shared::default()),
                indexers: RwLock::new(Vec::new()),
            }),
        }
    }
}

impl Writer {
    /// Return a read handle to the store.
    ///
    /// Multiple read handles may be obtained, by either calling `as_reader`
    /// multiple times, or by calling `Store::clone()` afterwards.
    #[must_use]
    pub fn as_reader(&self) -> Store {
        Store {
            inner: self.inner.clone(),
        }
    }

    /// Applies a single watch event to the store.
    pub fn apply_watcher_event(&mut self, event: &Event) {
        let indexers = self.inner.indexers.read();
        let mut shared = self.inner.shared.write();
        match event {
            Event::Applied(obj) => {
                let key = object_key(obj);
                Self::unindex(&mut shared, &key);
                Self::index(&indexers, &mut shared, &key, obj);
                shared.objects.insert(key, obj.clone());
            }
            Event::Deleted(obj) => {
                let key = object_key(obj);
                Self::unindex(&mut shared, &key);
                shared.objects.remove(&key);
            }
            Event::Restarted(objs) => {
                shared.objects.clear();
                shared.indices.clear();
                for obj in objs {
                    let key = object_key(obj);
                    Self::index(&indexers, &mut shared, &key, obj);
                    shared.objects.insert(key, obj.clone());
                }
            }
        }
    }

    fn index(indexers: &[(String, IndexFunc)], shared: &mut Shared, key: &str, obj: &DynamicObject) {
        for (name, func) in indexers {
            for value in func(obj) {
                shared
                    .indices
                    .entry(name.clone())
                    .or_default()
                    .entry(value)
                    .or_default()
                    .insert(key.to_string());
            }
        }
    }

    fn unindex(shared: &mut Shared, key: &str) {
        for index in shared.indices.values_mut() {
            for keys in index.values_mut() {
                keys.remove(key);
            }
        }
    }
}

/// A readable cache of objects of one resource family.
///
/// Cloning produces a new reference to the same backing store. Cannot be
/// constructed directly since one writer handle is required, use
/// [`Writer::as_reader`] instead.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// Retrieve the entry referred to by `key`, if it is in the cache.
    ///
    /// Note that this is a cache and may be stale. Deleted objects may
    /// still appear and fresh ones may be missing until the watch
    /// catches up.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<DynamicObject>> {
        self.inner.shared.read().objects.get(key).cloned()
    }

    /// Return a full snapshot of the current values.
    #[must_use]
    pub fn state(&self) -> Vec<Arc<DynamicObject>> {
        self.inner.shared.read().objects.values().cloned().collect()
    }

    /// Register a named index over the cache.
    ///
    /// Objects already present are indexed immediately; later writes keep
    /// the index current.
    pub fn add_indexer(&self, name: &str, func: IndexFunc) {
        let mut indexers = self.inner.indexers.write();
        let mut shared = self.inner.shared.write();
        let objects = shared
            .objects
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>();
        for (key, obj) in objects {
            for value in func(&obj) {
                shared
                    .indices
                    .entry(name.to_string())
                    .or_default()
                    .entry(value)
                    .or_default()
                    .insert(key.clone());
            }
        }
        indexers.push((name.to_string(), func));
    }

    /// All objects whose index `name` produced `value`.
    #[must_use]
    pub fn by_index(&self, name: &str, value: &str) -> Vec<Arc<DynamicObject>> {
        let shared = self.inner.shared.read();
        let Some(keys) = shared.indices.get(name).and_then(|idx| idx.get(value)) else {
            return Vec::new();
        };
        keys.iter()
            .filter_map(|k| shared.objects.get(k).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::{ApiResource, DynamicObject, GroupVersionKind};

    fn resource() -> ApiResource {
        let gvk = GroupVersionKind::gvk("example.dev", "v1", "Widget");
        ApiResource::from_gvk_with_plural(&gvk, "widgets")
    }

    fn obj(ns: &str, name: &str) -> Arc<DynamicObject> {
        let mut o = DynamicObject::new(name, &resource());
        o.metadata.namespace = Some(ns.to_string());
        Arc::new(o)
    }

    #[test]
    fn applied_then_deleted() {
        let mut writer = Writer::default();
        let store = writer.as_reader();
        let o = obj("ns1", "foo");

        writer.apply_watcher_event(&Event::Applied(o.clone()));
        assert!(store.get("ns1/foo").is_some());

        writer.apply_watcher_event(&Event::Deleted(o));
        assert!(store.get("ns1/foo").is_none());
    }

    #[test]
    fn restarted_replaces_state() {
        let mut writer = Writer::default();
        let store = writer.as_reader();
        writer.apply_watcher_event(&Event::Applied(obj("ns1", "old")));
        writer.apply_watcher_event(&Event::Restarted(vec![obj("ns1", "new")]));

        assert!(store.get("ns1/old").is_none());
        assert!(store.get("ns1/new").is_some());
        assert_eq!(store.state().len(), 1);
    }

    #[test]
    fn indexer_tracks_writes() {
        let mut writer = Writer::default();
        let store = writer.as_reader();
        store.add_indexer(
            "by-ns",
            Arc::new(|o: &DynamicObject| {
                o.metadata.namespace.clone().into_iter().collect()
            }),
        );

        writer.apply_watcher_event(&Event::Applied(obj("ns1", "a")));
        writer.apply_watcher_event(&Event::Applied(obj("ns2", "b")));
        assert_eq!(store.by_index("by-ns", "ns1").len(), 1);

        writer.apply_watcher_event(&Event::Deleted(obj("ns1", "a")));
        assert!(store.by_index("by-ns", "ns1").is_empty());
    }

    #[test]
    fn indexer_covers_existing_objects() {
        let mut writer = Writer::default();
        let store = writer.as_reader();
        writer.apply_watcher_event(&Event::Applied(obj("ns1", "a")));

        store.add_indexer(
            "by-ns",
            Arc::new(|o: &DynamicObject| {
                o.metadata.namespace.clone().into_iter().collect()
            }),
        );
        assert_eq!(store.by_index("by-ns", "ns1").len(), 1);
    }
}
