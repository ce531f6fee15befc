//! Cache-backed read access for one kind.
use std::{collections::BTreeMap, marker::PhantomData};

use kindred_core::{ErrorResponse, Resource, Selector};

use crate::{
    store::{store_key, Store},
    Error,
};

/// Reads objects of kind `K` out of a shared cache instead of the API.
///
/// A lister never performs I/O; it sees whatever the controller's watch
/// has delivered so far. An empty `namespace` argument defaults to the
/// namespace the lister was created with.
pub struct Lister<K> {
    store: Store,
    namespace: Option<String>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for Lister<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            namespace: self.namespace.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: Resource> Lister<K> {
    /// Wrap a cache, binding lookups to `namespace` when `K` is namespaced.
    pub fn new(store: Store, namespace: Option<&str>) -> Self {
        let namespace = if K::NAMESPACED {
            namespace.map(str::to_string)
        } else {
            None
        };
        Self {
            store,
            namespace,
            _kind: PhantomData,
        }
    }

    fn resolve_namespace<'a>(&'a self, requested: &'a str) -> Option<&'a str> {
        if !K::NAMESPACED {
            return None;
        }
        if requested.is_empty() {
            self.namespace.as_deref()
        } else {
            Some(requested)
        }
    }

    /// Fetch one cached object by namespace and name.
    ///
    /// A cache miss produces the same NotFound response an API get would,
    /// carrying the kind's group and resource identity.
    pub fn get(&self, namespace: &str, name: &str) -> Result<K, Error> {
        let key = store_key(self.resolve_namespace(namespace), name);
        match self.store.get(&key) {
            Some(obj) => Ok((*obj).clone().try_parse::<K>()?),
            None => Err(Error::Client(kindred_client::Error::Api(
                ErrorResponse::not_found(K::GROUP, K::PLURAL, &key),
            ))),
        }
    }

    /// All cached objects in `namespace` matching `selector`.
    ///
    /// An empty `namespace` lists the bound namespace, or everything when
    /// the lister is unbound.
    pub fn list(&self, namespace: &str, selector: &Selector) -> Result<Vec<K>, Error> {
        let ns = self.resolve_namespace(namespace);
        let empty = BTreeMap::new();
        let mut found = Vec::new();
        for obj in self.store.state() {
            if let Some(ns) = ns {
                if obj.metadata.namespace.as_deref() != Some(ns) {
                    continue;
                }
            }
            if !selector.matches(obj.metadata.labels.as_ref().unwrap_or(&empty)) {
                continue;
            }
            found.push((*obj).clone().try_parse::<K>()?);
        }
        Ok(found)
    }
}
