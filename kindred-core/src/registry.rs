//! Scope bookkeeping for every resource kind a process works with.
//!
//! The registry is built explicitly at startup from the full descriptor
//! set and shared read-mostly afterwards; the only later mutation is the
//! idempotent cluster-scope marking performed when a cluster-scoped
//! lifecycle is bound. Authorization and admission layers outside this
//! workspace consult it to enumerate known kinds and their scoping.
use std::collections::BTreeSet;

use parking_lot::RwLock;

use crate::{gvk::GroupVersionResource, resource::Resource};

/// Process-wide set of known resource families and their multi-tenant
/// scoping flags.
///
/// "Cluster-scoped" here is the tenant-scoping bookkeeping flag of the
/// original system, unrelated to the namespaced/cluster-scoped API
/// distinction carried by [`ApiResource::namespaced`](crate::ApiResource).
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    all: BTreeSet<GroupVersionResource>,
    cluster_scoped: BTreeSet<GroupVersionResource>,
}

impl ResourceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the full descriptor set in one deterministic
    /// pass. Each entry is a family plus its cluster-scoping flag.
    pub fn with_resources<I>(resources: I) -> Self
    where
        I: IntoIterator<Item = (GroupVersionResource, bool)>,
    {
        let registry = Self::new();
        for (gvr, cluster_scoped) in resources {
            if cluster_scoped {
                registry.put_cluster_scoped(gvr);
            } else {
                registry.put(gvr);
            }
        }
        registry
    }

    /// Record a resource family. Idempotent; entries are never removed.
    pub fn put(&self, gvr: GroupVersionResource) {
        self.inner.write().all.insert(gvr);
    }

    /// Record a resource family and mark it cluster-scoped.
    pub fn put_cluster_scoped(&self, gvr: GroupVersionResource) {
        let mut inner = self.inner.write();
        inner.all.insert(gvr.clone());
        inner.cluster_scoped.insert(gvr);
    }

    /// Convenience for registering a statically known kind.
    pub fn register<K: Resource>(&self) {
        self.put(K::gvr());
    }

    /// Whether the family has been recorded.
    pub fn contains(&self, gvr: &GroupVersionResource) -> bool {
        self.inner.read().all.contains(gvr)
    }

    /// Whether the family has been marked cluster-scoped.
    pub fn is_cluster_scoped(&self, gvr: &GroupVersionResource) -> bool {
        self.inner.read().cluster_scoped.contains(gvr)
    }

    /// Every recorded family, in deterministic order.
    pub fn resources(&self) -> Vec<GroupVersionResource> {
        self.inner.read().all.iter().cloned().collect()
    }
}

// BTreeSet keys need a total order.
impl Ord for GroupVersionResource {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.group, &self.version, &self.resource).cmp(&(
            &other.group,
            &other.version,
            &other.resource,
        ))
    }
}

impl PartialOrd for GroupVersionResource {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widgets() -> GroupVersionResource {
        GroupVersionResource::gvr("example.dev", "v1", "widgets")
    }

    #[test]
    fn put_is_idempotent() {
        let registry = ResourceRegistry::new();
        registry.put(widgets());
        registry.put(widgets());
        assert_eq!(registry.resources().len(), 1);
        assert!(registry.contains(&widgets()));
        assert!(!registry.is_cluster_scoped(&widgets()));
    }

    #[test]
    fn cluster_scoped_marks_both_sets() {
        let registry = ResourceRegistry::new();
        registry.put_cluster_scoped(widgets());
        assert!(registry.contains(&widgets()));
        assert!(registry.is_cluster_scoped(&widgets()));
    }

    #[test]
    fn built_from_descriptor_set() {
        let registry = ResourceRegistry::with_resources([
            (GroupVersionResource::gvr("example.dev", "v1", "widgets"), false),
            (GroupVersionResource::gvr("example.dev", "v1", "gadgets"), true),
        ]);
        assert_eq!(registry.resources().len(), 2);
        assert!(registry.is_cluster_scoped(&GroupVersionResource::gvr(
            "example.dev",
            "v1",
            "gadgets"
        )));
    }
}
