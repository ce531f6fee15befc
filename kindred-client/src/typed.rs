//! Typed per-kind client over the untyped boundary.
use std::{marker::PhantomData, sync::Arc};

use futures::StreamExt;

use kindred_core::{
    params::{DeleteParams, GetParams, ListParams, Patch, PatchParams, PostParams},
    DynamicObject, ObjectList, Resource, WatchEvent,
};

use crate::{object_client::ObjectClient, Result};

/// A typed client for one resource kind, optionally bound to a namespace.
///
/// Every operation delegates to the underlying [`ObjectClient`] with the
/// same arguments and converts the result with a checked parse; errors
/// from the transport pass through unchanged. Instances are cheap handles
/// over the shared object client and can be cloned freely.
pub struct TypedClient<K> {
    object_client: Arc<dyn ObjectClient>,
    namespace: Option<String>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for TypedClient<K> {
    fn clone(&self) -> Self {
        Self {
            object_client: self.object_client.clone(),
            namespace: self.namespace.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: Resource> TypedClient<K> {
    /// Wrap an object client, binding reads and writes to `namespace`
    /// when the kind is namespaced.
    pub fn new(object_client: Arc<dyn ObjectClient>, namespace: Option<&str>) -> Self {
        let namespace = if K::NAMESPACED {
            namespace.map(str::to_string)
        } else {
            None
        };
        Self {
            object_client,
            namespace,
            _kind: PhantomData,
        }
    }

    /// The untyped client this typed client delegates to
    pub fn object_client(&self) -> &Arc<dyn ObjectClient> {
        &self.object_client
    }

    /// The namespace this client is bound to, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn write_namespace<'a>(&'a self, obj: &'a K) -> Option<&'a str> {
        if !K::NAMESPACED {
            return None;
        }
        obj.meta().namespace.as_deref().or(self.namespace())
    }

    fn parse(obj: DynamicObject) -> Result<K> {
        Ok(obj.try_parse::<K>()?)
    }

    fn erase(obj: &K) -> Result<DynamicObject> {
        Ok(DynamicObject::from_resource(obj)?)
    }

    /// Persist a new object
    pub async fn create(&self, obj: &K) -> Result<K> {
        let dynobj = Self::erase(obj)?;
        let created = self
            .object_client
            .create(self.write_namespace(obj), dynobj, &PostParams::default())
            .await?;
        Self::parse(created)
    }

    /// Fetch a named object from the bound namespace
    pub async fn get(&self, name: &str, gp: &GetParams) -> Result<K> {
        let found = self.object_client.get(self.namespace(), name, gp).await?;
        Self::parse(found)
    }

    /// Fetch a named object from an explicit namespace
    pub async fn get_namespaced(&self, namespace: &str, name: &str, gp: &GetParams) -> Result<K> {
        let found = self.object_client.get(Some(namespace), name, gp).await?;
        Self::parse(found)
    }

    /// Replace an existing object
    pub async fn update(&self, obj: &K) -> Result<K> {
        let dynobj = Self::erase(obj)?;
        let updated = self
            .object_client
            .update(self.write_namespace(obj), dynobj, &PostParams::default())
            .await?;
        Self::parse(updated)
    }

    /// Replace only the status of an existing object
    pub async fn update_status(&self, obj: &K) -> Result<K> {
        let dynobj = Self::erase(obj)?;
        let updated = self
            .object_client
            .update_status(self.write_namespace(obj), dynobj, &PostParams::default())
            .await?;
        Self::parse(updated)
    }

    /// Delete a named object from the bound namespace
    pub async fn delete(&self, name: &str, dp: &DeleteParams) -> Result<()> {
        self.object_client.delete(self.namespace(), name, dp).await
    }

    /// Delete a named object from an explicit namespace
    pub async fn delete_namespaced(
        &self,
        namespace: &str,
        name: &str,
        dp: &DeleteParams,
    ) -> Result<()> {
        self.object_client.delete(Some(namespace), name, dp).await
    }

    /// List objects in the bound namespace
    pub async fn list(&self, lp: &ListParams) -> Result<ObjectList<K>> {
        self.list_inner(self.namespace(), lp).await
    }

    /// List objects in an explicit namespace
    pub async fn list_namespaced(&self, namespace: &str, lp: &ListParams) -> Result<ObjectList<K>> {
        self.list_inner(Some(namespace), lp).await
    }

    async fn list_inner(&self, namespace: Option<&str>, lp: &ListParams) -> Result<ObjectList<K>> {
        let found = self.object_client.list(namespace, lp).await?;
        let mut items = Vec::with_capacity(found.items.len());
        for obj in found.items {
            items.push(Self::parse(obj)?);
        }
        Ok(ObjectList {
            metadata: found.metadata,
            items,
        })
    }

    /// Open a typed watch stream over the bound namespace
    pub async fn watch(
        &self,
        lp: &ListParams,
    ) -> Result<futures::stream::BoxStream<'static, Result<WatchEvent<K>>>> {
        let stream = self.object_client.watch(self.namespace(), lp).await?;
        Ok(stream
            .map(|event| {
                Ok(match event? {
                    WatchEvent::Added(obj) => WatchEvent::Added(obj.try_parse::<K>()?),
                    WatchEvent::Modified(obj) => WatchEvent::Modified(obj.try_parse::<K>()?),
                    WatchEvent::Deleted(obj) => WatchEvent::Deleted(obj.try_parse::<K>()?),
                    WatchEvent::Bookmark(b) => WatchEvent::Bookmark(b),
                    WatchEvent::Error(e) => WatchEvent::Error(e),
                })
            })
            .boxed())
    }

    /// Apply a patch to a named object in the bound namespace
    pub async fn patch(&self, name: &str, patch: &Patch, pp: &PatchParams) -> Result<K> {
        let patched = self
            .object_client
            .patch(self.namespace(), name, patch, pp)
            .await?;
        Self::parse(patched)
    }

    /// Delete every object matching `lp` in the bound namespace
    pub async fn delete_collection(&self, dp: &DeleteParams, lp: &ListParams) -> Result<()> {
        self.object_client
            .delete_collection(self.namespace(), dp, lp)
            .await
    }
}
