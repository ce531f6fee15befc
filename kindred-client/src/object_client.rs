//! The untyped object-client boundary.
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use kindred_core::{
    params::{DeleteParams, GetParams, ListParams, Patch, PatchParams, PostParams},
    ApiResource, DynamicObject, ObjectList, WatchEvent,
};

use crate::Result;

/// Stream of watch events as yielded by [`ObjectClient::watch`].
pub type WatchStream = BoxStream<'static, Result<WatchEvent<DynamicObject>>>;

/// A generic client for one resource family.
///
/// This is the boundary the real REST transport lives behind; everything
/// above it (typed clients, controllers, lifecycles) only sees dynamic
/// objects going in and out. A `namespace` of `None` means the client's
/// kind is cluster-scoped or the call spans all namespaces.
///
/// Implementations surface server failures as [`Error::Api`] with the
/// original response; no error is translated here.
///
/// [`Error::Api`]: crate::Error::Api
#[async_trait]
pub trait ObjectClient: Send + Sync + 'static {
    /// The descriptor of the family this client serves
    fn resource(&self) -> &ApiResource;

    /// Persist a new object
    async fn create(
        &self,
        namespace: Option<&str>,
        obj: DynamicObject,
        pp: &PostParams,
    ) -> Result<DynamicObject>;

    /// Fetch a single object by name
    async fn get(
        &self,
        namespace: Option<&str>,
        name: &str,
        gp: &GetParams,
    ) -> Result<DynamicObject>;

    /// Replace an existing object
    async fn update(
        &self,
        namespace: Option<&str>,
        obj: DynamicObject,
        pp: &PostParams,
    ) -> Result<DynamicObject>;

    /// Replace only the status subresource of an existing object
    async fn update_status(
        &self,
        namespace: Option<&str>,
        obj: DynamicObject,
        pp: &PostParams,
    ) -> Result<DynamicObject>;

    /// Delete an object by name
    async fn delete(&self, namespace: Option<&str>, name: &str, dp: &DeleteParams) -> Result<()>;

    /// List objects matching the params
    async fn list(
        &self,
        namespace: Option<&str>,
        lp: &ListParams,
    ) -> Result<ObjectList<DynamicObject>>;

    /// Open a watch stream for objects matching the params
    async fn watch(&self, namespace: Option<&str>, lp: &ListParams) -> Result<WatchStream>;

    /// Apply a patch to a named object
    async fn patch(
        &self,
        namespace: Option<&str>,
        name: &str,
        patch: &Patch,
        pp: &PatchParams,
    ) -> Result<DynamicObject>;

    /// Delete every object matching the list params
    async fn delete_collection(
        &self,
        namespace: Option<&str>,
        dp: &DeleteParams,
        lp: &ListParams,
    ) -> Result<()>;
}

/// Resolves per-family object clients.
///
/// One factory instance backs a whole [`Client`] aggregate; resolving the
/// same descriptor twice must yield clients sharing underlying state.
///
/// [`Client`]: https://docs.rs/kindred
pub trait ClientFactory: Send + Sync + 'static {
    /// Resolve the object client serving `resource`
    fn object_client(&self, resource: &ApiResource) -> Arc<dyn ObjectClient>;
}
