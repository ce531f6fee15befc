//! Kindred is an umbrella-crate for building typed controllers over a
//! watchable object store.
//!
//! The main modules are:
//!
//! - [`client`] with the aggregate [`Client`] and the per-kind
//!   [`ResourceClient`]
//! - [`runtime`](kindred_runtime) with the [`Controller`], the cached
//!   [`Lister`] and the [`Lifecycle`] hooks
//! - [`core`](kindred_core) with the [`Resource`] capability trait and
//!   the shared metadata, selector and parameter types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kindred::{core::impl_resource, Client};
//! use kindred::core::{new_object, ObjectMeta, TypeMeta};
//! use serde::{Deserialize, Serialize};
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Widget {
//!     #[serde(flatten)]
//!     types: TypeMeta,
//!     #[serde(default)]
//!     metadata: ObjectMeta,
//! }
//! impl_resource!(Widget, "example.dev", "v1", "Widget", "widgets", "widget", namespaced: true);
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::in_memory();
//! let widgets = client.resource::<Widget>(Some("default"));
//! let token = CancellationToken::new();
//! widgets.on_change(&token, "greeter", |obj: Widget| async move {
//!     println!("widget {:?} changed", obj.metadata.name);
//!     Ok(None)
//! });
//!
//! client.start(&token);
//! widgets.create(&new_object("default", "w1", Widget::default())).await?;
//! # Ok(())
//! # }
//! ```

pub use kindred_core as core;
pub use kindred_runtime as runtime;

pub mod client;
pub use client::Client;

mod typed;
pub use typed::ResourceClient;

pub use kindred_client::{
    ClientFactory, Error, MemoryClientFactory, MemoryObjectClient, ObjectClient, Result,
    TypedClient,
};
pub use kindred_core::{Resource, ResourceExt, ResourceRegistry};
pub use kindred_runtime::{
    handler_fn, Controller, FeatureGate, HandlerFn, Lifecycle, LifecycleDelegate, Lister,
    SyncResult,
};
