//! Controller runtime for kindred.
//!
//! Builds on `kindred-client` with the pieces a long-running operator
//! needs: a watch-fed object cache ([`store`]), cache-backed reads
//! ([`Lister`]), a keyed work queue with typed handler dispatch
//! ([`controller`]) and finalizer-backed lifecycle hooks ([`lifecycle`]).

pub mod controller;
pub use controller::{
    handler_fn, object_in_cluster, Controller, ControllerFactory, FeatureGate, GenericController,
    HandlerFn, SyncResult,
};

mod error;
pub use error::Error;

pub mod lifecycle;
pub use lifecycle::{new_lifecycle_adapter, Lifecycle, LifecycleDelegate};

pub mod lister;
pub use lister::Lister;

pub mod store;
