//! Crate with the types and traits shared by every kindred layer.
//!
//! This crate is available as a minimal alternative to `kindred` where no
//! client or controller machinery is needed. Everything here is always
//! re-exported from `kindred` under `kindred::core`.
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod dynamic;
pub use dynamic::DynamicObject;

pub mod gvk;
pub use gvk::{GroupVersion, GroupVersionKind, GroupVersionResource};

pub mod labels;
pub use labels::{Expression, Selector};

pub mod metadata;
pub use metadata::{ListMeta, ObjectMeta, TypeMeta};

pub mod object;
pub use object::ObjectList;

pub mod params;

pub mod registry;
pub use registry::ResourceRegistry;

mod resource;
pub use resource::{new_object, ApiResource, Resource, ResourceExt};

pub mod watch;
pub use watch::WatchEvent;

mod error;
pub use error::{ErrorResponse, StatusCause, StatusDetails};

/// Type-erased error carried by handler and lifecycle hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
