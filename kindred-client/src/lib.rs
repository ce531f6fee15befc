//! Typed resource clients over a pluggable object-client boundary.
//!
//! The [`ObjectClient`] trait is the seam behind which the real transport
//! lives; [`TypedClient`] wraps it with per-kind typed CRUD, list, watch
//! and patch operations. [`MemoryObjectClient`] is an in-process
//! implementation with apiserver-like semantics, used by tests and local
//! development.
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub use error::Error;

pub mod memory;
pub use memory::{MemoryClientFactory, MemoryObjectClient};

mod object_client;
pub use object_client::{ClientFactory, ObjectClient, WatchStream};

mod typed;
pub use typed::TypedClient;

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
