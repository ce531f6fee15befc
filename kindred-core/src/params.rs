//! Request parameters accepted by the object-client boundary.
//!
//! A port of the *Options types from apimachinery, trimmed to the fields
//! this layer forwards; the transport behind [`ObjectClient`] owns their
//! wire encoding.
//!
//! [`ObjectClient`]: https://docs.rs/kindred-client
use serde::{Deserialize, Serialize};

/// Common query parameters for single-object get calls
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetParams {
    /// An explicit resourceVersion the read must be at least as new as
    pub resource_version: Option<String>,
}

impl GetParams {
    /// Returns the read semantics of "any" resource version (quick, cached)
    #[must_use]
    pub fn any() -> Self {
        Self {
            resource_version: Some("0".into()),
        }
    }
}

/// Common query parameters used in list and delete-collection calls
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListParams {
    /// A selector to restrict the returned objects by their labels.
    ///
    /// Defaults to everything if `None`.
    pub label_selector: Option<String>,

    /// A selector to restrict the returned objects by their fields.
    ///
    /// Defaults to everything if `None`.
    pub field_selector: Option<String>,

    /// Limit the number of results.
    pub limit: Option<u32>,

    /// Fetch a second page of results using a previous continue token.
    pub continue_token: Option<String>,

    /// An explicit resourceVersion the list is served at
    pub resource_version: Option<String>,
}

impl ListParams {
    /// Configure the label selector
    #[must_use]
    pub fn labels(mut self, label_selector: &str) -> Self {
        self.label_selector = Some(label_selector.to_string());
        self
    }

    /// Configure the field selector
    #[must_use]
    pub fn fields(mut self, field_selector: &str) -> Self {
        self.field_selector = Some(field_selector.to_string());
        self
    }

    /// Configure the result limit
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Configure the continue token
    #[must_use]
    pub fn continue_token(mut self, token: &str) -> Self {
        self.continue_token = Some(token.to_string());
        self
    }
}

/// Common parameters for create and update calls
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostParams {
    /// Construct and validate without persisting
    pub dry_run: bool,
    /// The actor persisting these changes
    pub field_manager: Option<String>,
}

/// Common query parameters for delete calls
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteParams {
    /// Construct and validate without persisting
    pub dry_run: bool,

    /// The duration in seconds before the object should be deleted.
    ///
    /// Zero indicates delete immediately; `None` means the kind's default.
    pub grace_period_seconds: Option<u32>,

    /// Whether and how garbage collection will be performed.
    pub propagation_policy: Option<PropagationPolicy>,
}

/// Propagation policy when deleting objects
#[derive(Clone, Debug, PartialEq)]
pub enum PropagationPolicy {
    /// Orphan the dependents
    Orphan,
    /// Delete the object from the store and let the garbage collector
    /// delete the dependents in the background
    Background,
    /// The object stays present until its dependents are deleted
    Foreground,
}

/// Apply strategy and payload for patch calls.
///
/// JSON-Patch operation lists are not carried at this layer; callers that
/// need them talk to the transport directly.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Patch {
    /// An RFC 7386 merge payload
    Merge(serde_json::Value),
    /// A strategic merge payload (merge-with-list-semantics on servers
    /// that support it; plain merge otherwise)
    Strategic(serde_json::Value),
}

impl Patch {
    /// The MIME type a transport should send this patch with
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Merge(_) => "application/merge-patch+json",
            Self::Strategic(_) => "application/strategic-merge-patch+json",
        }
    }
}

/// Common parameters for patch calls
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatchParams {
    /// Construct and validate without persisting
    pub dry_run: bool,
    /// The actor persisting these changes
    pub field_manager: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_builder() {
        let lp = ListParams::default().labels("app=web").limit(20);
        assert_eq!(lp.label_selector.as_deref(), Some("app=web"));
        assert_eq!(lp.limit, Some(20));
        assert_eq!(lp.continue_token, None);
    }

    #[test]
    fn patch_content_types() {
        let p = Patch::Merge(serde_json::json!({"spec": {"size": 2}}));
        assert_eq!(p.content_type(), "application/merge-patch+json");
    }
}
