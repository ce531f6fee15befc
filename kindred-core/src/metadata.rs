//! Metadata structs embedded in every object this layer moves around.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Type information that is flattened into every object
#[derive(Deserialize, Serialize, Clone, Default, Debug, Eq, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    /// The version of the API
    pub api_version: String,

    /// The name of the API
    pub kind: String,
}

impl TypeMeta {
    /// Construct type metadata for a group/version/kind triple.
    pub fn new(api_version: &str, kind: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// Standard object metadata.
///
/// The subset of apimachinery's ObjectMeta that the typed client, lister
/// and lifecycle layers read or write. Timestamps are carried as RFC3339
/// strings; this layer never interprets them beyond presence checks.
#[derive(Deserialize, Serialize, Clone, Default, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name, unique within a namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Prefix for server-generated names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_name: Option<String>,

    /// Namespace the object lives in, unset for cluster-scoped kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Server-assigned unique identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Opaque version counter used for optimistic concurrency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,

    /// Creation timestamp set by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,

    /// Set while the object awaits finalization before removal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_timestamp: Option<String>,

    /// String keyed labels used for selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    /// Unstructured annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,

    /// Finalizer names blocking deletion until removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalizers: Option<Vec<String>>,
}

/// List metadata returned alongside collection responses.
#[derive(Deserialize, Serialize, Clone, Default, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    /// The collection's resource version at serving time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,

    /// Continue token for chunked list calls
    #[serde(rename = "continue", skip_serializing_if = "Option::is_none")]
    pub continue_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn object_meta_roundtrip_skips_unset_fields() {
        let meta = ObjectMeta {
            name: Some("foo".into()),
            namespace: Some("ns1".into()),
            ..ObjectMeta::default()
        };
        assert_json_eq!(
            serde_json::to_value(&meta).unwrap(),
            json!({"name": "foo", "namespace": "ns1"})
        );
    }

    #[test]
    fn list_meta_continue_rename() {
        let meta = ListMeta {
            resource_version: Some("3".into()),
            continue_token: Some("tok".into()),
        };
        assert_json_eq!(
            serde_json::to_value(&meta).unwrap(),
            json!({"resourceVersion": "3", "continue": "tok"})
        );
    }
}
