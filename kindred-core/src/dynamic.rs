//! The type-erased object representation moved through untyped boundaries.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    metadata::{ObjectMeta, TypeMeta},
    resource::{ApiResource, Resource},
};

#[derive(Debug, Error)]
#[error("failed to parse this DynamicObject into a Resource: {source}")]
/// Failed to parse a `DynamicObject` into a typed [`Resource`]
pub struct ParseDynamicObjectError {
    #[from]
    source: serde_json::Error,
}

/// A dynamic representation of an object of any kind.
///
/// This is what the generic object client and controller move around;
/// typed layers convert to and from it with type information checked at
/// the seam instead of asserted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DynamicObject {
    /// The type fields, not always present
    #[serde(flatten, default)]
    pub types: Option<TypeMeta>,
    /// Object metadata
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// All other keys
    #[serde(flatten)]
    pub data: serde_json::Value,
}

impl DynamicObject {
    /// Create a DynamicObject with minimal values set from a descriptor.
    #[must_use]
    pub fn new(name: &str, resource: &ApiResource) -> Self {
        Self {
            types: Some(TypeMeta::new(&resource.api_version, &resource.kind)),
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            data: serde_json::Value::Object(Default::default()),
        }
    }

    /// Attach dynamic data to a DynamicObject
    #[must_use]
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Attach a namespace to a DynamicObject
    #[must_use]
    pub fn within(mut self, ns: &str) -> Self {
        self.metadata.namespace = Some(ns.into());
        self
    }

    /// Whether the embedded type metadata names the kind `K`.
    ///
    /// Untyped dispatch uses this as the checked replacement for a type
    /// assertion; objects without type metadata match nothing.
    pub fn is_kind<K: Resource>(&self) -> bool {
        self.types
            .as_ref()
            .is_some_and(|t| t.kind == K::KIND && t.api_version == K::api_version())
    }

    /// Attempt to convert this `DynamicObject` into a typed `K`.
    pub fn try_parse<K: Resource>(self) -> Result<K, ParseDynamicObjectError> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }

    /// Erase a typed object into its dynamic representation.
    pub fn from_resource<K: Resource>(obj: &K) -> Result<Self, ParseDynamicObjectError> {
        Ok(serde_json::from_value(serde_json::to_value(obj)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{impl_resource, new_object};
    use serde_json::json;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Widget {
        #[serde(flatten)]
        types: TypeMeta,
        #[serde(default)]
        metadata: ObjectMeta,
        #[serde(default)]
        spec: serde_json::Value,
    }
    impl_resource!(Widget, "example.dev", "v1", "Widget", "widgets", "widget", namespaced: true);

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Gadget {
        #[serde(flatten)]
        types: TypeMeta,
        #[serde(default)]
        metadata: ObjectMeta,
    }
    impl_resource!(Gadget, "example.dev", "v1", "Gadget", "gadgets", "gadget", namespaced: true);

    #[test]
    fn roundtrip_preserves_payload() {
        let w = new_object("ns1", "foo", Widget::default());
        let mut w = w;
        w.spec = json!({"size": 7});
        let dynobj = DynamicObject::from_resource(&w).unwrap();
        assert!(dynobj.is_kind::<Widget>());
        assert!(!dynobj.is_kind::<Gadget>());
        let back: Widget = dynobj.try_parse().unwrap();
        assert_eq!(back, w);
    }

    #[test]
    fn untyped_object_matches_no_kind() {
        let dynobj = DynamicObject {
            types: None,
            metadata: ObjectMeta::default(),
            data: json!({}),
        };
        assert!(!dynobj.is_kind::<Widget>());
    }
}
