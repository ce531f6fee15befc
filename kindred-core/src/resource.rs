use std::{collections::BTreeMap, fmt::Debug};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    gvk::{GroupVersionKind, GroupVersionResource},
    metadata::{ObjectMeta, TypeMeta},
};

/// Runtime descriptor for one resource kind.
///
/// This is the value-level form of the [`Resource`] trait, used where type
/// erasure is required: the object-client factory, the controller factory
/// and the [`ResourceRegistry`](crate::ResourceRegistry).
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct ApiResource {
    /// Resource group, empty for the core group.
    pub group: String,
    /// Group version
    pub version: String,
    /// apiVersion of the resource (v1 for core group,
    /// group/version for others).
    pub api_version: String,
    /// Singular PascalCase name of the kind
    pub kind: String,
    /// Plural name of the resource
    pub plural: String,
    /// Lowercase singular name of the resource
    pub singular: String,
    /// Whether objects of this kind live inside a namespace
    pub namespaced: bool,
}

impl ApiResource {
    /// Creates an ApiResource by type-erasing a [`Resource`].
    pub fn erase<K: Resource>() -> Self {
        ApiResource {
            group: K::GROUP.to_string(),
            version: K::VERSION.to_string(),
            api_version: K::api_version(),
            kind: K::KIND.to_string(),
            plural: K::PLURAL.to_string(),
            singular: K::SINGULAR.to_string(),
            namespaced: K::NAMESPACED,
        }
    }

    /// Creates an ApiResource from group, version, kind and plural name.
    ///
    /// The singular name is derived by lowercasing the kind, and the
    /// resource is assumed namespaced.
    pub fn from_gvk_with_plural(gvk: &GroupVersionKind, plural: &str) -> Self {
        ApiResource {
            api_version: gvk.api_version(),
            group: gvk.group.clone(),
            version: gvk.version.clone(),
            kind: gvk.kind.clone(),
            plural: plural.to_string(),
            singular: gvk.kind.to_ascii_lowercase(),
            namespaced: true,
        }
    }

    /// The family triple this resource belongs to.
    pub fn gvr(&self) -> GroupVersionResource {
        GroupVersionResource::gvr(&self.group, &self.version, &self.plural)
    }
}

/// A capability trait for one statically known resource kind.
///
/// Implementing this (usually via [`impl_resource!`](crate::impl_resource))
/// is all a record type needs for the generic client, lister, controller
/// and lifecycle layers to operate on it. The type must embed flattened
/// [`TypeMeta`] and a `metadata` field, and `Default` acts as the
/// zero-value factory used for decode targets.
pub trait Resource:
    Clone + Debug + PartialEq + Default + Serialize + DeserializeOwned + Send + Sync + Sized + 'static
{
    /// API group of the kind, empty for the core group
    const GROUP: &'static str;
    /// API version of the kind
    const VERSION: &'static str;
    /// PascalCase kind name
    const KIND: &'static str;
    /// Plural resource name used for routing
    const PLURAL: &'static str;
    /// Lowercase singular resource name
    const SINGULAR: &'static str;
    /// Whether objects of this kind are namespaced
    const NAMESPACED: bool;

    /// Generate the apiVersion string for the kind
    fn api_version() -> String {
        if Self::GROUP.is_empty() {
            Self::VERSION.to_string()
        } else {
            format!("{}/{}", Self::GROUP, Self::VERSION)
        }
    }

    /// The kind triple for this resource
    fn gvk() -> GroupVersionKind {
        GroupVersionKind::gvk(Self::GROUP, Self::VERSION, Self::KIND)
    }

    /// The family triple for this resource
    fn gvr() -> GroupVersionResource {
        GroupVersionResource::gvr(Self::GROUP, Self::VERSION, Self::PLURAL)
    }

    /// Type metadata embedded in the object
    fn types(&self) -> &TypeMeta;
    /// Mutable access to the embedded type metadata
    fn types_mut(&mut self) -> &mut TypeMeta;
    /// Metadata that all persisted objects have
    fn meta(&self) -> &ObjectMeta;
    /// Mutable access to the object metadata
    fn meta_mut(&mut self) -> &mut ObjectMeta;
}

/// Stamp identity onto an object the way the original per-kind `NewX`
/// constructors did: apiVersion and kind from the type, name and namespace
/// from the arguments. Every other field is left untouched, so calling it
/// twice with the same inputs is a no-op the second time.
pub fn new_object<K: Resource>(namespace: &str, name: &str, mut obj: K) -> K {
    *obj.types_mut() = TypeMeta::new(&K::api_version(), K::KIND);
    obj.meta_mut().name = Some(name.to_string());
    obj.meta_mut().namespace = if namespace.is_empty() {
        None
    } else {
        Some(namespace.to_string())
    };
    obj
}

// Shared empty map for the borrowing label/annotation accessors.
static EMPTY_MAP: BTreeMap<String, String> = BTreeMap::new();

/// Helper accessors for resources, mirroring the fields reconcilers reach
/// for most.
pub trait ResourceExt: Resource {
    /// Returns the most useful name identifier available
    ///
    /// Tries `name`, then `generateName`, and falls back on an empty string.
    fn name_any(&self) -> String;
    /// The namespace the object is in
    fn namespace(&self) -> Option<String>;
    /// The object's resource version
    fn resource_version(&self) -> Option<String>;
    /// Unique server-assigned ID
    fn uid(&self) -> Option<String>;
    /// Returns object labels
    fn labels(&self) -> &BTreeMap<String, String>;
    /// Provides mutable access to the labels
    fn labels_mut(&mut self) -> &mut BTreeMap<String, String>;
    /// Returns object annotations
    fn annotations(&self) -> &BTreeMap<String, String>;
    /// Provides mutable access to the annotations
    fn annotations_mut(&mut self) -> &mut BTreeMap<String, String>;
    /// Returns object finalizers
    fn finalizers(&self) -> &[String];
    /// Provides mutable access to the finalizers
    fn finalizers_mut(&mut self) -> &mut Vec<String>;
}

impl<K: Resource> ResourceExt for K {
    fn name_any(&self) -> String {
        self.meta()
            .name
            .clone()
            .or_else(|| self.meta().generate_name.clone())
            .unwrap_or_default()
    }

    fn namespace(&self) -> Option<String> {
        self.meta().namespace.clone()
    }

    fn resource_version(&self) -> Option<String> {
        self.meta().resource_version.clone()
    }

    fn uid(&self) -> Option<String> {
        self.meta().uid.clone()
    }

    fn labels(&self) -> &BTreeMap<String, String> {
        self.meta().labels.as_ref().unwrap_or(&EMPTY_MAP)
    }

    fn labels_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.meta_mut().labels.get_or_insert_with(BTreeMap::new)
    }

    fn annotations(&self) -> &BTreeMap<String, String> {
        self.meta().annotations.as_ref().unwrap_or(&EMPTY_MAP)
    }

    fn annotations_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.meta_mut().annotations.get_or_insert_with(BTreeMap::new)
    }

    fn finalizers(&self) -> &[String] {
        self.meta().finalizers.as_deref().unwrap_or_default()
    }

    fn finalizers_mut(&mut self) -> &mut Vec<String> {
        self.meta_mut().finalizers.get_or_insert_with(Vec::new)
    }
}

/// Implement [`Resource`] for a struct embedding `types: TypeMeta` and
/// `metadata: ObjectMeta` fields.
///
/// ```
/// use kindred_core::{impl_resource, ObjectMeta, TypeMeta};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// pub struct Widget {
///     #[serde(flatten)]
///     pub types: TypeMeta,
///     #[serde(default)]
///     pub metadata: ObjectMeta,
///     #[serde(default)]
///     pub spec: serde_json::Value,
/// }
///
/// impl_resource!(Widget, "example.dev", "v1", "Widget", "widgets", "widget", namespaced: true);
/// ```
#[macro_export]
macro_rules! impl_resource {
    ($type:ty, $group:literal, $version:literal, $kind:literal, $plural:literal, $singular:literal, namespaced: $namespaced:literal) => {
        impl $crate::Resource for $type {
            const GROUP: &'static str = $group;
            const VERSION: &'static str = $version;
            const KIND: &'static str = $kind;
            const PLURAL: &'static str = $plural;
            const SINGULAR: &'static str = $singular;
            const NAMESPACED: bool = $namespaced;

            fn types(&self) -> &$crate::TypeMeta {
                &self.types
            }

            fn types_mut(&mut self) -> &mut $crate::TypeMeta {
                &mut self.types
            }

            fn meta(&self) -> &$crate::ObjectMeta {
                &self.metadata
            }

            fn meta_mut(&mut self) -> &mut $crate::ObjectMeta {
                &mut self.metadata
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

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

    #[test]
    fn new_object_stamps_identity_and_is_idempotent() {
        let mut w = Widget::default();
        w.spec = serde_json::json!({"size": 3});
        let once = new_object("ns1", "foo", w);
        assert_eq!(once.types.api_version, "example.dev/v1");
        assert_eq!(once.types.kind, "Widget");
        assert_eq!(once.metadata.name.as_deref(), Some("foo"));
        assert_eq!(once.metadata.namespace.as_deref(), Some("ns1"));
        assert_eq!(once.spec, serde_json::json!({"size": 3}));

        let twice = new_object("ns1", "foo", once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn new_object_empty_namespace_unsets_it() {
        let w = new_object("", "bar", Widget::default());
        assert_eq!(w.metadata.namespace, None);
    }

    #[test]
    fn erased_descriptor_matches_consts() {
        let ar = ApiResource::erase::<Widget>();
        assert_eq!(ar.api_version, "example.dev/v1");
        assert_eq!(ar.plural, "widgets");
        assert!(ar.namespaced);
        assert_eq!(ar.gvr(), Widget::gvr());
    }
}
