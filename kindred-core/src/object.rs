//! Generic object list wrapper.
use serde::{Deserialize, Serialize};

use crate::metadata::ListMeta;

/// A generic object list
///
/// This is used instead of a generated list struct per kind; list/watch
/// and delete-collection calls on a typed client produce it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ObjectList<T>
where
    T: Clone,
{
    /// ListMeta - only really used for its `resourceVersion`
    #[serde(default)]
    pub metadata: ListMeta,

    /// The items we are actually interested in.
    #[serde(bound(deserialize = "Vec<T>: Deserialize<'de>"))]
    pub items: Vec<T>,
}

impl<T: Clone> ObjectList<T> {
    /// Wrap a set of items with empty list metadata
    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            metadata: ListMeta::default(),
            items,
        }
    }

    /// `iter` returns an Iterator over the elements of this ObjectList
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// `iter_mut` returns an Iterator of mutable references to the
    /// elements of this ObjectList
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }
}

impl<T: Clone> IntoIterator for ObjectList<T> {
    type IntoIter = std::vec::IntoIter<Self::Item>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T: Clone> IntoIterator for &'a ObjectList<T> {
    type IntoIter = std::slice::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
