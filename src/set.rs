//! Encoding collections as unordered sets.
//!
//! Serde sees `HashSet` and `BTreeSet` as plain sequences, so by default
//! they are written with `arrItem` children. Annotating a field with this
//! module switches the item tag to `setItem`:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use std::collections::BTreeSet;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Tags {
//!     #[serde(with = "xml_marshal::set")]
//!     names: BTreeSet<String>,
//! }
//!
//! let tags = Tags { names: ["a".to_string(), "b".to_string()].into() };
//! let xml = xml_marshal::to_string(&tags).unwrap();
//! assert!(xml.contains("<names><setItem>a</setItem><setItem>b</setItem></names>"));
//!
//! let back: Tags = xml_marshal::from_str(&xml).unwrap();
//! assert_eq!(back.names, tags.names);
//! ```
//!
//! Where no field attribute applies (the root value, map values, items of
//! another collection) wrap the collection in [`Set`]:
//!
//! ```rust
//! use std::collections::{BTreeMap, BTreeSet};
//! use xml_marshal::Set;
//!
//! let groups: BTreeMap<String, Set<BTreeSet<u8>>> =
//!     [("odd".to_string(), Set([1, 3].into()))].into();
//! let xml = xml_marshal::to_string_with_root(&groups, "groups").unwrap();
//! assert!(xml.ends_with("<groups><odd><setItem>1</setItem><setItem>3</setItem></odd></groups>"));
//! ```
//!
//! Other formats see a transparent newtype around a sequence, so the same
//! types still serialize normally with them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::{Deref, DerefMut};

/// Newtype name recognized by the XML serializer.
pub(crate) const SET_TOKEN: &str = "$xml_marshal::set";

/// Serializes `set` with `setItem` children.
pub fn serialize<S, C, T>(set: &C, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
    T: Serialize,
{
    serializer.serialize_newtype_struct(SET_TOKEN, &Items(set))
}

/// Deserializes a set. Both `setItem` and `arrItem` children are accepted;
/// duplicates collapse according to the target collection.
pub fn deserialize<'de, D, C>(deserializer: D) -> Result<C, D::Error>
where
    D: Deserializer<'de>,
    C: Deserialize<'de>,
{
    C::deserialize(deserializer)
}

/// A collection encoded with `setItem` children wherever it appears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Set<C>(pub C);

impl<C> Set<C> {
    /// Returns the wrapped collection.
    #[inline]
    pub fn into_inner(self) -> C {
        self.0
    }
}

impl<C> From<C> for Set<C> {
    fn from(collection: C) -> Self {
        Set(collection)
    }
}

impl<C> Deref for Set<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.0
    }
}

impl<C> DerefMut for Set<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.0
    }
}

impl<C, T> Serialize for Set<C>
where
    for<'a> &'a C: IntoIterator<Item = &'a T>,
    T: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize(&self.0, serializer)
    }
}

impl<'de, C: Deserialize<'de>> Deserialize<'de> for Set<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize(deserializer).map(Set)
    }
}

struct Items<'a, C>(&'a C);

impl<C> Serialize for Items<'_, C>
where
    for<'a> &'a C: IntoIterator,
    for<'a> <&'a C as IntoIterator>::Item: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Set;
    use crate::element::{ARR_ITEM, SET_ITEM};
    use serde::{Deserialize, Serialize};
    use std::collections::{BTreeSet, HashMap, HashSet};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Holder {
        #[serde(with = "crate::set")]
        set: HashSet<String>,
    }

    #[test]
    fn test_set_items_are_tagged() {
        let holder = Holder {
            set: ["x".to_string()].into(),
        };
        let element = crate::to_element(&holder, "Holder").unwrap();
        let items: Vec<_> = element["set"].children().iter().map(|c| c.name()).collect();
        assert_eq!(items, [SET_ITEM]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let xml = "<Holder><set><setItem>a</setItem><setItem>a</setItem><setItem>b</setItem></set></Holder>";
        let holder: Holder = crate::from_str(xml).unwrap();
        assert_eq!(holder.set.len(), 2);
    }

    #[test]
    fn test_empty_set() {
        let holder = Holder { set: HashSet::new() };
        let xml = crate::to_string(&holder).unwrap();
        let back: Holder = crate::from_str(&xml).unwrap();
        assert_eq!(back, holder);
    }

    #[test]
    fn test_set_wrapper_as_root() {
        let set = Set(BTreeSet::from(["a".to_string(), "b".to_string()]));
        let element = crate::to_element(&set, "tags").unwrap();
        let items: Vec<_> = element.children().iter().map(|c| (c.name(), c.text())).collect();
        assert_eq!(items, [(SET_ITEM, Some("a")), (SET_ITEM, Some("b"))]);
        assert_eq!(crate::default_root_name::<Set<BTreeSet<String>>>(), "Set");
    }

    #[test]
    fn test_set_wrapper_in_map_values() {
        let mut groups: HashMap<String, Set<BTreeSet<String>>> = HashMap::new();
        groups.insert("k".to_string(), Set(["a".to_string(), "b".to_string()].into()));
        groups.insert("empty".to_string(), Set::default());

        let element = crate::to_element(&groups, "groups").unwrap();
        assert!(element["k"].children().iter().all(|c| c.name() == SET_ITEM));
        assert_eq!(element["k"].children().len(), 2);

        let xml = crate::to_string(&groups).unwrap();
        let back: HashMap<String, Set<BTreeSet<String>>> = crate::from_str(&xml).unwrap();
        assert_eq!(back, groups);
    }

    #[test]
    fn test_set_wrapper_nested_in_sequence() {
        let rows = vec![Set(BTreeSet::from([1u8, 2])), Set(BTreeSet::from([3u8]))];
        let element = crate::to_element(&rows, "rows").unwrap();
        assert!(element.children().iter().all(|c| c.name() == ARR_ITEM));
        assert!(element.children()[0].children().iter().all(|c| c.name() == SET_ITEM));

        let back: Vec<Set<BTreeSet<u8>>> = crate::from_element(&element).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_transparent_in_json() {
        let holder = Holder {
            set: ["only".to_string()].into(),
        };
        assert_eq!(serde_json::to_string(&holder).unwrap(), r#"{"set":["only"]}"#);
        let wrapped = Set(BTreeSet::from([2, 1]));
        assert_eq!(serde_json::to_string(&wrapped).unwrap(), "[1,2]");
    }
}
