//! In-memory XML element tree and typed element accessors.
//!
//! Lookups never return `Option`: a missing child is reported as a shared
//! sentinel element that no parsed or constructed element can equal. Every
//! accessor checks
//! [`Element::is_available`] before reading, so the sentinel can never be
//! mistaken for data.
//!
//! ```rust
//! use xml_marshal::Element;
//!
//! let mut root = Element::new("settings");
//! root.add_value_child("volume", 11, &[], None);
//! root.add_optional_value_child("theme", None::<&str>, &[], None);
//!
//! assert_eq!(root["volume"].get_int().unwrap(), 11);
//! assert_eq!(root["theme"].get_optional(|e| e.get_text().map(str::to_owned)).unwrap(), None);
//! assert!(!root["missing"].is_available());
//! ```

use crate::error::{Error, Result};
use crate::scalar::{parse_bool, parse_number, FloatFormat, ScalarValue, Timestamp};
use std::borrow::Cow;
use std::ops::Index;

/// Tag of the children holding sequence items.
pub const ARR_ITEM: &str = "arrItem";

/// Tag of the children holding set items.
pub const SET_ITEM: &str = "setItem";

/// Attribute marking an optional value as absent (`"1"`) or present (`"0"`).
pub const NIL_ATTRIBUTE: &str = "isNil";

/// Name reported by the sentinel element. An element carrying this name is
/// still ordinary data; only [`Element::not_found`] is unavailable.
pub const NOT_FOUND_NAME: &str = "xml-marshal.not-found";

static NOT_FOUND: Element = Element {
    name: Cow::Borrowed(NOT_FOUND_NAME),
    text: None,
    attributes: Vec::new(),
    children: Vec::new(),
    sentinel: true,
};

/// A named XML node with optional text, attributes and ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: Cow<'static, str>,
    text: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    /// Set only on the shared sentinel.
    sentinel: bool,
}

impl Element {
    /// Creates an element with no text, attributes or children.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            text: None,
            attributes: Vec::new(),
            children: Vec::new(),
            sentinel: false,
        }
    }

    /// Creates an element holding `text`.
    pub fn with_text(name: impl Into<Cow<'static, str>>, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(name)
        }
    }

    /// Creates a leaf element holding a scalar value.
    pub fn scalar(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<ScalarValue>,
        float_format: FloatFormat,
    ) -> Self {
        Self::with_text(name, value.into().to_text_with(float_format))
    }

    /// Returns the shared "not found" sentinel.
    #[inline]
    pub fn not_found() -> &'static Element {
        &NOT_FOUND
    }

    /// Returns the element name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `false` for the "not found" sentinel.
    #[inline]
    pub fn is_available(&self) -> bool {
        !self.sentinel
    }

    /// Returns `Some(self)` unless this is the sentinel.
    #[inline]
    pub fn available(&self) -> Option<&Element> {
        self.is_available().then_some(self)
    }

    /// Returns the raw text payload.
    #[inline]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replaces the text payload.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Removes the text payload.
    pub fn clear_text(&mut self) {
        self.text = None;
    }

    /// Returns an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Iterates over attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns all children in document order.
    #[inline]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Returns whether the element has any children.
    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Appends a child and returns a reference to it.
    pub fn add_child(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Returns the first child named `name`, or the sentinel.
    pub fn child(&self, name: &str) -> &Element {
        self.children
            .iter()
            .find(|child| child.name == name)
            .unwrap_or(&NOT_FOUND)
    }

    /// Iterates over all children named `name` in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Returns the text payload, failing on the sentinel or a missing payload.
    pub fn get_text(&self) -> Result<&str> {
        if !self.is_available() {
            return Err(Error::not_available());
        }
        self.text.as_deref().ok_or_else(Error::missing_value)
    }

    /// Parses the text as a boolean (`true`/`false` in any case, or `1`/`0`).
    pub fn get_bool(&self) -> Result<bool> {
        let text = self.get_text()?;
        parse_bool(text).ok_or_else(|| Error::type_mismatch("boolean", text))
    }

    /// Parses the text as a signed integer.
    pub fn get_int(&self) -> Result<i64> {
        self.get_parsed("integer")
    }

    /// Parses the text as a floating-point number.
    pub fn get_float(&self) -> Result<f64> {
        self.get_parsed("floating point number")
    }

    /// Parses the text as seconds since the Unix epoch.
    pub fn get_timestamp(&self) -> Result<Timestamp> {
        let text = self.get_text()?;
        Timestamp::parse(text).ok_or_else(|| Error::type_mismatch("timestamp", text))
    }

    /// Parses the text with [`FromStr`](std::str::FromStr).
    pub fn get_parsed<T: std::str::FromStr>(&self, expected: &'static str) -> Result<T> {
        parse_number(self.get_text()?, expected)
    }

    /// Reads the `isNil` marker.
    pub fn is_nil(&self) -> Result<bool> {
        if !self.is_available() {
            return Err(Error::not_available());
        }
        match self.attribute(NIL_ATTRIBUTE) {
            Some("1") => Ok(true),
            Some("0") => Ok(false),
            other => Err(Error::malformed_optional(other)),
        }
    }

    /// Returns `None` when the `isNil` marker is set, else reads the value with `get`.
    pub fn get_optional<'a, T, F>(&'a self, get: F) -> Result<Option<T>>
    where
        F: FnOnce(&'a Element) -> Result<T>,
    {
        if self.is_nil()? {
            Ok(None)
        } else {
            get(self).map(Some)
        }
    }

    /// Appends a child holding a scalar value.
    ///
    /// `precision` sets the number of decimals for floats and timestamps;
    /// without it they use six.
    pub fn add_value_child(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<ScalarValue>,
        attributes: &[(&str, &str)],
        precision: Option<usize>,
    ) -> &mut Element {
        let mut child = Element::with_text(name, value.into().to_text(precision));
        for (key, value) in attributes {
            child.set_attribute(*key, *value);
        }
        self.add_child(child)
    }

    /// Appends a child holding an optional scalar value with an `isNil` marker.
    pub fn add_optional_value_child<V: Into<ScalarValue>>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value: Option<V>,
        attributes: &[(&str, &str)],
        precision: Option<usize>,
    ) -> &mut Element {
        match value {
            Some(value) => {
                let child = self.add_value_child(name, value, attributes, precision);
                child.set_attribute(NIL_ATTRIBUTE, "0");
                child
            }
            None => {
                let child = self.add_value_child(name, "", attributes, precision);
                child.set_attribute(NIL_ATTRIBUTE, "1");
                child
            }
        }
    }
}

impl Index<&str> for Element {
    type Output = Element;

    fn index(&self, name: &str) -> &Element {
        self.child(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sample() -> Element {
        let mut root = Element::new("InternalStruct");
        root.add_value_child("a", 100, &[], None);
        root.add_value_child("b", "bbb", &[("lang", "en")], None);
        root.add_value_child("c", false, &[], None);
        root.add_value_child("d", 200.232, &[], Some(3));
        root.add_value_child("e", Timestamp::from_epoch_seconds(1.5), &[], None);
        root.add_optional_value_child("optA", None::<i64>, &[], None);
        root.add_optional_value_child("optB", Some("optB_new"), &[], None);
        root
    }

    #[test]
    fn test_scalar_accessors() {
        let root = sample();
        assert_eq!(root["a"].get_int().unwrap(), 100);
        assert_eq!(root["b"].get_text().unwrap(), "bbb");
        assert_eq!(root["b"].attribute("lang"), Some("en"));
        assert!(!root["c"].get_bool().unwrap());
        assert_eq!(root["d"].text(), Some("200.232"));
        assert_eq!(root["d"].get_float().unwrap(), 200.232);
        assert_eq!(root["e"].get_timestamp().unwrap().epoch_seconds(), 1.5);
    }

    #[test]
    fn test_optional_accessors() {
        let root = sample();
        assert!(root["optA"].is_nil().unwrap());
        assert_eq!(root["optA"].text(), Some(""));
        assert_eq!(root["optA"].get_optional(Element::get_int).unwrap(), None);
        assert_eq!(
            root["optB"].get_optional(Element::get_text).unwrap(),
            Some("optB_new")
        );
    }

    #[test]
    fn test_missing_nil_marker() {
        let root = sample();
        let err = root["a"].is_nil().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedOptional(None)));

        let bad = Element::with_text("x", "1").with_attribute(NIL_ATTRIBUTE, "yes");
        let err = bad.get_optional(Element::get_int).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedOptional(Some(v)) if v == "yes"));
    }

    #[test]
    fn test_sentinel_is_never_data() {
        let root = sample();
        let missing = &root["nope"];
        assert!(!missing.is_available());
        assert!(missing.available().is_none());
        assert!(matches!(missing.get_text().unwrap_err().kind(), ErrorKind::NotAvailable));
        assert!(matches!(missing.get_int().unwrap_err().kind(), ErrorKind::NotAvailable));
        assert!(matches!(missing.is_nil().unwrap_err().kind(), ErrorKind::NotAvailable));
        assert!(!missing["deeper"].is_available());
    }

    #[test]
    fn test_sentinel_name_is_ordinary_data() {
        let mut root = Element::new("root");
        root.add_value_child(NOT_FOUND_NAME, 1, &[], None);
        let child = &root[NOT_FOUND_NAME];
        assert!(child.is_available());
        assert_eq!(child.get_int().unwrap(), 1);
        assert_ne!(child, Element::not_found());
        assert!(Element::new(NOT_FOUND_NAME).is_available());
    }

    #[test]
    fn test_missing_value_and_type_mismatch() {
        let empty = Element::new("a");
        assert!(matches!(empty.get_text().unwrap_err().kind(), ErrorKind::MissingValue));

        let text = Element::with_text("a", "abc");
        assert!(matches!(
            text.get_int().unwrap_err().kind(),
            ErrorKind::TypeMismatch { expected: "integer", .. }
        ));
        assert!(text.get_bool().is_err());
        assert!(text.get_timestamp().is_err());
    }

    #[test]
    fn test_bool_accepts_numeric() {
        assert!(Element::with_text("a", "1").get_bool().unwrap());
        assert!(!Element::with_text("a", "FALSE").get_bool().unwrap());
    }

    #[test]
    fn test_children_named_keeps_order() {
        let mut root = Element::new("arr");
        for value in ["aaa", "bbb", "ccc"] {
            root.add_value_child(ARR_ITEM, value, &[], None);
        }
        root.add_child(Element::new("other"));
        let items: Vec<_> = root
            .children_named(ARR_ITEM)
            .map(|e| e.get_text().unwrap())
            .collect();
        assert_eq!(items, ["aaa", "bbb", "ccc"]);
        assert_eq!(root.children().len(), 4);
    }

    #[test]
    fn test_set_attribute_overwrites() {
        let mut e = Element::new("a").with_attribute(NIL_ATTRIBUTE, "1");
        e.set_attribute(NIL_ATTRIBUTE, "0");
        assert_eq!(e.attributes().count(), 1);
        assert!(!e.is_nil().unwrap());
    }
}
