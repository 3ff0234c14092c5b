//! Method-style entry points for types that can be saved and retrieved.
//!
//! Any `Serialize` type is [`Savable`] and any `DeserializeOwned` type is
//! [`Retrievable`], so deriving the serde traits is all a type needs.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use xml_marshal::{Retrievable, Savable};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Settings {
//!     volume: u8,
//! }
//!
//! let xml = Settings { volume: 7 }.to_xml_string(None, true).unwrap();
//! assert!(xml.contains("<Settings><volume>7</volume></Settings>"));
//! assert_eq!(Settings::from_xml_str(&xml).unwrap(), Settings { volume: 7 });
//! ```

use crate::document::Document;
use crate::element::Element;
use crate::error::Result;
use crate::{de, ser};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// A value that can be encoded as XML.
pub trait Savable {
    /// Encodes the value as an element named `root_name`.
    fn to_element(&self, root_name: &str) -> Result<Element>;

    /// Root name used when none is given: the short type name.
    fn default_root_name(&self) -> String {
        ser::default_root_name::<Self>()
    }

    /// Encodes the value as a document.
    fn to_document(&self, root_name: Option<&str>) -> Result<Document> {
        let root = match root_name {
            Some(name) => self.to_element(name)?,
            None => self.to_element(&self.default_root_name())?,
        };
        Ok(Document::new(root))
    }

    /// Encodes the value as XML text, compact or indented.
    fn to_xml_string(&self, root_name: Option<&str>, compact: bool) -> Result<String> {
        self.to_document(root_name)?.to_xml_string(compact)
    }

    /// Encodes the value as UTF-8 XML bytes.
    fn to_xml_bytes(&self, root_name: Option<&str>, compact: bool) -> Result<Vec<u8>> {
        self.to_document(root_name)?.to_bytes(compact)
    }

    /// Writes the value to an XML file, replacing it if it exists.
    fn to_xml_file<P: AsRef<Path>>(&self, root_name: Option<&str>, compact: bool, path: P) -> Result<()> {
        self.to_document(root_name)?.to_file(path, compact)
    }
}

impl<T: Serialize + ?Sized> Savable for T {
    fn to_element(&self, root_name: &str) -> Result<Element> {
        ser::to_element(self, root_name)
    }
}

/// A value that can be decoded from XML.
pub trait Retrievable: Sized {
    /// Decodes a value from an element.
    fn from_element(element: &Element) -> Result<Self>;

    /// Decodes a value from the root of a document.
    fn from_document(document: &Document) -> Result<Self> {
        Self::from_element(document.root())
    }

    /// Decodes a value from XML text.
    fn from_xml_str(s: &str) -> Result<Self> {
        Self::from_document(&Document::from_str(s)?)
    }

    /// Decodes a value from UTF-8 XML bytes.
    fn from_xml_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_document(&Document::from_bytes(bytes)?)
    }

    /// Decodes a value from an XML file.
    fn from_xml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_document(&Document::from_file(path)?)
    }
}

impl<T: DeserializeOwned> Retrievable for T {
    fn from_element(element: &Element) -> Result<Self> {
        de::from_element(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        n: i32,
    }

    #[test]
    fn test_default_root_name() {
        let counter = Counter { n: 1 };
        assert_eq!(counter.default_root_name(), "Counter");
        assert_eq!(counter.to_document(None).unwrap().root().name(), "Counter");
        assert_eq!(counter.to_document(Some("c")).unwrap().root().name(), "c");
    }

    #[test]
    fn test_bytes_roundtrip() {
        let counter = Counter { n: -4 };
        let bytes = counter.to_xml_bytes(Some("counter"), false).unwrap();
        assert_eq!(Counter::from_xml_bytes(&bytes).unwrap(), counter);
    }

    #[test]
    fn test_root_name_is_not_checked_on_decode() {
        let counter = Counter::from_xml_str("<anything><n>3</n></anything>").unwrap();
        assert_eq!(counter, Counter { n: 3 });
    }

    #[test]
    fn test_unsized_values() {
        let items: &[i32] = &[1, 2];
        let element = items.to_element("items").unwrap();
        assert_eq!(element.children().len(), 2);
        assert_eq!("hi".to_xml_string(Some("s"), true).unwrap(), r#"<?xml version="1.0" encoding="UTF-8"?><s>hi</s>"#);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter.xml");
        Counter { n: 9 }.to_xml_file(None, true, &path).unwrap();
        assert_eq!(Counter::from_xml_file(&path).unwrap(), Counter { n: 9 });
    }
}
