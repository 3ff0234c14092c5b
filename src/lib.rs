//! # xml_marshal
//!
//! Encode any Serde value as an XML element tree and decode it back.
//!
//! ## Features
//!
//! - Works with plain `#[derive(Serialize, Deserialize)]` types
//! - Order-independent decoding: every field is looked up by element name
//! - Optional values carry an explicit `isNil` marker
//! - Sequences, sets and string-keyed maps with stable element names
//! - Typed element accessors for reading documents by hand
//! - Errors carry the element path where they occurred
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use xml_marshal::{from_str, to_string};
//!
//! #[derive(Debug, Serialize, Deserialize, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let person = Person {
//!     name: "Alice".to_string(),
//!     age: 30,
//! };
//! let xml = to_string(&person).unwrap();
//! assert_eq!(
//!     xml,
//!     r#"<?xml version="1.0" encoding="UTF-8"?><Person><name>Alice</name><age>30</age></Person>"#
//! );
//!
//! let back: Person = from_str(&xml).unwrap();
//! assert_eq!(back, person);
//! ```
//!
//! ## Element Layout
//!
//! ```rust
//! use serde::Serialize;
//! use std::collections::BTreeMap;
//! use xml_marshal::to_string_pretty;
//!
//! #[derive(Serialize)]
//! struct Inventory {
//!     owner: Option<String>,
//!     items: Vec<String>,
//!     counts: BTreeMap<String, u32>,
//! }
//!
//! let inventory = Inventory {
//!     owner: None,
//!     items: vec!["apple".to_string(), "pear".to_string()],
//!     counts: [("apple".to_string(), 3)].into(),
//! };
//!
//! let xml = to_string_pretty(&inventory).unwrap();
//! assert_eq!(
//!     xml,
//!     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
//!      <Inventory>\n\
//!      \t<owner isNil=\"1\"></owner>\n\
//!      \t<items>\n\
//!      \t\t<arrItem>apple</arrItem>\n\
//!      \t\t<arrItem>pear</arrItem>\n\
//!      \t</items>\n\
//!      \t<counts>\n\
//!      \t\t<apple>3</apple>\n\
//!      \t</counts>\n\
//!      </Inventory>"
//! );
//! ```
//!
//! ## Reading Elements Directly
//!
//! ```rust
//! use xml_marshal::Document;
//!
//! let doc = Document::from_str("<cfg><port>8080</port><debug>true</debug></cfg>").unwrap();
//! let root = doc.root();
//! assert_eq!(root["port"].get_int().unwrap(), 8080);
//! assert!(root["debug"].get_bool().unwrap());
//! assert!(root["host"].get_text().is_err());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod de;
pub mod document;
pub mod element;
pub mod error;
pub mod escape;
pub mod reader;
pub mod scalar;
pub mod ser;
pub mod set;
pub mod traits;
pub mod writer;

// Re-export main types and functions
pub use de::{from_bytes, from_document, from_element, from_file, from_reader, from_str, Deserializer};
pub use document::Document;
pub use element::{Element, ARR_ITEM, NIL_ATTRIBUTE, SET_ITEM};
pub use error::{Error, ErrorKind, Position, Result};
pub use escape::{escape_attr, escape_text, unescape};
pub use reader::{is_valid_name, Attribute, XmlEvent, XmlReader};
pub use scalar::{FloatFormat, ScalarValue, Timestamp};
pub use ser::{
    default_root_name, to_document, to_element, to_file, to_string, to_string_pretty,
    to_string_with, to_string_with_root, to_vec, to_writer, Serializer,
};
pub use set::Set;
pub use traits::{Retrievable, Savable};
pub use writer::{IndentConfig, WriteOptions, XmlWriter};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::{BTreeSet, HashMap};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[allow(non_snake_case)]
    struct InternalStruct {
        a: i64,
        b: String,
        c: bool,
        d: f64,
        e: Timestamp,
        optA: Option<i64>,
        optB: Option<String>,
    }

    impl Default for InternalStruct {
        fn default() -> Self {
            Self {
                a: 10,
                b: "b".to_string(),
                c: true,
                d: 20.2,
                e: Timestamp::now(),
                optA: Some(1),
                optB: None,
            }
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[allow(non_snake_case)]
    struct MyClass {
        internalStruct: InternalStruct,
        arr: Vec<String>,
        dict: HashMap<String, i64>,
    }

    fn sample() -> MyClass {
        MyClass {
            internalStruct: InternalStruct {
                a: 100,
                b: "bbb".to_string(),
                c: false,
                d: 200.232,
                e: Timestamp::now(),
                optA: None,
                optB: Some("optB_new".to_string()),
            },
            arr: vec!["aaa".to_string(), "bbb".to_string(), "ccc".to_string()],
            dict: [("a", 1), ("b", 10), ("c", 100)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    fn assert_same(original: &MyClass, decoded: &MyClass) {
        let (x, y) = (&original.internalStruct, &decoded.internalStruct);
        assert_eq!(x.a, y.a);
        assert_eq!(x.b, y.b);
        assert_eq!(x.c, y.c);
        assert!((x.d - y.d).abs() < 1e-6);
        assert!(x.e.approx_eq(y.e, 0.01));
        assert_eq!(x.optA, y.optA);
        assert_eq!(x.optB, y.optB);
        assert_eq!(original.arr, decoded.arr);
        assert_eq!(original.dict, decoded.dict);
    }

    #[test]
    fn test_roundtrip_my_class() {
        let original = sample();
        for compact in [true, false] {
            let xml = original.to_xml_string(None, compact).unwrap();
            assert!(xml.contains("<MyClass>"));
            let decoded = MyClass::from_xml_str(&xml).unwrap();
            assert_same(&original, &decoded);
        }
    }

    #[test]
    fn test_my_class_layout() {
        let original = sample();
        let doc = to_document(&original, None).unwrap();
        let root = doc.root();
        assert_eq!(root.name(), "MyClass");

        let internal = &root["internalStruct"];
        assert_eq!(internal["a"].text(), Some("100"));
        assert_eq!(internal["c"].text(), Some("false"));
        assert_eq!(internal["d"].text(), Some("200.232000"));
        assert_eq!(internal["optA"].attribute(NIL_ATTRIBUTE), Some("1"));
        assert_eq!(internal["optA"].text(), Some(""));
        assert_eq!(internal["optB"].attribute(NIL_ATTRIBUTE), Some("0"));
        assert_eq!(internal["optB"].text(), Some("optB_new"));

        let arr: Vec<_> = root["arr"].children_named(ARR_ITEM).filter_map(Element::text).collect();
        assert_eq!(arr, ["aaa", "bbb", "ccc"]);
        assert_eq!(root["dict"]["c"].get_int().unwrap(), 100);
    }

    #[test]
    fn test_decoding_ignores_sibling_order() {
        let xml = r#"
            <MyClass>
                <dict><b>10</b><a>1</a></dict>
                <arr><arrItem>x</arrItem></arr>
                <internalStruct>
                    <optB isNil="1"></optB>
                    <optA isNil="0">5</optA>
                    <e>1442400000.5</e>
                    <d>1.5</d>
                    <c>true</c>
                    <b>text</b>
                    <a>-1</a>
                </internalStruct>
            </MyClass>
        "#;
        let decoded: MyClass = from_str(xml).unwrap();
        assert_eq!(decoded.internalStruct.a, -1);
        assert_eq!(decoded.internalStruct.optA, Some(5));
        assert_eq!(decoded.internalStruct.optB, None);
        assert_eq!(decoded.internalStruct.e.epoch_seconds(), 1_442_400_000.5);
        assert_eq!(decoded.dict.len(), 2);
    }

    #[test]
    fn test_failed_decode_reports_path() {
        let xml = sample().to_xml_string(None, true).unwrap();
        assert!(xml.contains("<c>false</c>"));
        let broken = xml.replace("<c>false</c>", "");

        let err = MyClass::from_xml_str(&broken).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingField(f) if f == "c"));
        assert_eq!(err.path().as_deref(), Some("MyClass/internalStruct"));
    }

    #[test]
    fn test_type_mismatch_in_document() {
        let xml = "<InternalStruct><a>ten</a><b>b</b><c>true</c><d>1</d><e>0</e>\
                   <optA isNil=\"1\"></optA><optB isNil=\"1\"></optB></InternalStruct>";
        let err = InternalStruct::from_xml_str(xml).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::TypeMismatch { expected: "integer", found } if found == "ten"
        ));
        assert_eq!(err.path().as_deref(), Some("InternalStruct/a"));
    }

    #[test]
    fn test_legacy_date_is_accepted() {
        let xml = "<InternalStruct><a>1</a><b>b</b><c>1</c><d>1</d><e>20150916_123000</e>\
                   <optA isNil=\"1\"></optA><optB isNil=\"1\"></optB></InternalStruct>";
        let decoded = InternalStruct::from_xml_str(xml).unwrap();
        assert_eq!(decoded.e.epoch_seconds(), 1_442_406_600.0);
        assert!(decoded.c);
    }

    #[test]
    fn test_default_values_roundtrip() {
        let original = MyClass::default();
        let decoded = MyClass::from_xml_str(&original.to_xml_string(None, true).unwrap()).unwrap();
        assert_same(&original, &decoded);
        assert!(decoded.arr.is_empty());
        assert!(decoded.dict.is_empty());
    }

    #[test]
    fn test_roundtrip_escaped() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Data {
            content: String,
            padded: String,
        }

        let original = Data {
            content: "<hello> & \"world\"".to_string(),
            padded: "  two  spaces  ".to_string(),
        };

        for xml in [to_string(&original).unwrap(), to_string_pretty(&original).unwrap()] {
            let parsed: Data = from_str(&xml).unwrap();
            assert_eq!(original, parsed);
        }
    }

    #[test]
    fn test_roundtrip_nested_collections() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Matrix {
            rows: Vec<Vec<u8>>,
            lookup: HashMap<String, Vec<Option<i32>>>,
            #[serde(with = "crate::set")]
            tags: BTreeSet<String>,
        }

        let original = Matrix {
            rows: vec![vec![1, 2], vec![], vec![3]],
            lookup: [("k".to_string(), vec![Some(1), None])].into(),
            tags: ["x".to_string(), "y".to_string()].into(),
        };

        let xml = to_string_pretty(&original).unwrap();
        let parsed: Matrix = from_str(&xml).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_sets_in_any_position() {
        let original: HashMap<String, Option<Set<BTreeSet<String>>>> = [
            ("some".to_string(), Some(Set(["a".to_string()].into()))),
            ("none".to_string(), None),
        ]
        .into();

        let xml = to_string(&original).unwrap();
        assert!(xml.contains(r#"<some isNil="0"><setItem>a</setItem></some>"#));
        let parsed: HashMap<String, Option<Set<BTreeSet<String>>>> = from_str(&xml).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_key_spelled_like_missing_element() {
        let original: HashMap<String, i32> = [(element::NOT_FOUND_NAME.to_string(), 1)].into();
        let xml = to_string(&original).unwrap();
        let parsed: HashMap<String, i32> = from_str(&xml).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_xml_reader_basic() {
        let mut reader = XmlReader::from_str("<root><child>text</child></root>");

        match reader.next_event().unwrap() {
            XmlEvent::StartElement { name, .. } => assert_eq!(name, "root"),
            _ => panic!("expected StartElement"),
        }

        match reader.next_event().unwrap() {
            XmlEvent::StartElement { name, .. } => assert_eq!(name, "child"),
            _ => panic!("expected StartElement"),
        }

        match reader.next_event().unwrap() {
            XmlEvent::Text(text) => assert_eq!(text, "text"),
            _ => panic!("expected Text"),
        }
    }

    #[test]
    fn test_error_reporting() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Item {
            name: String,
        }

        let err = from_str::<Item>("<Item><name>test</wrong></Item>").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Parse(_)));
        assert!(err.to_string().contains("mismatched"));
        assert!(err.position().is_some());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my_class.xml");
        let original = sample();
        original.to_xml_file(None, false, &path).unwrap();

        let decoded = MyClass::from_xml_file(&path).unwrap();
        assert_same(&original, &decoded);

        let decoded: MyClass = from_file(&path).unwrap();
        assert_same(&original, &decoded);
    }
}
