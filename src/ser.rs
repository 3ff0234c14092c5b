//! Serde serializer producing XML element trees.
//!
//! Values are mapped onto elements by shape:
//!
//! | value | element |
//! |---|---|
//! | scalar | text payload |
//! | `None` / `Some(v)` | `isNil="1"` with empty text / `v` with `isNil="0"` |
//! | sequence, tuple | one `arrItem` child per item |
//! | set (see [`crate::set`]) | one `setItem` child per item |
//! | map | one child per entry, named after the key |
//! | struct | one child per field, named after the field |
//! | unit enum variant | the variant name as text |
//! | other enum variant | a single child named after the variant |
//!
//! ```rust
//! use serde::Serialize;
//! use xml_marshal::to_string;
//!
//! #[derive(Serialize)]
//! struct Point {
//!     x: i32,
//!     label: Option<String>,
//! }
//!
//! let xml = to_string(&Point { x: 3, label: None }).unwrap();
//! assert!(xml.ends_with(r#"<Point><x>3</x><label isNil="1"></label></Point>"#));
//! ```

use crate::document::Document;
use crate::element::{Element, ARR_ITEM, NIL_ATTRIBUTE, SET_ITEM};
use crate::error::{Error, Result};
use crate::reader::is_valid_name;
use crate::scalar::{FloatFormat, ScalarValue};
use crate::set::SET_TOKEN;
use crate::writer::WriteOptions;
use serde::ser::{self, Impossible, Serialize};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

/// Returns the root element name used when none is given: the type's
/// name without module path or generic arguments.
///
/// ```rust
/// assert_eq!(xml_marshal::default_root_name::<Vec<String>>(), "Vec");
/// ```
pub fn default_root_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);
    if is_valid_name(short) {
        short.to_string()
    } else {
        "value".to_string()
    }
}

/// Encodes `value` as an element named `root_name`.
pub fn to_element<T>(value: &T, root_name: &str) -> Result<Element>
where
    T: Serialize + ?Sized,
{
    if !is_valid_name(root_name) {
        return Err(Error::invalid_name(root_name));
    }
    value
        .serialize(Serializer::new(root_name.to_string()))
        .map_err(|e| e.in_element(root_name))
}

/// Encodes `value` as a document; the root name defaults to the type name.
pub fn to_document<T>(value: &T, root_name: Option<&str>) -> Result<Document>
where
    T: Serialize + ?Sized,
{
    let root = match root_name {
        Some(name) => to_element(value, name)?,
        None => to_element(value, &default_root_name::<T>())?,
    };
    Ok(Document::new(root))
}

/// Serializes a value to a compact XML string.
///
/// # Example
///
/// ```
/// use serde::Serialize;
/// use xml_marshal::to_string;
///
/// #[derive(Serialize)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let person = Person {
///     name: "Alice".to_string(),
///     age: 30,
/// };
///
/// let xml = to_string(&person).unwrap();
/// assert!(xml.contains("<name>Alice</name>"));
/// ```
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    to_string_with(value, None, &WriteOptions::compact())
}

/// Serializes a value to an indented XML string.
pub fn to_string_pretty<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    to_string_with(value, None, &WriteOptions::pretty())
}

/// Serializes a value to a compact XML string with a root element name.
pub fn to_string_with_root<T>(value: &T, root: &str) -> Result<String>
where
    T: Serialize + ?Sized,
{
    to_string_with(value, Some(root), &WriteOptions::compact())
}

/// Serializes a value to an XML string with full control over the output.
pub fn to_string_with<T>(value: &T, root: Option<&str>, options: &WriteOptions) -> Result<String>
where
    T: Serialize + ?Sized,
{
    to_document(value, root)?.to_string_with(options)
}

/// Serializes a value to compact UTF-8 XML bytes.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    Ok(to_string(value)?.into_bytes())
}

/// Serializes a value to a writer.
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    to_document(value, None)?.write_to(writer, &WriteOptions::compact())
}

/// Serializes a value to an indented XML file.
pub fn to_file<P, T>(path: P, value: &T) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize + ?Sized,
{
    to_document(value, None)?.to_file(path, false)
}

/// The XML serializer.
///
/// Each call consumes the serializer and yields the finished element, so a
/// serializer is configured once and then cloned for every child.
#[derive(Debug, Clone)]
pub struct Serializer {
    /// Name of the element being produced.
    name: Cow<'static, str>,
    float_format: FloatFormat,
    /// Tag for sequence items.
    item_tag: &'static str,
}

impl Serializer {
    /// Creates a serializer producing an element called `name`.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            float_format: FloatFormat::default(),
            item_tag: ARR_ITEM,
        }
    }

    /// Sets how floats and timestamps are rendered.
    pub fn with_float_format(mut self, float_format: FloatFormat) -> Self {
        self.float_format = float_format;
        self
    }

    /// Sets the tag used for sequence items.
    pub fn with_item_tag(mut self, item_tag: &'static str) -> Self {
        self.item_tag = item_tag;
        self
    }

    /// Returns a serializer for a child element with the same settings.
    fn child(&self, name: impl Into<Cow<'static, str>>) -> Serializer {
        Serializer {
            name: name.into(),
            float_format: self.float_format,
            item_tag: ARR_ITEM,
        }
    }

    fn scalar(self, value: impl Into<ScalarValue>) -> Result<Element> {
        Ok(Element::scalar(self.name, value, self.float_format))
    }

    /// Wraps a variant's content element in the element for the enum itself.
    fn variant(self, content: Element) -> Element {
        let mut outer = Element::new(self.name);
        outer.add_child(content);
        outer
    }
}

impl ser::Serializer for Serializer {
    type Ok = Element;
    type Error = Error;

    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = SeqSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = StructSerializer;

    fn serialize_bool(self, v: bool) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_i8(self, v: i8) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_i16(self, v: i16) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_i32(self, v: i32) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_i64(self, v: i64) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_i128(self, v: i128) -> Result<Element> {
        Ok(Element::with_text(self.name, itoa::Buffer::new().format(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_u16(self, v: u16) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_u32(self, v: u32) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Element> {
        Ok(Element::with_text(self.name, itoa::Buffer::new().format(v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_f64(self, v: f64) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_char(self, v: char) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_str(self, v: &str) -> Result<Element> {
        self.scalar(v)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Element> {
        Err(Error::not_savable("raw byte buffers"))
    }

    fn serialize_none(self) -> Result<Element> {
        Ok(Element::with_text(self.name, "").with_attribute(NIL_ATTRIBUTE, "1"))
    }

    fn serialize_some<T>(self, value: &T) -> Result<Element>
    where
        T: ?Sized + Serialize,
    {
        let mut element = value.serialize(self)?;
        // A nested `Some(None)` keeps its "1"; nested options collapse.
        if element.attribute(NIL_ATTRIBUTE).is_none() {
            element.set_attribute(NIL_ATTRIBUTE, "0");
        }
        Ok(element)
    }

    fn serialize_unit(self) -> Result<Element> {
        Ok(Element::new(self.name))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Element> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Element> {
        Ok(Element::with_text(self.name, variant))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Element>
    where
        T: ?Sized + Serialize,
    {
        if name == SET_TOKEN {
            value.serialize(self.with_item_tag(SET_ITEM))
        } else {
            value.serialize(self)
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Element>
    where
        T: ?Sized + Serialize,
    {
        let content = value
            .serialize(self.child(variant))
            .map_err(|e| e.in_element(variant))?;
        Ok(self.variant(content))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<SeqSerializer> {
        Ok(SeqSerializer::new(self, None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SeqSerializer> {
        let content = self.child(variant);
        Ok(SeqSerializer::new(content, Some(Element::new(self.name))))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapSerializer> {
        Ok(MapSerializer {
            element: Element::new(self.name.clone()),
            template: self,
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<StructSerializer> {
        Ok(StructSerializer::new(self, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<StructSerializer> {
        let content = self.child(variant);
        Ok(StructSerializer::new(content, Some(Element::new(self.name))))
    }
}

/// Serializer for sequences, tuples and tuple variants.
pub struct SeqSerializer {
    element: Element,
    template: Serializer,
    /// Enum element wrapping `element`, for tuple variants.
    outer: Option<Element>,
}

impl SeqSerializer {
    fn new(serializer: Serializer, outer: Option<Element>) -> Self {
        Self {
            element: Element::with_text(serializer.name.clone(), ""),
            template: serializer,
            outer,
        }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let tag = self.template.item_tag;
        let index = self.element.children().len();
        let item = value
            .serialize(self.template.child(tag))
            .map_err(|e| e.in_element(format!("{}[{}]", tag, index)))?;
        self.element.add_child(item);
        Ok(())
    }

    fn finish(mut self) -> Result<Element> {
        if self.element.has_children() {
            self.element.clear_text();
        }
        match self.outer {
            Some(mut outer) => {
                outer.add_child(self.element);
                Ok(outer)
            }
            None => Ok(self.element),
        }
    }
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = Element;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Element> {
        self.finish()
    }
}

impl ser::SerializeTuple for SeqSerializer {
    type Ok = Element;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Element> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SeqSerializer {
    type Ok = Element;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Element> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for SeqSerializer {
    type Ok = Element;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Element> {
        self.finish()
    }
}

/// Serializer for maps; every key becomes a child element name.
pub struct MapSerializer {
    element: Element,
    template: Serializer,
    key: Option<String>,
}

impl ser::SerializeMap for MapSerializer {
    type Ok = Element;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = key.serialize(KeySerializer)?;
        if !is_valid_name(&key) {
            return Err(Error::invalid_name(key));
        }
        self.key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called before serialize_key"))?;
        let entry = value
            .serialize(self.template.child(key.clone()))
            .map_err(|e| e.in_element(key))?;
        self.element.add_child(entry);
        Ok(())
    }

    fn end(self) -> Result<Element> {
        Ok(self.element)
    }
}

/// Serializer for structs and struct variants.
pub struct StructSerializer {
    element: Element,
    template: Serializer,
    /// Enum element wrapping `element`, for struct variants.
    outer: Option<Element>,
}

impl StructSerializer {
    fn new(serializer: Serializer, outer: Option<Element>) -> Self {
        Self {
            element: Element::new(serializer.name.clone()),
            template: serializer,
            outer,
        }
    }

    fn field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let field = value
            .serialize(self.template.child(key))
            .map_err(|e| e.in_element(key))?;
        self.element.add_child(field);
        Ok(())
    }

    fn finish(self) -> Result<Element> {
        match self.outer {
            Some(mut outer) => {
                outer.add_child(self.element);
                Ok(outer)
            }
            None => Ok(self.element),
        }
    }
}

impl ser::SerializeStruct for StructSerializer {
    type Ok = Element;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Element> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for StructSerializer {
    type Ok = Element;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Element> {
        self.finish()
    }
}

/// Serializes map keys to element names. Only text-like keys are accepted.
struct KeySerializer;

macro_rules! reject_key {
    ($($method:ident($($arg:ty),*) => $kind:expr;)*) => {
        $(
            fn $method(self $(, _: $arg)*) -> Result<String> {
                Err(Error::key_type_not_supported($kind))
            }
        )*
    };
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    reject_key! {
        serialize_bool(bool) => "boolean";
        serialize_i8(i8) => "integer";
        serialize_i16(i16) => "integer";
        serialize_i32(i32) => "integer";
        serialize_i64(i64) => "integer";
        serialize_u8(u8) => "integer";
        serialize_u16(u16) => "integer";
        serialize_u32(u32) => "integer";
        serialize_u64(u64) => "integer";
        serialize_f32(f32) => "floating point number";
        serialize_f64(f64) => "floating point number";
        serialize_bytes(&[u8]) => "bytes";
        serialize_none() => "option";
        serialize_unit() => "unit";
        serialize_unit_struct(&'static str) => "unit struct";
    }

    fn serialize_some<T>(self, _value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::key_type_not_supported("option"))
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::key_type_not_supported("enum variant with data"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::key_type_not_supported("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::key_type_not_supported("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::key_type_not_supported("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::key_type_not_supported("enum variant with data"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::key_type_not_supported("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::key_type_not_supported("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::key_type_not_supported("enum variant with data"))
    }
}
