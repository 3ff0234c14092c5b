//! Serde deserializer for XML element trees.
//!
//! The input is parsed into a [`Document`] first; the [`Deserializer`] then
//! walks the tree, so every lookup is by element name and never depends on
//! the order of siblings in the file.

use crate::document::Document;
use crate::element::{Element, ARR_ITEM, SET_ITEM};
use crate::error::{Error, Result};
use crate::scalar::TIMESTAMP_TOKEN;
use serde::de::value::BorrowedStrDeserializer;
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};
use std::io::Read;
use std::path::Path;
use tracing::trace;

/// Deserializes a value from an element, borrowing strings from it.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use xml_marshal::{from_element, Element};
///
/// #[derive(Deserialize)]
/// struct Person<'a> {
///     name: &'a str,
///     age: u32,
/// }
///
/// let mut root = Element::new("Person");
/// root.add_value_child("name", "Alice", &[], None);
/// root.add_value_child("age", 30, &[], None);
///
/// let person: Person<'_> = from_element(&root).unwrap();
/// assert_eq!(person.name, "Alice");
/// assert_eq!(person.age, 30);
/// ```
pub fn from_element<'de, T>(element: &'de Element) -> Result<T>
where
    T: de::Deserialize<'de>,
{
    trace!(root = element.name(), "decoding element tree");
    T::deserialize(Deserializer::new(element)).map_err(|e| e.in_element(element.name()))
}

/// Deserializes a value from the root of a document.
pub fn from_document<'de, T>(document: &'de Document) -> Result<T>
where
    T: de::Deserialize<'de>,
{
    from_element(document.root())
}

/// Deserializes a value from an XML string.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use xml_marshal::from_str;
///
/// #[derive(Deserialize)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let xml = "<Person><name>Alice</name><age>30</age></Person>";
/// let person: Person = from_str(xml).unwrap();
/// assert_eq!(person.name, "Alice");
/// assert_eq!(person.age, 30);
/// ```
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_document(&Document::from_str(s)?)
}

/// Deserializes a value from UTF-8 XML bytes.
pub fn from_bytes<T>(bytes: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_document(&Document::from_bytes(bytes)?)
}

/// Deserializes a value from a reader.
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    from_bytes(&bytes)
}

/// Deserializes a value from an XML file.
pub fn from_file<P, T>(path: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    from_document(&Document::from_file(path)?)
}

/// The XML deserializer, positioned on one element.
#[derive(Debug, Clone, Copy)]
pub struct Deserializer<'de> {
    element: &'de Element,
}

impl<'de> Deserializer<'de> {
    /// Creates a deserializer reading `element`.
    #[inline]
    pub fn new(element: &'de Element) -> Self {
        Self { element }
    }

    /// Fails on the "not found" sentinel.
    fn available(&self) -> Result<&'de Element> {
        self.element.available().ok_or_else(Error::not_available)
    }

    fn text(&self) -> Result<&'de str> {
        self.element.get_text()
    }

    fn parse<T: std::str::FromStr>(&self, expected: &'static str) -> Result<T> {
        self.element.get_parsed(expected)
    }

    /// Sequence items: children tagged `arrItem` or `setItem`, in document order.
    fn items(&self) -> Result<Vec<&'de Element>> {
        let element = self.available()?;
        Ok(element.children().iter().filter(|c| is_item(c)).collect())
    }
}

fn is_item(element: &Element) -> bool {
    element.name() == ARR_ITEM || element.name() == SET_ITEM
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident, $expected:expr;)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                visitor.$visit(self.parse($expected)?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let element = self.available()?;
        if element.has_children() {
            if element.children().iter().all(is_item) {
                self.deserialize_seq(visitor)
            } else {
                self.deserialize_map(visitor)
            }
        } else if element.is_nil().unwrap_or(false) {
            visitor.visit_none()
        } else {
            match element.text() {
                Some(text) => visitor.visit_borrowed_str(text),
                None => visitor.visit_unit(),
            }
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bool(self.element.get_bool()?)
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8, "integer";
        deserialize_i16 => visit_i16, "integer";
        deserialize_i32 => visit_i32, "integer";
        deserialize_i64 => visit_i64, "integer";
        deserialize_i128 => visit_i128, "integer";
        deserialize_u8 => visit_u8, "unsigned integer";
        deserialize_u16 => visit_u16, "unsigned integer";
        deserialize_u32 => visit_u32, "unsigned integer";
        deserialize_u64 => visit_u64, "unsigned integer";
        deserialize_u128 => visit_u128, "unsigned integer";
        deserialize_f32 => visit_f32, "floating point number";
        deserialize_f64 => visit_f64, "floating point number";
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let text = self.text()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::type_mismatch("character", text)),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.text()?)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_bytes(self.text()?.as_bytes())
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.element.is_nil()? {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.available()?;
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if name == TIMESTAMP_TOKEN {
            visitor.visit_f64(self.element.get_timestamp()?.epoch_seconds())
        } else {
            visitor.visit_newtype_struct(self)
        }
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(ItemAccess::new(self.items()?))
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let items = self.items()?;
        if items.len() < len {
            return Err(Error::missing_children(len, items.len()));
        }
        visitor.visit_seq(ItemAccess::new(items))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let element = self.available()?;
        visitor.visit_map(EntryAccess {
            children: element.children().iter(),
            value: None,
        })
    }

    /// Every name in `fields` must have a child element before any field is
    /// decoded. Serde lists `#[serde(alias)]` names there too, so a struct
    /// with an alias only decodes when the alias element is also present.
    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let element = self.available()?;
        if let Some(field) = fields.iter().find(|f| !element.child(f).is_available()) {
            return Err(Error::missing_field(*field));
        }
        visitor.visit_map(FieldAccess {
            element,
            fields: fields.iter(),
            current: None,
        })
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let element = self.available()?;
        let access = match element.children().first() {
            Some(content) => VariantAccess {
                variant: content.name(),
                content: Some(content),
            },
            None => VariantAccess {
                variant: self.text()?.trim(),
                content: None,
            },
        };
        visitor.visit_enum(access)
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// Walks the items of a sequence.
struct ItemAccess<'de> {
    items: std::vec::IntoIter<&'de Element>,
    index: usize,
}

impl<'de> ItemAccess<'de> {
    fn new(items: Vec<&'de Element>) -> Self {
        Self {
            items: items.into_iter(),
            index: 0,
        }
    }
}

impl<'de> de::SeqAccess<'de> for ItemAccess<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        let Some(item) = self.items.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(Deserializer::new(item))
            .map(Some)
            .map_err(|e| e.in_element(format!("{}[{}]", item.name(), index)))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Walks all children of a map element; each child name is a key.
struct EntryAccess<'de> {
    children: std::slice::Iter<'de, Element>,
    value: Option<&'de Element>,
}

impl<'de> de::MapAccess<'de> for EntryAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(child) = self.children.next() else {
            return Ok(None);
        };
        self.value = Some(child);
        seed.deserialize(KeyDeserializer { key: child.name() })
            .map(Some)
            .map_err(|e| e.in_element(child.name()))
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let child = self
            .value
            .take()
            .ok_or_else(|| Error::custom("next_value called before next_key"))?;
        seed.deserialize(Deserializer::new(child))
            .map_err(|e| e.in_element(child.name()))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.children.len())
    }
}

/// Walks the declared fields of a struct, looking each one up by name.
struct FieldAccess<'de> {
    element: &'de Element,
    fields: std::slice::Iter<'static, &'static str>,
    current: Option<&'static str>,
}

impl<'de> de::MapAccess<'de> for FieldAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(&field) = self.fields.next() else {
            return Ok(None);
        };
        self.current = Some(field);
        seed.deserialize(BorrowedStrDeserializer::new(field)).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let field = self
            .current
            .take()
            .ok_or_else(|| Error::custom("next_value called before next_key"))?;
        seed.deserialize(Deserializer::new(self.element.child(field)))
            .map_err(|e| e.in_element(field))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

/// An enum value: either a unit variant spelled as text or a single child
/// named after the variant.
struct VariantAccess<'de> {
    variant: &'de str,
    content: Option<&'de Element>,
}

impl<'de> VariantAccess<'de> {
    fn content(&self) -> Result<Deserializer<'de>> {
        self.content
            .map(Deserializer::new)
            .ok_or_else(|| Error::field_assignment(format!("variant `{}` has no content", self.variant)))
    }
}

impl<'de> de::EnumAccess<'de> for VariantAccess<'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(BorrowedStrDeserializer::<Error>::new(self.variant))?;
        Ok((variant, self))
    }
}

impl<'de> de::VariantAccess<'de> for VariantAccess<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.content()?)
            .map_err(|e| e.in_element(self.variant))
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self.content()?, len, visitor)
            .map_err(|e| e.in_element(self.variant))
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_struct(self.content()?, "", fields, visitor)
            .map_err(|e| e.in_element(self.variant))
    }
}

/// Deserializes a map key from an element name. Only text-like keys are
/// accepted, mirroring what the serializer can write.
struct KeyDeserializer<'de> {
    key: &'de str,
}

macro_rules! reject_key {
    ($($method:ident => $kind:expr;)*) => {
        $(
            fn $method<V>(self, _visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                Err(Error::key_type_not_supported($kind))
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for KeyDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.key)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.key)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.key)
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.key)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::type_mismatch("character", self.key)),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let variant: de::value::StrDeserializer<'_, Error> = self.key.into_deserializer();
        visitor.visit_enum(variant)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    reject_key! {
        deserialize_bool => "boolean";
        deserialize_i8 => "integer";
        deserialize_i16 => "integer";
        deserialize_i32 => "integer";
        deserialize_i64 => "integer";
        deserialize_u8 => "integer";
        deserialize_u16 => "integer";
        deserialize_u32 => "integer";
        deserialize_u64 => "integer";
        deserialize_f32 => "floating point number";
        deserialize_f64 => "floating point number";
        deserialize_bytes => "bytes";
        deserialize_byte_buf => "bytes";
        deserialize_option => "option";
        deserialize_unit => "unit";
        deserialize_seq => "sequence";
        deserialize_map => "map";
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::key_type_not_supported("unit struct"))
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::key_type_not_supported("tuple"))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::key_type_not_supported("tuple struct"))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(Error::key_type_not_supported("struct"))
    }
}
