//! Single-root XML documents.
//!
//! A [`Document`] owns exactly one root [`Element`]. Parsing folds the
//! [`XmlReader`] event stream into a tree; writing streams the tree through
//! an [`XmlWriter`].

use crate::element::Element;
use crate::error::{Error, Result};
use crate::reader::{Attribute, XmlEvent, XmlReader};
use crate::writer::{WriteOptions, XmlWriter};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, trace};

/// A parsed or constructed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
    version: String,
}

/// An element under construction while parsing.
struct OpenElement {
    element: Element,
    text: String,
    /// `false` for `<a/>`, which carries no text payload at all.
    has_text: bool,
}

impl OpenElement {
    fn new(name: &str, attributes: Vec<Attribute<'_>>, has_text: bool) -> Self {
        let mut element = Element::new(name.to_string());
        for attr in attributes {
            element.set_attribute(attr.name, attr.value);
        }
        Self {
            element,
            text: String::new(),
            has_text,
        }
    }

    /// Fixes up the text payload once all content has been seen.
    ///
    /// Leaves keep their text verbatim; elements with children only keep
    /// text that is not pure indentation.
    fn finish(mut self) -> Element {
        if !self.element.has_children() {
            if self.has_text {
                self.element.set_text(self.text);
            }
        } else if !self.text.trim().is_empty() {
            self.element.set_text(self.text.trim());
        }
        self.element
    }
}

impl Document {
    /// Wraps `root` in a document.
    pub fn new(root: Element) -> Self {
        Self {
            root,
            version: "1.0".to_string(),
        }
    }

    /// Returns the root element.
    #[inline]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Returns the root element mutably.
    #[inline]
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Consumes the document and returns its root.
    #[inline]
    pub fn into_root(self) -> Element {
        self.root
    }

    /// Returns the XML version from the declaration.
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Parses a document from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let mut reader = XmlReader::from_str(s);
        let mut version = None;
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut root = None;

        loop {
            let event = reader.next_event()?;
            let position = reader.position();
            match event {
                XmlEvent::Declaration {
                    version: v,
                    encoding,
                } => {
                    if root.is_some() || !stack.is_empty() || version.is_some() {
                        return Err(Error::parse("misplaced XML declaration").with_position(position));
                    }
                    if let Some(enc) = encoding {
                        if !enc.eq_ignore_ascii_case("utf-8") {
                            return Err(Error::encoding(format!("unsupported encoding: {}", enc))
                                .with_position(position));
                        }
                    }
                    version = Some(v.into_owned());
                }
                XmlEvent::StartElement { name, attributes } => {
                    if root.is_some() {
                        return Err(Error::parse("multiple root elements").with_position(position));
                    }
                    stack.push(OpenElement::new(name, attributes, true));
                }
                XmlEvent::EmptyElement { name, attributes } => {
                    let element = OpenElement::new(name, attributes, false).finish();
                    match stack.last_mut() {
                        Some(parent) => {
                            parent.element.add_child(element);
                        }
                        None if root.is_none() => root = Some(element),
                        None => {
                            return Err(Error::parse("multiple root elements").with_position(position))
                        }
                    }
                }
                XmlEvent::EndElement { name } => {
                    let open = stack.pop().ok_or_else(|| {
                        Error::parse(format!("unexpected closing tag: {}", name)).with_position(position)
                    })?;
                    let element = open.finish();
                    trace!(name = element.name(), children = element.children().len(), "parsed element");
                    match stack.last_mut() {
                        Some(parent) => {
                            parent.element.add_child(element);
                        }
                        None => root = Some(element),
                    }
                }
                XmlEvent::Text(text) => match stack.last_mut() {
                    Some(open) => open.text.push_str(&text),
                    None => {
                        return Err(Error::parse("text outside of the root element").with_position(position))
                    }
                },
                XmlEvent::CData(data) => match stack.last_mut() {
                    Some(open) => open.text.push_str(data),
                    None => {
                        return Err(Error::parse("CDATA outside of the root element").with_position(position))
                    }
                },
                XmlEvent::Eof => break,
            }
        }

        let root = root.ok_or_else(|| Error::parse("no root element"))?;
        debug!(root = root.name(), "parsed XML document");
        Ok(Self {
            root,
            version: version.unwrap_or_else(|| "1.0".to_string()),
        })
    }

    /// Parses a document from UTF-8 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| Error::encoding(format!("input is not UTF-8: {}", e)))?;
        Self::from_str(s.strip_prefix('\u{feff}').unwrap_or(s))
    }

    /// Reads and parses a document from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading XML document");
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Writes the document to `writer`.
    pub fn write_to<W: Write>(&self, writer: W, options: &WriteOptions) -> Result<()> {
        let mut xml = match &options.indent {
            Some(indent) => XmlWriter::with_indent(writer, indent.clone()),
            None => XmlWriter::new(writer),
        };
        if options.declaration {
            xml.write_declaration(&self.version, Some("UTF-8"))?;
        }
        xml.write_element(&self.root)?;
        xml.flush()?;
        Ok(())
    }

    /// Serializes the document to a string.
    pub fn to_string_with(&self, options: &WriteOptions) -> Result<String> {
        let buffer = self.to_bytes_with(options)?;
        String::from_utf8(buffer).map_err(|e| Error::encoding(format!("output is not UTF-8: {}", e)))
    }

    /// Serializes the document, either compact or indented.
    pub fn to_xml_string(&self, compact: bool) -> Result<String> {
        self.to_string_with(&WriteOptions::from_compact(compact))
    }

    /// Serializes the document as UTF-8 bytes.
    pub fn to_bytes(&self, compact: bool) -> Result<Vec<u8>> {
        self.to_bytes_with(&WriteOptions::from_compact(compact))
    }

    fn to_bytes_with(&self, options: &WriteOptions) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, options)?;
        Ok(buffer)
    }

    /// Writes the document to a file, replacing it if it exists.
    pub fn to_file<P: AsRef<Path>>(&self, path: P, compact: bool) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), root = self.root.name(), "writing XML document");
        fs::write(path, self.to_bytes(compact)?)?;
        Ok(())
    }
}

impl std::str::FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Document::from_str(s)
    }
}

impl From<Element> for Document {
    fn from(root: Element) -> Self {
        Document::new(root)
    }
}
