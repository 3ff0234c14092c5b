//! Low-level XML writer.
//!
//! Streams well-formed XML to any [`Write`] sink, either compact or
//! indented. Indentation is only ever inserted between sibling elements,
//! never inside a text payload, so pretty output parses back to the same tree.

use crate::element::Element;
use crate::escape::{escape_attr, escape_text};
use std::io::{self, Write};

/// Indentation configuration.
#[derive(Debug, Clone)]
pub struct IndentConfig {
    /// Characters to use for each level of indentation.
    pub indent_str: String,
    /// Whether to start each element on a new line.
    pub newlines: bool,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            indent_str: "\t".to_string(),
            newlines: true,
        }
    }
}

/// Options controlling how a document is written.
///
/// These only affect whitespace and the declaration, never structure.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Indentation, or `None` for compact output.
    pub indent: Option<IndentConfig>,
    /// Whether to emit `<?xml version="1.0" encoding="UTF-8"?>`.
    pub declaration: bool,
}

impl WriteOptions {
    /// Single-line output with a declaration.
    pub fn compact() -> Self {
        Self {
            indent: None,
            declaration: true,
        }
    }

    /// Indented output with a declaration.
    pub fn pretty() -> Self {
        Self {
            indent: Some(IndentConfig::default()),
            declaration: true,
        }
    }

    /// Picks [`compact`](Self::compact) or [`pretty`](Self::pretty).
    pub fn from_compact(compact: bool) -> Self {
        if compact {
            Self::compact()
        } else {
            Self::pretty()
        }
    }

    /// Sets whether the declaration is written.
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::pretty()
    }
}

/// What was written last, which decides where indentation goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Nothing,
    Declaration,
    StartTag,
    Text,
    EndTag,
}

/// An XML writer that produces well-formed XML output.
pub struct XmlWriter<W: Write> {
    writer: W,
    /// Stack of open element names.
    element_stack: Vec<String>,
    /// Whether the current start tag is still open (before its `>`).
    in_tag: bool,
    indent: Option<IndentConfig>,
    last: Last,
}

impl<W: Write> XmlWriter<W> {
    /// Creates a compact XML writer.
    #[inline]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            element_stack: Vec::new(),
            in_tag: false,
            indent: None,
            last: Last::Nothing,
        }
    }

    /// Creates an XML writer with indentation.
    #[inline]
    pub fn with_indent(writer: W, indent: IndentConfig) -> Self {
        Self {
            indent: Some(indent),
            ..Self::new(writer)
        }
    }

    /// Returns the inner writer.
    #[inline]
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Returns the current nesting depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.element_stack.len()
    }

    /// Writes the XML declaration.
    pub fn write_declaration(&mut self, version: &str, encoding: Option<&str>) -> io::Result<()> {
        write!(self.writer, "<?xml version=\"{}\"", version)?;
        if let Some(enc) = encoding {
            write!(self.writer, " encoding=\"{}\"", enc)?;
        }
        self.writer.write_all(b"?>")?;
        self.last = Last::Declaration;
        Ok(())
    }

    /// Starts an element.
    pub fn start_element(&mut self, name: &str) -> io::Result<()> {
        self.close_tag_if_open()?;
        if self.last != Last::Nothing {
            self.write_indent(self.depth())?;
        }
        write!(self.writer, "<{}", name)?;
        self.element_stack.push(name.to_string());
        self.in_tag = true;
        self.last = Last::StartTag;
        Ok(())
    }

    /// Writes an attribute for the current element.
    pub fn write_attribute(&mut self, name: &str, value: &str) -> io::Result<()> {
        if !self.in_tag {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot write attribute outside of element tag",
            ));
        }
        write!(self.writer, " {}=\"{}\"", name, escape_attr(value))
    }

    /// Writes text content; an empty string still closes the start tag.
    pub fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.close_tag_if_open()?;
        self.writer.write_all(escape_text(text).as_bytes())?;
        self.last = Last::Text;
        Ok(())
    }

    /// Ends the current element.
    pub fn end_element(&mut self) -> io::Result<()> {
        let name = self.element_stack.pop().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no element to close")
        })?;

        if self.in_tag {
            self.writer.write_all(b"/>")?;
            self.in_tag = false;
        } else {
            if self.last == Last::EndTag {
                self.write_indent(self.depth())?;
            }
            write!(self.writer, "</{}>", name)?;
        }
        self.last = Last::EndTag;
        Ok(())
    }

    /// Writes `element` and its whole subtree.
    pub fn write_element(&mut self, element: &Element) -> io::Result<()> {
        self.start_element(element.name())?;
        for (name, value) in element.attributes() {
            self.write_attribute(name, value)?;
        }
        if let Some(text) = element.text() {
            if !element.has_children() {
                self.write_text(text)?;
            }
        }
        for child in element.children() {
            self.write_element(child)?;
        }
        self.end_element()
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn close_tag_if_open(&mut self) -> io::Result<()> {
        if self.in_tag {
            self.writer.write_all(b">")?;
            self.in_tag = false;
        }
        Ok(())
    }

    fn write_indent(&mut self, level: usize) -> io::Result<()> {
        if let Some(ref indent) = self.indent {
            if indent.newlines {
                self.writer.write_all(b"\n")?;
            }
            for _ in 0..level {
                self.writer.write_all(indent.indent_str.as_bytes())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::NIL_ATTRIBUTE;

    fn write_to_string<F>(indent: Option<IndentConfig>, f: F) -> String
    where
        F: FnOnce(&mut XmlWriter<Vec<u8>>) -> io::Result<()>,
    {
        let mut writer = match indent {
            Some(indent) => XmlWriter::with_indent(Vec::new(), indent),
            None => XmlWriter::new(Vec::new()),
        };
        f(&mut writer).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    fn sample() -> Element {
        let mut root = Element::new("root");
        root.add_value_child("a", 1, &[], None);
        let inner = root.add_child(Element::new("inner"));
        inner.add_value_child("b", "x < y", &[], None);
        root.add_optional_value_child("c", None::<i64>, &[], None);
        root
    }

    #[test]
    fn test_empty_element() {
        let result = write_to_string(None, |w| {
            w.start_element("root")?;
            w.end_element()
        });
        assert_eq!(result, "<root/>");
    }

    #[test]
    fn test_empty_text_keeps_both_tags() {
        let result = write_to_string(None, |w| {
            w.start_element("root")?;
            w.write_text("")?;
            w.end_element()
        });
        assert_eq!(result, "<root></root>");
    }

    #[test]
    fn test_escaped_attribute() {
        let result = write_to_string(None, |w| {
            w.start_element("root")?;
            w.write_attribute("attr", "value with \"quotes\"")?;
            w.end_element()
        });
        assert_eq!(result, r#"<root attr="value with &quot;quotes&quot;"/>"#);
    }

    #[test]
    fn test_attribute_outside_tag_fails() {
        let mut writer = XmlWriter::new(Vec::new());
        assert!(writer.write_attribute("a", "b").is_err());
        assert!(writer.end_element().is_err());
    }

    #[test]
    fn test_compact_tree() {
        let result = write_to_string(None, |w| w.write_element(&sample()));
        assert_eq!(
            result,
            r#"<root><a>1</a><inner><b>x &lt; y</b></inner><c isNil="1"></c></root>"#
        );
    }

    #[test]
    fn test_pretty_tree() {
        let indent = IndentConfig {
            indent_str: "  ".to_string(),
            newlines: true,
        };
        let result = write_to_string(Some(indent), |w| {
            w.write_declaration("1.0", Some("UTF-8"))?;
            w.write_element(&sample())
        });
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                        <root>\n  <a>1</a>\n  <inner>\n    <b>x &lt; y</b>\n  </inner>\n  \
                        <c isNil=\"1\"></c>\n</root>";
        assert_eq!(result, expected);
    }

    #[test]
    fn test_depth() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.start_element("a").unwrap();
        writer.start_element("b").unwrap();
        assert_eq!(writer.depth(), 2);
        writer.end_element().unwrap();
        writer.end_element().unwrap();
        assert_eq!(writer.depth(), 0);
    }

    #[test]
    fn test_nil_attribute_written() {
        let e = Element::with_text("v", "").with_attribute(NIL_ATTRIBUTE, "1");
        let result = write_to_string(None, |w| w.write_element(&e));
        assert_eq!(result, r#"<v isNil="1"></v>"#);
    }
}
