//! Low-level XML reader/tokenizer.
//!
//! Produces a flat stream of events that [`Document`](crate::Document)
//! folds into an element tree. Text inside elements is reported verbatim,
//! whitespace included, so leaf values survive a round trip. Comments,
//! processing instructions and DOCTYPE declarations are consumed and never
//! reported.

use crate::error::{Error, Position, Result};
use crate::escape::unescape;
use memchr::{memchr, memchr2, memmem};
use std::borrow::Cow;

static IS_WHITESPACE: [bool; 256] = {
    let mut lut = [false; 256];
    lut[b' ' as usize] = true;
    lut[b'\t' as usize] = true;
    lut[b'\n' as usize] = true;
    lut[b'\r' as usize] = true;
    lut
};

static IS_NAME_START: [bool; 256] = {
    let mut lut = [false; 256];
    let mut i = b'A';
    while i <= b'Z' {
        lut[i as usize] = true;
        lut[(i + 32) as usize] = true;
        i += 1;
    }
    lut[b'_' as usize] = true;
    lut[b':' as usize] = true;
    // Bytes of multi-byte UTF-8 sequences.
    let mut i: usize = 0x80;
    while i < 256 {
        lut[i] = true;
        i += 1;
    }
    lut
};

static IS_NAME_CHAR: [bool; 256] = {
    let mut lut = IS_NAME_START;
    let mut i = b'0';
    while i <= b'9' {
        lut[i as usize] = true;
        i += 1;
    }
    lut[b'-' as usize] = true;
    lut[b'.' as usize] = true;
    lut
};

/// Returns whether `name` is a well-formed XML element or attribute name.
pub fn is_valid_name(name: &str) -> bool {
    match name.as_bytes().split_first() {
        Some((first, rest)) => {
            IS_NAME_START[*first as usize] && rest.iter().all(|&b| IS_NAME_CHAR[b as usize])
        }
        None => false,
    }
}

/// An XML event produced by the reader.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlEvent<'a> {
    /// XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`
    Declaration {
        /// XML version.
        version: Cow<'a, str>,
        /// Declared character encoding.
        encoding: Option<Cow<'a, str>>,
    },
    /// Start of an element: `<name attr="value">`
    StartElement {
        /// Element name.
        name: &'a str,
        /// Element attributes in document order.
        attributes: Vec<Attribute<'a>>,
    },
    /// End of an element: `</name>`
    EndElement {
        /// Element name.
        name: &'a str,
    },
    /// Self-closing element: `<name attr="value"/>`
    EmptyElement {
        /// Element name.
        name: &'a str,
        /// Element attributes in document order.
        attributes: Vec<Attribute<'a>>,
    },
    /// Character data between tags, entities already resolved.
    Text(Cow<'a, str>),
    /// CDATA section contents.
    CData(&'a str),
    /// End of input.
    Eof,
}

/// An XML attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute<'a> {
    /// The attribute name.
    pub name: &'a str,
    /// The attribute value, entities already resolved.
    pub value: Cow<'a, str>,
}

/// A zero-copy XML tokenizer over a UTF-8 buffer.
pub struct XmlReader<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    /// Open element names, used to validate closing tags.
    element_stack: Vec<&'a str>,
}

impl<'a> XmlReader<'a> {
    /// Creates a new XML reader from a string.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &'a str) -> Self {
        Self {
            input: s.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            element_stack: Vec::with_capacity(8),
        }
    }

    /// Returns the current position in the input.
    #[inline]
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.col,
            offset: self.pos,
        }
    }

    /// Returns the number of currently open elements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.element_stack.len()
    }

    /// Reads the next XML event.
    pub fn next_event(&mut self) -> Result<XmlEvent<'a>> {
        loop {
            if self.element_stack.is_empty() {
                self.skip_whitespace();
            }

            if self.pos >= self.input.len() {
                if let Some(tag) = self.element_stack.pop() {
                    return Err(Error::unclosed_tag(tag).with_position(self.position()));
                }
                return Ok(XmlEvent::Eof);
            }

            if self.input[self.pos] != b'<' {
                return self.read_text();
            }

            match self.input.get(self.pos + 1) {
                Some(b'/') => return self.read_end_element(),
                Some(b'?') => {
                    if let Some(decl) = self.read_processing_instruction()? {
                        return Ok(decl);
                    }
                }
                Some(b'!') => {
                    if let Some(cdata) = self.read_markup_declaration()? {
                        return Ok(cdata);
                    }
                }
                Some(_) => return self.read_start_element(),
                None => return Err(Error::unexpected_eof().with_position(self.position())),
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&b) = self.input.get(self.pos) {
            if !IS_WHITESPACE[b as usize] {
                break;
            }
            self.advance(1);
        }
    }

    /// Moves forward `n` bytes, keeping line and column up to date.
    #[inline]
    fn advance(&mut self, n: usize) {
        let end = (self.pos + n).min(self.input.len());
        for &b in &self.input[self.pos..end] {
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.pos = end;
    }

    fn str_between(&self, start: usize, end: usize) -> Result<&'a str> {
        std::str::from_utf8(&self.input[start..end])
            .map_err(|_| Error::encoding("invalid UTF-8").with_position(self.position()))
    }

    /// Finds `needle` at or after the current position and returns its offset.
    fn find(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.input[self.pos..], needle).map(|offset| self.pos + offset)
    }

    fn read_text(&mut self) -> Result<XmlEvent<'a>> {
        let position = self.position();
        let start = self.pos;
        let end = memchr(b'<', &self.input[start..])
            .map(|offset| start + offset)
            .unwrap_or(self.input.len());
        let text = self.str_between(start, end)?;
        self.advance(end - start);

        unescape(text)
            .map(XmlEvent::Text)
            .map_err(|e| Error::invalid_escape(e.entity).with_position(position))
    }

    fn read_start_element(&mut self) -> Result<XmlEvent<'a>> {
        self.advance(1);
        let name = self.read_name()?;
        let attributes = self.read_attributes()?;

        match self.input.get(self.pos) {
            Some(b'/') => {
                self.advance(1);
                self.expect_byte(b'>')?;
                Ok(XmlEvent::EmptyElement { name, attributes })
            }
            Some(b'>') => {
                self.advance(1);
                self.element_stack.push(name);
                Ok(XmlEvent::StartElement { name, attributes })
            }
            Some(_) => Err(Error::parse("expected '>' or '/>'").with_position(self.position())),
            None => Err(Error::unexpected_eof().with_position(self.position())),
        }
    }

    fn read_end_element(&mut self) -> Result<XmlEvent<'a>> {
        self.advance(2);
        let name = self.read_name()?;
        self.skip_whitespace();
        self.expect_byte(b'>')?;

        match self.element_stack.pop() {
            Some(expected) if expected == name => Ok(XmlEvent::EndElement { name }),
            Some(expected) => {
                Err(Error::mismatched_tag(expected, name).with_position(self.position()))
            }
            None => Err(Error::parse(format!("unexpected closing tag: {}", name))
                .with_position(self.position())),
        }
    }

    /// Reads `<?...?>`; only the XML declaration produces an event.
    fn read_processing_instruction(&mut self) -> Result<Option<XmlEvent<'a>>> {
        self.advance(2);
        let target = self.read_name()?;

        if target.eq_ignore_ascii_case("xml") {
            let attributes = self.read_attributes()?;
            self.expect_byte(b'?')?;
            self.expect_byte(b'>')?;

            let mut version = Cow::Borrowed("1.0");
            let mut encoding = None;
            for attr in attributes {
                match attr.name {
                    "version" => version = attr.value,
                    "encoding" => encoding = Some(attr.value),
                    _ => {}
                }
            }
            return Ok(Some(XmlEvent::Declaration { version, encoding }));
        }

        match self.find(b"?>") {
            Some(end) => {
                self.advance(end + 2 - self.pos);
                Ok(None)
            }
            None => Err(Error::parse("unterminated processing instruction")
                .with_position(self.position())),
        }
    }

    /// Reads `<!...>`: comments and DOCTYPE are skipped, CDATA is returned.
    fn read_markup_declaration(&mut self) -> Result<Option<XmlEvent<'a>>> {
        let rest = &self.input[self.pos..];

        if rest.starts_with(b"<!--") {
            self.advance(4);
            return match self.find(b"-->") {
                Some(end) => {
                    self.advance(end + 3 - self.pos);
                    Ok(None)
                }
                None => Err(Error::parse("unterminated comment").with_position(self.position())),
            };
        }

        if rest.starts_with(b"<![CDATA[") {
            self.advance(9);
            let start = self.pos;
            return match self.find(b"]]>") {
                Some(end) => {
                    let data = self.str_between(start, end)?;
                    self.advance(end + 3 - self.pos);
                    Ok(Some(XmlEvent::CData(data)))
                }
                None => {
                    Err(Error::parse("unterminated CDATA section").with_position(self.position()))
                }
            };
        }

        if rest.starts_with(b"<!DOCTYPE") {
            self.skip_doctype()?;
            return Ok(None);
        }

        Err(Error::parse("unknown construct after '<!'").with_position(self.position()))
    }

    /// Skips a DOCTYPE declaration, including an internal subset.
    fn skip_doctype(&mut self) -> Result<()> {
        let mut depth = 0usize;
        while let Some(offset) = memchr2(b'<', b'>', &self.input[self.pos..]) {
            let at = self.pos + offset;
            let byte = self.input[at];
            self.advance(offset + 1);
            match byte {
                b'<' => depth += 1,
                _ => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
            }
        }
        Err(Error::parse("unterminated DOCTYPE").with_position(self.position()))
    }

    fn read_name(&mut self) -> Result<&'a str> {
        let start = self.pos;
        match self.input.get(self.pos) {
            Some(&first) if IS_NAME_START[first as usize] => {}
            Some(&first) => {
                return Err(Error::parse(format!(
                    "invalid name start character: {:?}",
                    first as char
                ))
                .with_position(self.position()))
            }
            None => return Err(Error::unexpected_eof().with_position(self.position())),
        }

        let len = self.input[start..]
            .iter()
            .position(|&b| !IS_NAME_CHAR[b as usize])
            .unwrap_or(self.input.len() - start);
        self.advance(len);
        self.str_between(start, start + len)
    }

    fn read_attributes(&mut self) -> Result<Vec<Attribute<'a>>> {
        let mut attributes = Vec::new();

        loop {
            self.skip_whitespace();
            match self.input.get(self.pos) {
                None | Some(b'>') | Some(b'/') | Some(b'?') => return Ok(attributes),
                Some(_) => {}
            }

            let name = self.read_name()?;
            if attributes.iter().any(|a: &Attribute<'a>| a.name == name) {
                return Err(Error::parse(format!("duplicate attribute: {}", name))
                    .with_position(self.position()));
            }
            self.skip_whitespace();
            self.expect_byte(b'=')?;
            self.skip_whitespace();
            let value = self.read_attribute_value()?;
            attributes.push(Attribute { name, value });
        }
    }

    fn read_attribute_value(&mut self) -> Result<Cow<'a, str>> {
        let quote = match self.input.get(self.pos) {
            Some(&q) if q == b'"' || q == b'\'' => q,
            Some(_) => return Err(Error::parse("expected quote").with_position(self.position())),
            None => return Err(Error::unexpected_eof().with_position(self.position())),
        };
        self.advance(1);

        let start = self.pos;
        let end = match memchr(quote, &self.input[start..]) {
            Some(offset) => start + offset,
            None => {
                return Err(
                    Error::parse("unterminated attribute value").with_position(self.position())
                )
            }
        };
        let raw = self.str_between(start, end)?;
        let position = self.position();
        self.advance(end + 1 - start);

        unescape(raw).map_err(|e| Error::invalid_escape(e.entity).with_position(position))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        match self.input.get(self.pos) {
            Some(&b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(&b) => Err(Error::parse(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            ))
            .with_position(self.position())),
            None => Err(Error::unexpected_eof().with_position(self.position())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(xml: &str) -> Vec<XmlEvent<'_>> {
        let mut reader = XmlReader::from_str(xml);
        let mut out = Vec::new();
        loop {
            match reader.next_event().unwrap() {
                XmlEvent::Eof => return out,
                event => out.push(event),
            }
        }
    }

    #[test]
    fn test_simple_element() {
        let mut reader = XmlReader::from_str("<root></root>");

        match reader.next_event().unwrap() {
            XmlEvent::StartElement { name, attributes } => {
                assert_eq!(name, "root");
                assert!(attributes.is_empty());
            }
            _ => panic!("expected StartElement"),
        }
        assert_eq!(reader.next_event().unwrap(), XmlEvent::EndElement { name: "root" });
        assert_eq!(reader.next_event().unwrap(), XmlEvent::Eof);
    }

    #[test]
    fn test_empty_element_with_attributes() {
        match &events(r#"<optA isNil="1" note='x &amp; y'/>"#)[0] {
            XmlEvent::EmptyElement { name, attributes } => {
                assert_eq!(*name, "optA");
                assert_eq!(attributes[0].name, "isNil");
                assert_eq!(attributes[0].value, "1");
                assert_eq!(attributes[1].value, "x & y");
            }
            other => panic!("expected EmptyElement, got {:?}", other),
        }
    }

    #[test]
    fn test_text_is_verbatim_inside_elements() {
        let evs = events("<a>  padded text </a>");
        assert_eq!(evs[1], XmlEvent::Text(Cow::Borrowed("  padded text ")));
    }

    #[test]
    fn test_whitespace_between_children_is_reported() {
        let evs = events("<a>\n  <b>1</b>\n</a>");
        assert_eq!(evs.len(), 7);
        assert!(matches!(&evs[1], XmlEvent::Text(t) if t.trim().is_empty()));
    }

    #[test]
    fn test_escaped_text() {
        let evs = events("<root>&lt;Hello&gt;</root>");
        assert_eq!(evs[1], XmlEvent::Text(Cow::Owned("<Hello>".to_string())));
    }

    #[test]
    fn test_declaration() {
        match &events(r#"<?xml version="1.0" encoding="UTF-8"?><root/>"#)[0] {
            XmlEvent::Declaration { version, encoding } => {
                assert_eq!(version, "1.0");
                assert_eq!(encoding.as_deref(), Some("UTF-8"));
            }
            other => panic!("expected Declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_comments_pis_and_doctype_are_skipped() {
        let xml = "<!DOCTYPE root [<!ELEMENT root ANY>]>\n<!-- c --><?style x?><root><!-- inner --></root>";
        let evs = events(xml);
        assert_eq!(evs.len(), 2);
        assert!(matches!(evs[0], XmlEvent::StartElement { name: "root", .. }));
    }

    #[test]
    fn test_cdata() {
        let evs = events("<root><![CDATA[<special>content</special>]]></root>");
        assert_eq!(evs[1], XmlEvent::CData("<special>content</special>"));
    }

    #[test]
    fn test_mismatched_tags() {
        let mut reader = XmlReader::from_str("<root></wrong>");
        reader.next_event().unwrap();
        let err = reader.next_event().unwrap_err();
        assert!(err.to_string().contains("mismatched"));
    }

    #[test]
    fn test_unclosed_tag() {
        let mut reader = XmlReader::from_str("<root>");
        reader.next_event().unwrap();
        assert!(reader.next_event().is_err());
    }

    #[test]
    fn test_duplicate_attribute() {
        let mut reader = XmlReader::from_str(r#"<a x="1" x="2"/>"#);
        assert!(reader.next_event().is_err());
    }

    #[test]
    fn test_position_tracking() {
        let mut reader = XmlReader::from_str("<root>\n  <child/>\n</root>");
        reader.next_event().unwrap();
        reader.next_event().unwrap();
        reader.next_event().unwrap();
        assert_eq!(reader.position().line, 2);
    }

    #[test]
    fn test_depth_tracking() {
        let mut reader = XmlReader::from_str("<a><b><c></c></b></a>");
        assert_eq!(reader.depth(), 0);
        reader.next_event().unwrap();
        reader.next_event().unwrap();
        reader.next_event().unwrap();
        assert_eq!(reader.depth(), 3);
        reader.next_event().unwrap();
        assert_eq!(reader.depth(), 2);
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("arrItem"));
        assert!(is_valid_name("_private.field-2"));
        assert!(is_valid_name("größe"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1abc"));
        assert!(!is_valid_name("has space"));
    }
}
