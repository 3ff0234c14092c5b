//! Error types for XML marshalling.

use std::fmt::{self, Display};
use std::io;

/// Result type alias for xml_marshal operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for encoding values to XML and decoding them back.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    position: Option<Position>,
    /// Element names from the innermost element outwards.
    path: Vec<String>,
}

/// Position information for parse errors.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset from start.
    pub offset: usize,
}

/// The kind of error that occurred.
#[derive(Debug)]
pub enum ErrorKind {
    /// Reading or writing a file failed.
    Io(io::Error),
    /// The looked-up element does not exist (the "not found" sentinel was read).
    NotAvailable,
    /// The element exists but carries no text payload.
    MissingValue,
    /// The element text does not parse as the requested scalar kind.
    TypeMismatch {
        /// The scalar kind that was requested.
        expected: &'static str,
        /// The text that was found.
        found: String,
    },
    /// The `isNil` marker is missing or holds something other than `0`/`1`.
    MalformedOptional(Option<String>),
    /// A map key cannot be used as an element name.
    KeyTypeNotSupported(String),
    /// A string is not a valid XML element name.
    InvalidName(String),
    /// The value has no element encoding.
    NotSavable(String),
    /// A record field has no matching child element.
    MissingField(String),
    /// A fixed-size container found fewer items than it needs.
    MissingChildren {
        /// Number of items required.
        expected: usize,
        /// Number of items found.
        found: usize,
    },
    /// The decoded value does not fit the declared type of the target.
    FieldAssignmentFailed(String),
    /// Input is not UTF-8 or declares an unsupported encoding.
    Encoding(String),
    /// The input is not well-formed XML.
    Parse(String),
    /// Custom error message.
    Custom(String),
}

impl Error {
    /// Creates a new error with the given kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            position: None,
            path: Vec::new(),
        }
    }

    /// Creates a new error with position information.
    #[inline]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Records that the error surfaced while processing the element `name`.
    ///
    /// Called while unwinding, so names are pushed innermost first.
    #[inline]
    pub fn in_element<S: Into<String>>(mut self, name: S) -> Self {
        self.path.push(name.into());
        self
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the position where a parse error occurred.
    #[inline]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Returns the slash-separated element path, outermost first.
    pub fn path(&self) -> Option<String> {
        if self.path.is_empty() {
            return None;
        }
        let mut segments: Vec<&str> = self.path.iter().map(String::as_str).collect();
        segments.reverse();
        Some(segments.join("/"))
    }

    /// Creates a "not available" error.
    #[inline]
    pub fn not_available() -> Self {
        Self::new(ErrorKind::NotAvailable)
    }

    /// Creates a missing value error.
    #[inline]
    pub fn missing_value() -> Self {
        Self::new(ErrorKind::MissingValue)
    }

    /// Creates a type mismatch error.
    #[inline]
    pub fn type_mismatch<S: Into<String>>(expected: &'static str, found: S) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected,
            found: found.into(),
        })
    }

    /// Creates a malformed optional error.
    #[inline]
    pub fn malformed_optional(found: Option<&str>) -> Self {
        Self::new(ErrorKind::MalformedOptional(found.map(str::to_string)))
    }

    /// Creates an unsupported key type error.
    #[inline]
    pub fn key_type_not_supported<S: Into<String>>(kind: S) -> Self {
        Self::new(ErrorKind::KeyTypeNotSupported(kind.into()))
    }

    /// Creates an invalid name error.
    #[inline]
    pub fn invalid_name<S: Into<String>>(name: S) -> Self {
        Self::new(ErrorKind::InvalidName(name.into()))
    }

    /// Creates a "not savable" error.
    #[inline]
    pub fn not_savable<S: Into<String>>(what: S) -> Self {
        Self::new(ErrorKind::NotSavable(what.into()))
    }

    /// Creates a missing field error.
    #[inline]
    pub fn missing_field<S: Into<String>>(field: S) -> Self {
        Self::new(ErrorKind::MissingField(field.into()))
    }

    /// Creates a missing children error.
    #[inline]
    pub fn missing_children(expected: usize, found: usize) -> Self {
        Self::new(ErrorKind::MissingChildren { expected, found })
    }

    /// Creates a field assignment error.
    #[inline]
    pub fn field_assignment<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::FieldAssignmentFailed(msg.into()))
    }

    /// Creates an encoding error.
    #[inline]
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::Encoding(msg.into()))
    }

    /// Creates a parse error.
    #[inline]
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::Parse(msg.into()))
    }

    /// Creates an unexpected EOF parse error.
    #[inline]
    pub fn unexpected_eof() -> Self {
        Self::parse("unexpected end of input")
    }

    /// Creates an unclosed tag parse error.
    #[inline]
    pub fn unclosed_tag<S: Display>(tag: S) -> Self {
        Self::parse(format!("unclosed tag: <{}>", tag))
    }

    /// Creates a mismatched tag parse error.
    #[inline]
    pub fn mismatched_tag<S: Display>(expected: S, found: S) -> Self {
        Self::parse(format!(
            "mismatched closing tag: expected </{}>, found </{}>",
            expected, found
        ))
    }

    /// Creates an invalid escape parse error.
    #[inline]
    pub fn invalid_escape<S: Display>(seq: S) -> Self {
        Self::parse(format!("invalid escape sequence: {}", seq))
    }

    /// Creates a custom error.
    #[inline]
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::Custom(msg.into()))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Io(e) => write!(f, "I/O error: {}", e),
            ErrorKind::NotAvailable => write!(f, "element not available"),
            ErrorKind::MissingValue => write!(f, "element has no value"),
            ErrorKind::TypeMismatch { expected, found } => {
                write!(f, "expected {}, found '{}'", expected, found)
            }
            ErrorKind::MalformedOptional(Some(found)) => {
                write!(f, "invalid isNil marker: '{}'", found)
            }
            ErrorKind::MalformedOptional(None) => write!(f, "missing isNil marker"),
            ErrorKind::KeyTypeNotSupported(kind) => {
                write!(f, "map key type not supported: {}", kind)
            }
            ErrorKind::InvalidName(name) => write!(f, "invalid XML name: '{}'", name),
            ErrorKind::NotSavable(what) => write!(f, "cannot encode {} as XML", what),
            ErrorKind::MissingField(field) => write!(f, "missing field `{}`", field),
            ErrorKind::MissingChildren { expected, found } => {
                write!(f, "expected {} child elements, found {}", expected, found)
            }
            ErrorKind::FieldAssignmentFailed(msg) => write!(f, "cannot assign value: {}", msg),
            ErrorKind::Encoding(msg) => write!(f, "encoding error: {}", msg),
            ErrorKind::Parse(msg) => write!(f, "parse error: {}", msg),
            ErrorKind::Custom(msg) => write!(f, "{}", msg),
        }?;

        if let Some(path) = self.path() {
            write!(f, " in <{}>", path)?;
        }

        if let Some(pos) = self.position {
            write!(f, " at line {}, column {} (offset {})", pos.line, pos.column, pos.offset)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::new(ErrorKind::Io(e))
    }
}

impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Self::custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Self::custom(msg.to_string())
    }

    fn invalid_type(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Self::field_assignment(format!("invalid type: {}, expected {}", unexp, exp))
    }

    fn invalid_value(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Self::field_assignment(format!("invalid value: {}, expected {}", unexp, exp))
    }

    fn invalid_length(len: usize, exp: &dyn serde::de::Expected) -> Self {
        Self::custom(format!("invalid length {}, expected {}", len, exp))
            .into_missing_children(len, exp)
    }

    fn missing_field(field: &'static str) -> Self {
        Self::missing_field(field)
    }
}

impl Error {
    /// Rewrites a serde length error into `MissingChildren` when the expected
    /// count is spelled as a plain number ("a tuple of size 3").
    fn into_missing_children(self, found: usize, exp: &dyn serde::de::Expected) -> Self {
        let expected = exp
            .to_string()
            .split_whitespace()
            .find_map(|word| word.parse::<usize>().ok());
        match expected {
            Some(expected) => Self::missing_children(expected, found),
            None => self,
        }
    }
}
