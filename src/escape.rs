//! XML escape and unescape utilities.
//!
//! Text content and attribute values are escaped differently: attribute
//! values also protect quotes and whitespace control characters, which an
//! XML parser would otherwise normalize away.

use memchr::{memchr2, memchr3};
use std::borrow::Cow;

/// Escapes the characters that may not appear literally in text content.
#[inline]
pub fn escape_text(s: &str) -> Cow<'_, str> {
    if memchr3(b'<', b'>', b'&', s.as_bytes()).is_none() {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + s.len() / 8);
    escape_to(s, &mut result, false);
    Cow::Owned(result)
}

/// Escapes an attribute value for use inside double quotes.
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let needs_escape = memchr3(b'<', b'>', b'&', bytes).is_some()
        || memchr2(b'"', b'\'', bytes).is_some()
        || memchr3(b'\n', b'\r', b'\t', bytes).is_some();
    if !needs_escape {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + s.len() / 4);
    escape_to(s, &mut result, true);
    Cow::Owned(result)
}

/// Escapes `s` and appends the result to `out`.
pub fn escape_to(s: &str, out: &mut String, attribute: bool) {
    let mut start = 0;

    for (i, byte) in s.bytes().enumerate() {
        let escaped = match byte {
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'&' => "&amp;",
            b'"' if attribute => "&quot;",
            b'\'' if attribute => "&apos;",
            b'\n' if attribute => "&#10;",
            b'\r' if attribute => "&#13;",
            b'\t' if attribute => "&#9;",
            _ => continue,
        };

        // Only ASCII bytes are replaced, so `i` is always a char boundary.
        out.push_str(&s[start..i]);
        out.push_str(escaped);
        start = i + 1;
    }

    out.push_str(&s[start..]);
}

/// Unescapes XML entities in a string.
///
/// Returns a `Cow<str>` to avoid allocation when no unescaping is needed.
#[inline]
pub fn unescape(s: &str) -> Result<Cow<'_, str>, UnescapeError> {
    if !s.contains('&') {
        return Ok(Cow::Borrowed(s));
    }

    let mut result = String::with_capacity(s.len());
    unescape_to(s, &mut result)?;
    Ok(Cow::Owned(result))
}

/// Error type for unescape operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnescapeError {
    /// The invalid entity that caused the error.
    pub entity: String,
    /// Position in the input where the error occurred.
    pub position: usize,
}

impl std::fmt::Display for UnescapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid XML entity '{}' at position {}", self.entity, self.position)
    }
}

impl std::error::Error for UnescapeError {}

/// Unescapes XML entities and appends to the given string.
pub fn unescape_to(s: &str, out: &mut String) -> Result<(), UnescapeError> {
    let mut rest = s;
    let mut consumed = 0;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let len = match after.find(';') {
            Some(len) if len > 0 => len,
            _ => {
                return Err(UnescapeError {
                    entity: String::from("&"),
                    position: consumed + amp,
                })
            }
        };

        let entity = &after[..len];
        match decode_entity(entity).or_else(|| decode_numeric_entity(entity)) {
            Some(c) => out.push(c),
            None => {
                return Err(UnescapeError {
                    entity: format!("&{};", entity),
                    position: consumed + amp,
                })
            }
        }

        let advance = amp + 1 + len + 1;
        consumed += advance;
        rest = &rest[advance..];
    }

    out.push_str(rest);
    Ok(())
}

/// Decodes a named XML entity.
#[inline]
fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// Decodes a numeric character reference (&#NNN; or &#xHHH;).
#[inline]
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_no_special_chars() {
        let s = "Hello, World!";
        assert!(matches!(escape_text(s), Cow::Borrowed(_)));
        assert!(matches!(escape_attr(s), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_text_keeps_quotes() {
        assert_eq!(
            escape_text("<a href=\"x\">it's & more</a>"),
            "&lt;a href=\"x\"&gt;it's &amp; more&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_attr_quotes_and_whitespace() {
        assert_eq!(escape_attr("say \"hi\"\n"), "say &quot;hi&quot;&#10;");
        assert_eq!(escape_attr("a'b\tc"), "a&apos;b&#9;c");
    }

    #[test]
    fn test_escape_multibyte() {
        assert_eq!(escape_text("größe < 5 €"), "größe &lt; 5 €");
    }

    #[test]
    fn test_unescape_no_entities() {
        let unescaped = unescape("Hello, World!").unwrap();
        assert!(matches!(unescaped, Cow::Borrowed(_)));
    }

    #[test]
    fn test_unescape_named() {
        assert_eq!(
            unescape("&lt;div class=&quot;foo&quot;&gt;Hello &amp; goodbye&apos;s").unwrap(),
            "<div class=\"foo\">Hello & goodbye's"
        );
    }

    #[test]
    fn test_unescape_numeric() {
        assert_eq!(unescape("&#65;&#x61;").unwrap(), "Aa");
        assert_eq!(unescape("&#8364;").unwrap(), "€");
        assert_eq!(unescape("line&#10;break").unwrap(), "line\nbreak");
    }

    #[test]
    fn test_unescape_invalid_entity() {
        let err = unescape("ok &invalid;").unwrap_err();
        assert_eq!(err.entity, "&invalid;");
        assert_eq!(err.position, 3);
    }

    #[test]
    fn test_unescape_unterminated_entity() {
        assert!(unescape("&lt").is_err());
    }

    #[test]
    fn test_roundtrip_attr() {
        let original = "tab\there \"quoted\" & <tagged>\r\n";
        let escaped = escape_attr(original);
        assert_eq!(unescape(&escaped).unwrap(), original);
    }
}
