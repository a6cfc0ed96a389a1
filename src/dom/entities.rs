//! Entity decoding and escaping
//!
//! Decodes the five predefined XML entities and numeric character references.
//! Returns borrowed data when no entities are present (zero-copy fast path).

use memchr::memchr;
use std::borrow::Cow;

/// Decode entities in character data or an attribute value
///
/// Fails on invalid UTF-8, undefined entities and references to characters
/// outside the XML 1.0 Char production.
pub fn decode_text(input: &[u8]) -> Result<Cow<'_, str>, &'static str> {
    let text = std::str::from_utf8(input).map_err(|_| "invalid UTF-8 in character data")?;

    // Fast path: no entities
    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(text));
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        result.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = memchr(b';', after.as_bytes()).ok_or("unterminated entity reference")?;
        result.push(decode_entity(&after[..semi])?);
        rest = &after[semi + 1..];
    }
    result.push_str(rest);
    Ok(Cow::Owned(result))
}

/// Decode a single entity body (without & and ;)
fn decode_entity(entity: &str) -> Result<char, &'static str> {
    match entity {
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "amp" => Ok('&'),
        "quot" => Ok('"'),
        "apos" => Ok('\''),
        _ => match entity.strip_prefix('#') {
            Some(numeric) => decode_numeric_entity(numeric),
            None => Err("undefined entity"),
        },
    }
}

fn decode_numeric_entity(entity: &str) -> Result<char, &'static str> {
    let codepoint = match entity.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => entity.parse::<u32>(),
    }
    .map_err(|_| "malformed character reference")?;

    if !is_valid_xml_char(codepoint) {
        return Err("character reference to an invalid XML character");
    }
    char::from_u32(codepoint).ok_or("character reference to an invalid XML character")
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Escape character data for output
pub fn escape_text(input: &str) -> Cow<'_, str> {
    escape(input, false)
}

/// Escape an attribute value for output inside double quotes
pub fn escape_attribute(input: &str) -> Cow<'_, str> {
    escape(input, true)
}

fn escape(input: &str, attribute: bool) -> Cow<'_, str> {
    let needs_escape = |b: u8| match b {
        b'<' | b'>' | b'&' | b'\r' => true,
        b'"' | b'\n' | b'\t' => attribute,
        _ => false,
    };
    if !input.bytes().any(needs_escape) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' if attribute => result.push_str("&quot;"),
            '\n' if attribute => result.push_str("&#10;"),
            '\t' if attribute => result.push_str("&#9;"),
            '\r' => result.push_str("&#13;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text(b"Hello, World!").unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode_text(b"&lt;hello&gt; &amp; &quot;world&quot;").unwrap();
        assert_eq!(result, "<hello> & \"world\"");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_text(b"&#65;&#x42;&#X43;").unwrap(), "ABC");
        assert_eq!(decode_text(b"&#x1F600;").unwrap(), "😀");
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        assert!(decode_text(b"&unknown;").is_err());
        assert!(decode_text(b"a & b").is_err());
        assert!(decode_text(b"&#0;").is_err());
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("<a> & \"b\""), "&lt;a&gt; &amp; \"b\"");
        assert!(matches!(escape_text("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute("say \"hi\"\n"), "say &quot;hi&quot;&#10;");
    }
}
