//! Input Encoding Detection
//!
//! The parser works on UTF-8. Other encodings are recognized from a byte
//! order mark, the UTF-16 `<` pattern, or the `encoding` pseudo-attribute of
//! the XML declaration, and transcoded before parsing.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use memchr::memmem;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encoding of raw document bytes
pub fn detect(input: &[u8]) -> Result<&'static Encoding, String> {
    if let Some((encoding, _)) = Encoding::for_bom(input) {
        return Ok(encoding);
    }
    match input {
        [0x00, b'<', ..] => return Ok(UTF_16BE),
        [b'<', 0x00, ..] => return Ok(UTF_16LE),
        _ => {}
    }
    let Some(label) = declared_encoding(input) else {
        return Ok(UTF_8);
    };
    match Encoding::for_label(label) {
        // A declaration readable as ASCII cannot be UTF-16
        Some(encoding) if encoding == UTF_16LE || encoding == UTF_16BE => Ok(UTF_8),
        Some(encoding) => Ok(encoding),
        None => Err(format!("unsupported encoding {:?}", String::from_utf8_lossy(label))),
    }
}

/// UTF-8 bytes of `input` without a byte order mark
pub fn to_utf8(input: &[u8]) -> Result<Cow<'_, [u8]>, String> {
    let encoding = detect(input)?;
    if encoding == UTF_8 {
        return Ok(Cow::Borrowed(input.strip_prefix(UTF8_BOM).unwrap_or(input)));
    }
    let (text, _, had_errors) = encoding.decode(input);
    if had_errors {
        return Err(format!("invalid {} input", encoding.name()));
    }
    Ok(Cow::Owned(text.into_owned().into_bytes()))
}

/// Value of `encoding="..."` in a leading XML declaration
fn declared_encoding(input: &[u8]) -> Option<&[u8]> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    if !input.starts_with(b"<?xml") {
        return None;
    }
    let end = memmem::find(input, b"?>")?;
    let decl = &input[..end];
    let at = memmem::find(decl, b"encoding")?;
    let rest = decl[at + b"encoding".len()..].trim_ascii_start();
    let rest = rest.strip_prefix(b"=")?.trim_ascii_start();
    let (&quote, value) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let close = value.iter().position(|&b| b == quote)?;
    Some(&value[..close])
}
