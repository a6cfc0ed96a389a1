//! XML parser producing an `XmlTree`
//!
//! Single pass over the input. Delimiters are located with memchr/memmem so
//! long runs of character data are skipped without per-byte branching.
//!
//! Checked: a single root element, matched end tags, quoted and unique
//! attributes, known entities, names, no character data outside the root.
//! DOCTYPE declarations are skipped, including an internal subset. Input in
//! another encoding is transcoded to UTF-8 first.

use memchr::{memchr, memmem};

use super::encoding::to_utf8;
use super::entities::decode_text;
use super::node::NodeId;
use super::tree::XmlTree;

/// Parse error with byte position
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at byte {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

/// Parser options
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Keep whitespace-only text nodes between elements
    pub keep_blanks: bool,
}

/// Parse a complete document with default options
pub fn parse(input: &[u8]) -> Result<XmlTree, ParseError> {
    parse_with_options(input, ParseOptions::default())
}

/// Parse a complete document
pub fn parse_with_options(input: &[u8], options: ParseOptions) -> Result<XmlTree, ParseError> {
    let input = to_utf8(input).map_err(|message| ParseError { message, position: 0 })?;
    Parser {
        input: &input,
        pos: 0,
        tree: XmlTree::new(),
        stack: vec![XmlTree::DOCUMENT],
        options,
        seen_root: false,
    }
    .run()
}

/// Check an XML Name (prefixed names included)
pub fn is_valid_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if is_name_start(first) => bytes.all(is_name_char),
        _ => false,
    }
}

#[inline]
fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':' || b >= 0x80
}

#[inline]
fn is_name_char(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    tree: XmlTree,
    /// Open elements, document node at the bottom
    stack: Vec<NodeId>,
    options: ParseOptions,
    seen_root: bool,
}

impl<'a> Parser<'a> {
    fn run(mut self) -> Result<XmlTree, ParseError> {
        while self.pos < self.input.len() {
            match memchr(b'<', &self.input[self.pos..]) {
                Some(0) => self.markup()?,
                Some(offset) => {
                    let end = self.pos + offset;
                    self.text(end)?;
                }
                None => self.text(self.input.len())?,
            }
        }

        if self.stack.len() > 1 {
            let open = self.stack[self.stack.len() - 1];
            let name = self.tree.name(open).unwrap_or_default().to_string();
            return Err(self.error(format!("unclosed element <{name}>")));
        }
        if !self.seen_root {
            return Err(self.error("document has no root element"));
        }
        Ok(self.tree)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.pos,
        }
    }

    #[inline]
    fn rest(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    #[inline]
    fn current_parent(&self) -> NodeId {
        self.stack[self.stack.len() - 1]
    }

    #[inline]
    fn at_document_level(&self) -> bool {
        self.stack.len() == 1
    }

    fn link(&mut self, node: NodeId) -> Result<(), ParseError> {
        let parent = self.current_parent();
        self.tree
            .append_child(parent, node)
            .map_err(|e| self.error(e.to_string()))
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && is_space(self.input[self.pos]) {
            self.pos += 1;
        }
    }

    /// Find `needle` from the current position, returning its absolute offset
    fn find(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(self.rest(), needle).map(|i| self.pos + i)
    }

    fn utf8(&self, bytes: &'a [u8]) -> Result<&'a str, ParseError> {
        std::str::from_utf8(bytes).map_err(|_| self.error("invalid UTF-8"))
    }

    fn read_name(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        if start >= self.input.len() || !is_name_start(self.input[start]) {
            return Err(self.error("expected a name"));
        }
        let mut end = start + 1;
        while end < self.input.len() && is_name_char(self.input[end]) {
            end += 1;
        }
        self.pos = end;
        self.utf8(&self.input[start..end])
    }

    // ------------------------------------------------------------------
    // Character data
    // ------------------------------------------------------------------

    fn text(&mut self, end: usize) -> Result<(), ParseError> {
        let raw = &self.input[self.pos..end];
        let blank = raw.iter().all(|&b| is_space(b));

        if self.at_document_level() {
            if !blank {
                return Err(self.error("character data outside the root element"));
            }
        } else if !blank || self.options.keep_blanks {
            let text = decode_text(raw).map_err(|m| self.error(m))?;
            let node = self.tree.create_text(&text);
            self.link(node)?;
        }
        self.pos = end;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Markup
    // ------------------------------------------------------------------

    fn markup(&mut self) -> Result<(), ParseError> {
        let rest = self.rest();
        if rest.starts_with(b"<!--") {
            self.comment()
        } else if rest.starts_with(b"<![CDATA[") {
            self.cdata()
        } else if rest.starts_with(b"<!DOCTYPE") {
            self.doctype()
        } else if rest.starts_with(b"<?") {
            self.processing_instruction()
        } else if rest.starts_with(b"</") {
            self.end_tag()
        } else {
            self.start_tag()
        }
    }

    fn comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos + 4;
        let end = memmem::find(&self.input[start..], b"-->")
            .map(|i| start + i)
            .ok_or_else(|| self.error("unterminated comment"))?;
        let content = self.utf8(&self.input[start..end])?;
        if content.contains("--") {
            return Err(self.error("'--' inside comment"));
        }
        let node = self.tree.create_comment(content);
        self.link(node)?;
        self.pos = end + 3;
        Ok(())
    }

    fn cdata(&mut self) -> Result<(), ParseError> {
        if self.at_document_level() {
            return Err(self.error("CDATA section outside the root element"));
        }
        let start = self.pos + 9;
        let end = memmem::find(&self.input[start..], b"]]>")
            .map(|i| start + i)
            .ok_or_else(|| self.error("unterminated CDATA section"))?;
        let content = self.utf8(&self.input[start..end])?;
        let node = self.tree.create_cdata(content);
        self.link(node)?;
        self.pos = end + 3;
        Ok(())
    }

    fn doctype(&mut self) -> Result<(), ParseError> {
        if self.seen_root || !self.at_document_level() {
            return Err(self.error("misplaced DOCTYPE declaration"));
        }
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        let mut i = self.pos + 9;
        while i < self.input.len() {
            let b = self.input[i];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'[' => depth += 1,
                    b']' => depth = depth.saturating_sub(1),
                    b'>' if depth == 0 => {
                        self.pos = i + 1;
                        return Ok(());
                    }
                    _ => {}
                },
            }
            i += 1;
        }
        Err(self.error("unterminated DOCTYPE declaration"))
    }

    fn processing_instruction(&mut self) -> Result<(), ParseError> {
        let at = self.pos;
        self.pos += 2;
        let target = self.read_name()?;
        let end = self.find(b"?>").ok_or_else(|| self.error("unterminated processing instruction"))?;
        if self.pos < end && !is_space(self.input[self.pos]) {
            return Err(self.error("malformed processing instruction"));
        }
        let data = self.utf8(&self.input[self.pos..end])?.trim_start();

        if target.eq_ignore_ascii_case("xml") {
            if at != 0 {
                return Err(self.error("XML declaration not at start of document"));
            }
        } else {
            let node = self.tree.create_processing_instruction(target, data);
            self.link(node)?;
        }
        self.pos = end + 2;
        Ok(())
    }

    fn end_tag(&mut self) -> Result<(), ParseError> {
        self.pos += 2;
        let name = self.read_name()?;
        self.skip_whitespace();
        if self.rest().first() != Some(&b'>') {
            return Err(self.error("expected '>' in end tag"));
        }
        self.pos += 1;

        if self.at_document_level() {
            return Err(self.error(format!("unexpected end tag </{name}>")));
        }
        let open = self.current_parent();
        let open_name = self.tree.name(open).unwrap_or_default();
        if open_name != name {
            return Err(self.error(format!("end tag </{name}> does not match <{open_name}>")));
        }
        self.stack.pop();
        Ok(())
    }

    fn start_tag(&mut self) -> Result<(), ParseError> {
        if self.at_document_level() && self.seen_root {
            return Err(self.error("extra content after the root element"));
        }
        self.pos += 1;
        let name = self.read_name()?;
        let element = self.tree.create_element(name);
        self.link(element)?;
        if self.at_document_level() {
            self.seen_root = true;
        }

        loop {
            let had_space = self.pos < self.input.len() && is_space(self.input[self.pos]);
            self.skip_whitespace();
            match self.rest() {
                [] => return Err(self.error(format!("unterminated start tag <{name}>"))),
                [b'/', b'>', ..] => {
                    self.pos += 2;
                    return Ok(());
                }
                [b'>', ..] => {
                    self.pos += 1;
                    self.stack.push(element);
                    return Ok(());
                }
                _ if !had_space => return Err(self.error("expected whitespace before attribute")),
                _ => self.attribute(element)?,
            }
        }
    }

    fn attribute(&mut self, element: NodeId) -> Result<(), ParseError> {
        let name = self.read_name()?;
        self.skip_whitespace();
        if self.rest().first() != Some(&b'=') {
            return Err(self.error(format!("expected '=' after attribute {name}")));
        }
        self.pos += 1;
        self.skip_whitespace();

        let quote = match self.rest().first() {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err(self.error(format!("unquoted value for attribute {name}"))),
        };
        let start = self.pos + 1;
        let end = memchr(quote, &self.input[start..])
            .map(|i| start + i)
            .ok_or_else(|| self.error(format!("unterminated value for attribute {name}")))?;
        let raw = &self.input[start..end];
        if memchr(b'<', raw).is_some() {
            return Err(self.error(format!("'<' in value of attribute {name}")));
        }

        if self.tree.attribute(element, name).is_some() {
            return Err(self.error(format!("duplicate attribute {name}")));
        }
        let decoded = decode_text(raw).map_err(|m| self.error(m))?;
        let value: String = decoded
            .chars()
            .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
            .collect();
        self.tree
            .set_attribute(element, name, &value)
            .map_err(|e| self.error(e.to_string()))?;
        self.pos = end + 1;
        Ok(())
    }
}
