//! Tree serialization
//!
//! Output is UTF-8 with an XML declaration. Pretty printing indents by two
//! spaces, but only inside elements without text children, so mixed and
//! text-only content is written back byte for byte.

use std::fs;
use std::io;
use std::path::Path;

use super::entities::{escape_attribute, escape_text};
use super::node::{NodeId, NodeKind};
use super::tree::XmlTree;

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";
const INDENT: &str = "  ";

/// Serialize the whole document
pub fn write_document(tree: &XmlTree, pretty: bool) -> String {
    let mut out = String::with_capacity(tree.node_count() * 32);
    out.push_str(DECLARATION);
    for child in tree.children(XmlTree::DOCUMENT) {
        write_node(tree, child, 0, pretty, &mut out);
        out.push('\n');
    }
    out
}

/// Serialize a single subtree without declaration
pub fn write_fragment(tree: &XmlTree, node: NodeId, pretty: bool) -> String {
    let mut out = String::new();
    write_node(tree, node, 0, pretty, &mut out);
    out
}

/// Serialize the document into `path`
pub fn save_file(tree: &XmlTree, path: &Path, pretty: bool) -> io::Result<()> {
    fs::write(path, write_document(tree, pretty))
}

fn write_node(tree: &XmlTree, id: NodeId, depth: usize, pretty: bool, out: &mut String) {
    let Some(node) = tree.get_node(id) else { return };
    match node.kind {
        NodeKind::Document => {
            for child in tree.children(id) {
                write_node(tree, child, depth, pretty, out);
            }
        }
        NodeKind::Element => write_element(tree, id, depth, pretty, out),
        NodeKind::Text => out.push_str(&escape_text(&node.content)),
        NodeKind::CData => {
            out.push_str("<![CDATA[");
            out.push_str(&node.content);
            out.push_str("]]>");
        }
        NodeKind::Comment => {
            out.push_str("<!--");
            out.push_str(&node.content);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction => {
            out.push_str("<?");
            out.push_str(tree.name(id).unwrap_or_default());
            if !node.content.is_empty() {
                out.push(' ');
                out.push_str(&node.content);
            }
            out.push_str("?>");
        }
    }
}

fn write_element(tree: &XmlTree, id: NodeId, depth: usize, pretty: bool, out: &mut String) {
    let name = tree.name(id).unwrap_or_default();
    out.push('<');
    out.push_str(name);
    for (attr, value) in tree.attributes(id) {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }

    if tree.children(id).next().is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');

    let indent_children = pretty
        && tree
            .children(id)
            .all(|c| !matches!(tree.kind(c), Some(NodeKind::Text | NodeKind::CData)));
    for child in tree.children(id) {
        if indent_children {
            out.push('\n');
            push_indent(out, depth + 1);
        }
        write_node(tree, child, depth + 1, indent_children, out);
    }
    if indent_children {
        out.push('\n');
        push_indent(out, depth);
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
