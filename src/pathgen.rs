//! Path Generation
//!
//! Builds an absolute path expression for a node that resolves back to the
//! same node. Elements carrying a `uID` are addressed by it; same-named
//! siblings without one get a position, and so do text siblings.

use crate::document::Document;
use crate::dom::{NodeId, NodeKind, XmlTree};
use crate::error::{Error, Result};
use crate::uid::UID_ATTRIBUTE;

/// Path of `node`, tracked in the document's scratch pool
pub fn generate(doc: &mut Document, node: NodeId) -> Result<&str> {
    let path = build(doc.tree(), node)?;
    doc.track(path)
}

/// Path of `node` as an owned string
///
/// Elements with a uID are addressed by it; every other step is positional
/// where same-kind siblings exist. The document node itself is `/`.
pub fn build(tree: &XmlTree, node: NodeId) -> Result<String> {
    if tree.get_node(node).is_none() {
        tracing::error!(node, "cannot generate path for unknown node");
        return Err(Error::ElementNotFound(format!("node {node}")));
    }
    let mut segments = Vec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        if let Some(s) = segment(tree, id) {
            segments.push(s);
        }
        current = tree.parent(id);
    }
    if segments.is_empty() {
        return Ok("/".to_string());
    }
    segments.reverse();
    let mut path = String::new();
    for s in segments {
        path.push('/');
        path.push_str(&s);
    }
    Ok(path)
}

fn segment(tree: &XmlTree, id: NodeId) -> Option<String> {
    if tree.kind(id)? == NodeKind::Document {
        return None;
    }
    if tree.is_element(id) {
        if let Some(uid) = tree.attribute(id, UID_ATTRIBUTE) {
            let name = tree.name(id).unwrap_or_default();
            return Some(format!("{name}[@{UID_ATTRIBUTE}={}]", literal(uid)));
        }
    }
    tree.step_segment(id)
}

/// XPath string literal for `value`
///
/// XPath 1.0 has no escapes, so a value holding both quote characters is
/// spelled as a `concat` of single-quoted pieces and `"'"`.
fn literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    let pieces: Vec<String> = value.split('\'').map(|piece| format!("'{piece}'")).collect();
    format!("concat({})", pieces.join(", \"'\", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_unique;

    #[test]
    fn test_plain_and_uid_segments() {
        let mut d = Document::import_from_str(r#"<r><w uID="wing1"><s/></w></r>"#).unwrap();
        let s = resolve_unique(&mut d, "/r/w/s").unwrap();
        assert_eq!(generate(&mut d, s).unwrap(), r#"/r/w[@uID="wing1"]/s"#);
        assert_eq!(d.scratch_len(), 1);
    }

    #[test]
    fn test_generated_path_resolves_to_same_node() {
        let xml = r#"<r><a/><a><b uID="x"/><b uID="y"><c/><c/></b></a><t>text</t></r>"#;
        let mut d = Document::import_from_str(xml).unwrap();
        let elements: Vec<NodeId> = d
            .tree()
            .descendants(XmlTree::DOCUMENT)
            .filter(|&n| matches!(d.tree().kind(n), Some(NodeKind::Element | NodeKind::Text)))
            .collect();
        for node in elements {
            let path = build(d.tree(), node).unwrap();
            assert_eq!(resolve_unique(&mut d, &path), Ok(node), "path {path}");
        }
    }

    #[test]
    fn test_document_and_text_nodes() {
        let mut d = Document::import_from_str("<r><t>x</t></r>").unwrap();
        assert_eq!(build(d.tree(), XmlTree::DOCUMENT).unwrap(), "/");
        let text = resolve_unique(&mut d, "/r/t/text()").unwrap();
        assert_eq!(build(d.tree(), text).unwrap(), "/r/t/text()");
        assert_eq!(resolve_unique(&mut d, "/r/t/text()"), Ok(text));
        assert!(build(d.tree(), 10_000).is_err());
    }

    #[test]
    fn test_mixed_content_text_nodes_round_trip() {
        let mut d = Document::import_from_str("<r><t>x<b/>y</t></r>").unwrap();
        let texts: Vec<NodeId> = d
            .tree()
            .descendants(XmlTree::DOCUMENT)
            .filter(|&n| d.tree().kind(n) == Some(NodeKind::Text))
            .collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(build(d.tree(), texts[0]).unwrap(), "/r/t/text()[1]");
        assert_eq!(build(d.tree(), texts[1]).unwrap(), "/r/t/text()[2]");
        for node in texts {
            let path = build(d.tree(), node).unwrap();
            assert_eq!(resolve_unique(&mut d, &path), Ok(node), "path {path}");
        }
    }

    #[test]
    fn test_uid_with_both_quotes() {
        assert_eq!(literal("plain"), "\"plain\"");
        assert_eq!(literal("say \"hi\""), "'say \"hi\"'");
        assert_eq!(literal("x'y\"z"), "concat('x', \"'\", 'y\"z')");

        let mut d = Document::import_from_str(r#"<r><a uID="x'y&quot;z"/><a/></r>"#).unwrap();
        let a = resolve_unique(&mut d, "/r/a[1]").unwrap();
        let path = build(d.tree(), a).unwrap();
        assert_eq!(resolve_unique(&mut d, &path), Ok(a));
    }
}
