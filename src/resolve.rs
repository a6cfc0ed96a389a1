//! Path Resolution
//!
//! Every read or write on a document first turns a path expression into a
//! node here. Ambiguous matches and matches of the wrong kind are rejected
//! before any caller touches the tree.

use crate::document::Document;
use crate::dom::{NodeId, NodeKind};
use crate::error::{Error, Result};
use crate::xpath::XPathValue;

/// Evaluate `path` and return every matched node
///
/// An empty match is `ElementNotFound`. Attribute selections have no nodes
/// to return and give `NotAnElement`; scalar results are `InvalidPath`.
pub fn exists(doc: &mut Document, path: &str) -> Result<Vec<NodeId>> {
    match doc.query(path)? {
        XPathValue::NodeSet(nodes) if nodes.is_empty() => Err(Error::ElementNotFound(path.to_string())),
        XPathValue::NodeSet(nodes) => Ok(nodes),
        XPathValue::StringList(values) if values.is_empty() => Err(Error::ElementNotFound(path.to_string())),
        XPathValue::StringList(_) => Err(Error::NotAnElement(path.to_string())),
        _ => {
            tracing::error!(path, "expression does not select nodes");
            Err(Error::InvalidPath(path.to_string()))
        }
    }
}

/// Resolve `path` to exactly one element, text or document node
///
/// One trailing `/` is ignored so `/a/b/` names the same node as `/a/b`.
pub fn resolve_unique(doc: &mut Document, path: &str) -> Result<NodeId> {
    let path = strip_trailing_slash(path);
    let node = unique_match(doc, path)?;
    match doc.tree().kind(node) {
        Some(NodeKind::Element | NodeKind::Document | NodeKind::Text) => Ok(node),
        _ => {
            tracing::error!(path, "expression does not point to an element node");
            Err(Error::NotAnElement(path.to_string()))
        }
    }
}

/// Parent of the single node matched by `path`
pub fn parent_of_unique(doc: &mut Document, path: &str) -> Result<NodeId> {
    let node = unique_match(doc, path)?;
    doc.tree().parent(node).ok_or_else(|| {
        tracing::error!(path, "matched node has no parent");
        Error::ElementNotFound(path.to_string())
    })
}

/// The single node matched by `path`, whatever its kind
pub fn node_at(doc: &mut Document, path: &str) -> Result<NodeId> {
    unique_match(doc, path)
}

fn strip_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

fn unique_match(doc: &mut Document, path: &str) -> Result<NodeId> {
    let nodes = match exists(doc, path) {
        Ok(nodes) => nodes,
        Err(Error::ElementNotFound(p)) => {
            tracing::info!(path, "element not found");
            return Err(Error::ElementNotFound(p));
        }
        Err(Error::NotAnElement(p)) => {
            // Attribute steps: report ambiguity before kind
            if let Ok(XPathValue::StringList(values)) = doc.query(path) {
                if values.len() > 1 {
                    return Err(not_unique(path));
                }
            }
            tracing::error!(path, "expression does not point to an element node");
            return Err(Error::NotAnElement(p));
        }
        Err(e) => return Err(e),
    };
    match nodes.as_slice() {
        [node] => Ok(*node),
        _ => Err(not_unique(path)),
    }
}

fn not_unique(path: &str) -> Error {
    tracing::error!(path, "element chosen by expression is not unique");
    Error::ElementPathNotUnique(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(xml: &str) -> Document {
        Document::import_from_str(xml).unwrap()
    }

    #[test]
    fn test_exists_counts_matches() {
        let mut d = doc("<r><p/><p/><q/></r>");
        assert_eq!(exists(&mut d, "/r/p").unwrap().len(), 2);
        assert_eq!(exists(&mut d, "/r/x"), Err(Error::ElementNotFound("/r/x".into())));
        assert_eq!(exists(&mut d, "/r/["), Err(Error::InvalidPath("/r/[".into())));
        assert_eq!(exists(&mut d, "count(/r/p)"), Err(Error::InvalidPath("count(/r/p)".into())));
    }

    #[test]
    fn test_resolve_unique_outcomes() {
        let mut d = doc("<r><a>t<!--c--></a><b/><b/></r>");
        let a = resolve_unique(&mut d, "/r/a").unwrap();
        assert_eq!(d.tree().name(a), Some("a"));
        assert_eq!(resolve_unique(&mut d, "/r/a/"), Ok(a));
        assert_eq!(resolve_unique(&mut d, "/"), Ok(0));
        assert!(resolve_unique(&mut d, "/r/a/text()").is_ok());

        assert_eq!(resolve_unique(&mut d, "/r/z"), Err(Error::ElementNotFound("/r/z".into())));
        assert_eq!(resolve_unique(&mut d, "/r/b"), Err(Error::ElementPathNotUnique("/r/b".into())));
        assert_eq!(
            resolve_unique(&mut d, "/r/a/comment()"),
            Err(Error::NotAnElement("/r/a/comment()".into()))
        );
    }

    #[test]
    fn test_attribute_selection_is_not_an_element() {
        let mut d = doc(r#"<r><a k="1"/><b k="2"/></r>"#);
        assert_eq!(resolve_unique(&mut d, "/r/a/@k"), Err(Error::NotAnElement("/r/a/@k".into())));
        assert_eq!(
            resolve_unique(&mut d, "/r/*/@k"),
            Err(Error::ElementPathNotUnique("/r/*/@k".into()))
        );
    }

    #[test]
    fn test_parent_and_node_at() {
        let mut d = doc("<r><a><b/></a><!--x--></r>");
        let a = resolve_unique(&mut d, "/r/a").unwrap();
        assert_eq!(parent_of_unique(&mut d, "/r/a/b"), Ok(a));
        assert_eq!(parent_of_unique(&mut d, "/"), Err(Error::ElementNotFound("/".into())));
        let comment = node_at(&mut d, "/r/comment()").unwrap();
        assert_eq!(d.tree().kind(comment), Some(NodeKind::Comment));
    }
}
