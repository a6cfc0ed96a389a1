//! XPath Axes Implementation
//!
//! Tree axes over arena nodes. Each axis returns nodes in axis order
//! (reverse document order for reverse axes), which is what proximity
//! positions in step predicates count against. The attribute axis is handled
//! by the evaluator because attributes are not arena nodes; the namespace axis
//! is always empty.

use super::parser::{Axis, NodeTest};
use crate::dom::{DocumentAccess, NodeId, NodeKind};

/// Navigate along an axis from a context node
pub fn navigate<D: DocumentAccess>(doc: &D, context: NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => doc.children_vec(context),
        Axis::Descendant => doc.descendants_vec(context),
        Axis::DescendantOrSelf => {
            let mut result = vec![context];
            result.extend(doc.descendants_vec(context));
            result
        }
        Axis::Parent => doc.parent_of(context).into_iter().collect(),
        Axis::Ancestor => ancestors(doc, context),
        Axis::AncestorOrSelf => {
            let mut result = vec![context];
            result.extend(ancestors(doc, context));
            result
        }
        Axis::FollowingSibling => siblings(doc, context, D::next_sibling_of),
        Axis::PrecedingSibling => siblings(doc, context, D::prev_sibling_of),
        Axis::Following => following(doc, context),
        Axis::Preceding => preceding(doc, context),
        Axis::Self_ => vec![context],
        Axis::Attribute | Axis::Namespace => Vec::new(),
    }
}

fn ancestors<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = context;
    while let Some(parent) = doc.parent_of(current) {
        result.push(parent);
        current = parent;
    }
    result
}

fn siblings<D: DocumentAccess>(
    doc: &D,
    context: NodeId,
    step: fn(&D, NodeId) -> Option<NodeId>,
) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut sibling = step(doc, context);
    while let Some(id) = sibling {
        result.push(id);
        sibling = step(doc, id);
    }
    result
}

/// following:: axis - everything after the context subtree in document order
fn following<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = Some(context);
    while let Some(node) = current {
        let mut sibling = doc.next_sibling_of(node);
        while let Some(id) = sibling {
            result.push(id);
            result.extend(doc.descendants_vec(id));
            sibling = doc.next_sibling_of(id);
        }
        current = doc.parent_of(node);
    }
    result
}

/// preceding:: axis - everything before the context node, ancestors excluded,
/// nearest first
fn preceding<D: DocumentAccess>(doc: &D, context: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = Some(context);
    while let Some(node) = current {
        let mut sibling = doc.prev_sibling_of(node);
        while let Some(id) = sibling {
            let mut subtree = vec![id];
            subtree.extend(doc.descendants_vec(id));
            result.extend(subtree.into_iter().rev());
            sibling = doc.prev_sibling_of(id);
        }
        current = doc.parent_of(node);
    }
    result
}

/// Check whether a node passes a node test on a non-attribute axis
pub fn matches_node_test<D: DocumentAccess>(doc: &D, node: NodeId, test: &NodeTest) -> bool {
    let Some(kind) = doc.node_kind_of(node) else {
        return false;
    };
    match test {
        NodeTest::Node => true,
        NodeTest::Text => matches!(kind, NodeKind::Text | NodeKind::CData),
        NodeTest::Comment => kind == NodeKind::Comment,
        NodeTest::ProcessingInstruction(target) => {
            kind == NodeKind::ProcessingInstruction
                && target.as_deref().is_none_or(|t| doc.node_name(node) == Some(t))
        }
        NodeTest::Any => kind == NodeKind::Element,
        NodeTest::Name(name) => kind == NodeKind::Element && doc.node_name(node) == Some(name.as_str()),
        NodeTest::NamespaceWildcard(prefix) => {
            kind == NodeKind::Element
                && doc
                    .node_name(node)
                    .and_then(|n| n.split_once(':'))
                    .is_some_and(|(p, _)| p == prefix)
        }
    }
}

/// Check whether an attribute name passes a node test on the attribute axis
///
/// Namespace declarations are not attributes in the XPath data model.
pub fn matches_attribute_test(name: &str, test: &NodeTest) -> bool {
    if name == "xmlns" || name.starts_with("xmlns:") {
        return false;
    }
    match test {
        NodeTest::Any | NodeTest::Node => true,
        NodeTest::Name(wanted) => name == wanted,
        NodeTest::NamespaceWildcard(prefix) => name.split_once(':').is_some_and(|(p, _)| p == prefix),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse, XmlTree};

    fn names(tree: &XmlTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter().filter_map(|&id| tree.name(id)).map(str::to_string).collect()
    }

    fn find(tree: &XmlTree, name: &str) -> NodeId {
        tree.descendants(XmlTree::DOCUMENT)
            .find(|&id| tree.name(id) == Some(name))
            .unwrap()
    }

    #[test]
    fn test_child_and_parent() {
        let tree = parse(b"<r><a/><b/></r>").unwrap();
        let r = find(&tree, "r");
        assert_eq!(names(&tree, &navigate(&tree, r, Axis::Child)), ["a", "b"]);
        let a = find(&tree, "a");
        assert_eq!(navigate(&tree, a, Axis::Parent), vec![r]);
    }

    #[test]
    fn test_sibling_axes() {
        let tree = parse(b"<r><a/><b/><c/></r>").unwrap();
        let b = find(&tree, "b");
        assert_eq!(names(&tree, &navigate(&tree, b, Axis::FollowingSibling)), ["c"]);
        assert_eq!(names(&tree, &navigate(&tree, b, Axis::PrecedingSibling)), ["a"]);
    }

    #[test]
    fn test_following_and_preceding() {
        let tree = parse(b"<r><a><a1/></a><b><b1/></b><c/></r>").unwrap();
        let b = find(&tree, "b");
        assert_eq!(names(&tree, &navigate(&tree, b, Axis::Following)), ["c"]);
        assert_eq!(names(&tree, &navigate(&tree, b, Axis::Preceding)), ["a1", "a"]);
        let b1 = find(&tree, "b1");
        assert_eq!(names(&tree, &navigate(&tree, b1, Axis::Ancestor)), ["b", "r"]);
    }

    #[test]
    fn test_node_tests() {
        let tree = parse(b"<r xmlns:cp=\"urn:x\"><cp:a/>t<!--c--><?p d?></r>").unwrap();
        let r = find(&tree, "r");
        let kids = navigate(&tree, r, Axis::Child);
        assert!(matches_node_test(&tree, kids[0], &NodeTest::NamespaceWildcard("cp".into())));
        assert!(matches_node_test(&tree, kids[1], &NodeTest::Text));
        assert!(matches_node_test(&tree, kids[2], &NodeTest::Comment));
        assert!(matches_node_test(&tree, kids[3], &NodeTest::ProcessingInstruction(Some("p".into()))));
        assert!(!matches_node_test(&tree, kids[1], &NodeTest::Any));
    }

    #[test]
    fn test_attribute_test_skips_namespace_declarations() {
        assert!(!matches_attribute_test("xmlns:cp", &NodeTest::Any));
        assert!(matches_attribute_test("uID", &NodeTest::Any));
        assert!(matches_attribute_test("cp:x", &NodeTest::NamespaceWildcard("cp".into())));
    }
}
