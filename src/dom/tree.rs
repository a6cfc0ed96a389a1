//! Mutable arena tree
//!
//! Nodes live in a `Vec<Option<XmlNode>>` and reference each other through
//! `NodeId` links. Removing a subtree frees its slots for reuse, so callers
//! must not hold ids across structural mutations they did not make themselves.
//!
//! Every tree carries a process-unique `TreeId`. Duplicating a tree yields a
//! new id, which lets an XPath context detect that it was built for a
//! different tree.

use std::sync::atomic::{AtomicU64, Ordering};

use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode};
use super::strings::StringPool;
use super::DocumentAccess;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique tree identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(u64);

impl TreeId {
    fn next() -> Self {
        TreeId(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Structural errors raised by tree mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("node {node} cannot be linked under {parent}")]
    InvalidLink { node: NodeId, parent: NodeId },
}

/// Arena-backed mutable XML tree
#[derive(Debug)]
pub struct XmlTree {
    id: TreeId,
    nodes: Vec<Option<XmlNode>>,
    free: Vec<NodeId>,
    /// Interned element, attribute and PI names
    pub strings: StringPool,
}

impl XmlTree {
    /// The document node always occupies slot 0
    pub const DOCUMENT: NodeId = 0;

    /// Create an empty tree holding only the document node
    pub fn new() -> Self {
        XmlTree {
            id: TreeId::next(),
            nodes: vec![Some(XmlNode::document())],
            free: Vec::new(),
            strings: StringPool::new(),
        }
    }

    /// Create a tree whose root element is `root_name`
    pub fn with_root(root_name: &str) -> Self {
        let mut tree = Self::new();
        let root = tree.create_element(root_name);
        // A fresh element under the document node cannot fail to link
        let _ = tree.append_child(Self::DOCUMENT, root);
        tree
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Deep copy of the whole tree under a new identity
    pub fn duplicate(&self) -> Self {
        XmlTree {
            id: TreeId::next(),
            nodes: self.nodes.clone(),
            free: self.free.clone(),
            strings: self.strings.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    fn alloc(&mut self, node: XmlNode) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id as usize] = Some(node);
                id
            }
            None => {
                let id = self.nodes.len() as NodeId;
                self.nodes.push(Some(node));
                id
            }
        }
    }

    /// Create an unlinked element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let name_id = self.strings.intern(name);
        self.alloc(XmlNode::element(name_id))
    }

    /// Create an unlinked text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(XmlNode::text(text.to_string()))
    }

    pub fn create_cdata(&mut self, text: &str) -> NodeId {
        self.alloc(XmlNode::cdata(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(XmlNode::comment(text.to_string()))
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        let target_id = self.strings.intern(target);
        self.alloc(XmlNode::processing_instruction(target_id, data.to_string()))
    }

    /// Create an element holding a single text child
    pub fn create_text_element(&mut self, name: &str, text: &str) -> NodeId {
        let element = self.create_element(name);
        let child = self.create_text(text);
        let _ = self.append_child(element, child);
        element
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    #[inline]
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut XmlNode, TreeError> {
        self.nodes
            .get_mut(id as usize)
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    /// Element name or PI target
    pub fn name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction => self.strings.get_str(node.name_id),
            _ => None,
        }
    }

    /// Character data of text, CDATA, comment and PI nodes
    pub fn content(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Document | NodeKind::Element => None,
            _ => Some(node.content.as_str()),
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id) == Some(NodeKind::Element)
    }

    /// First element child of the document node
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(Self::DOCUMENT).find(|&c| self.is_element(c))
    }

    /// Number of live nodes, the document node included
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Child ids in order
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            next: self.get_node(id).and_then(|n| n.first_child),
        }
    }

    /// Descendant ids in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        if let Some(first) = self.get_node(id).and_then(|n| n.first_child) {
            stack.push(first);
        }
        DescendantIter { tree: self, stack }
    }

    /// Number of direct children of any kind
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Element children called `name`
    pub fn named_children<'t>(&'t self, id: NodeId, name: &'t str) -> impl Iterator<Item = NodeId> + 't {
        self.children(id).filter(move |&c| self.is_element(c) && self.name(c) == Some(name))
    }

    /// First element child called `name`
    pub fn first_named_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.named_children(id, name).next()
    }

    /// Concatenated text and CDATA children (not descendants)
    pub fn child_text(&self, id: NodeId) -> String {
        let mut text = String::new();
        for child in self.children(id) {
            if let Some(node) = self.get_node(child) {
                if node.is_text() {
                    text.push_str(&node.content);
                }
            }
        }
        text
    }

    /// XPath string-value
    pub fn string_value(&self, id: NodeId) -> String {
        let Some(node) = self.get_node(id) else {
            return String::new();
        };
        match node.kind {
            NodeKind::Document | NodeKind::Element => {
                let mut text = String::new();
                for d in self.descendants(id) {
                    if let Some(n) = self.get_node(d) {
                        if n.is_text() {
                            text.push_str(&n.content);
                        }
                    }
                }
                text
            }
            _ => node.content.clone(),
        }
    }

    /// True when `node` is `ancestor` or lies below it
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// True when the node is reachable from the document node
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.get_node(id).is_some() && self.is_ancestor_or_self(Self::DOCUMENT, id)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name_id = self.strings.lookup(name)?;
        self.get_node(id)?
            .attributes
            .iter()
            .find(|a| a.name_id == name_id)
            .map(|a| a.value.as_str())
    }

    /// All attributes as (name, value) pairs in document order
    pub fn attributes(&self, id: NodeId) -> Vec<(&str, &str)> {
        let Some(node) = self.get_node(id) else {
            return Vec::new();
        };
        node.attributes
            .iter()
            .filter_map(|a| Some((self.strings.get_str(a.name_id)?, a.value.as_str())))
            .collect()
    }

    /// Set or replace an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), TreeError> {
        let name_id = self.strings.intern(name);
        let node = self.node_mut(id)?;
        if node.kind != NodeKind::Element {
            return Err(TreeError::NotAnElement(id));
        }
        match node.attributes.iter_mut().find(|a| a.name_id == name_id) {
            Some(attr) => attr.value = value.to_string(),
            None => node.attributes.push(XmlAttribute::new(name_id, value.to_string())),
        }
        Ok(())
    }

    /// Remove an attribute, returning its former value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let name_id = self.strings.lookup(name)?;
        let node = self.node_mut(id).ok()?;
        let index = node.attributes.iter().position(|a| a.name_id == name_id)?;
        Some(node.attributes.remove(index).value)
    }

    /// Namespace URI bound to `prefix` on `id` or its nearest declaring ancestor
    ///
    /// `None` as prefix looks up the default namespace.
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some("http://www.w3.org/XML/1998/namespace");
        }
        let decl = match prefix {
            Some(p) => format!("xmlns:{p}"),
            None => "xmlns".to_string(),
        };
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(uri) = self.attribute(node, &decl) {
                return Some(uri);
            }
            current = self.parent(node);
        }
        None
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    fn check_link(&self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        let child = self.get_node(node).ok_or(TreeError::UnknownNode(node))?;
        let target = self.get_node(parent).ok_or(TreeError::UnknownNode(parent))?;
        let invalid = child.kind == NodeKind::Document
            || !matches!(target.kind, NodeKind::Document | NodeKind::Element)
            || self.is_ancestor_or_self(node, parent);
        if invalid {
            return Err(TreeError::InvalidLink { node, parent });
        }
        Ok(())
    }

    /// Append `child` as last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_link(parent, child)?;
        self.detach(child)?;

        let last = self.node_mut(parent)?.last_child;
        {
            let node = self.node_mut(child)?;
            node.parent = Some(parent);
            node.prev_sibling = last;
        }
        match last {
            Some(last) => self.node_mut(last)?.next_sibling = Some(child),
            None => self.node_mut(parent)?.first_child = Some(child),
        }
        self.node_mut(parent)?.last_child = Some(child);
        Ok(())
    }

    /// Insert `node` directly after `anchor`, detaching it first
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(anchor).ok_or(TreeError::InvalidLink { node, parent: anchor })?;
        if node == anchor {
            return Err(TreeError::InvalidLink { node, parent });
        }
        self.check_link(parent, node)?;
        self.detach(node)?;

        let next = self.node_mut(anchor)?.next_sibling;
        {
            let n = self.node_mut(node)?;
            n.parent = Some(parent);
            n.prev_sibling = Some(anchor);
            n.next_sibling = next;
        }
        self.node_mut(anchor)?.next_sibling = Some(node);
        match next {
            Some(next) => self.node_mut(next)?.prev_sibling = Some(node),
            None => self.node_mut(parent)?.last_child = Some(node),
        }
        Ok(())
    }

    /// Unlink a node from its parent and siblings; its subtree stays intact
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        let (parent, prev, next) = {
            let node = self.node_mut(id)?;
            let links = (node.parent, node.prev_sibling, node.next_sibling);
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
            links
        };
        match prev {
            Some(prev) => self.node_mut(prev)?.next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent)?.first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.node_mut(next)?.prev_sibling = prev,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent)?.last_child = prev;
                }
            }
        }
        Ok(())
    }

    /// Put `new` where `old` is; `old` ends up detached but not freed
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        if old == new {
            return Ok(());
        }
        self.insert_after(old, new)?;
        self.detach(old)
    }

    /// Detach a node and free its whole subtree
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == Self::DOCUMENT {
            return Err(TreeError::InvalidLink { node: id, parent: id });
        }
        self.detach(id)?;
        self.free_subtree(id);
        Ok(())
    }

    /// Free a detached subtree
    pub fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get_mut(current as usize).and_then(Option::take) else {
                continue;
            };
            let mut child = node.first_child;
            while let Some(c) = child {
                stack.push(c);
                child = self.get_node(c).and_then(|n| n.next_sibling);
            }
            self.free.push(current);
        }
    }

    /// Replace the root element, freeing the previous one
    pub fn set_root_element(&mut self, element: NodeId) -> Result<(), TreeError> {
        if !self.is_element(element) {
            return Err(TreeError::NotAnElement(element));
        }
        match self.root_element() {
            Some(old) if old == element => Ok(()),
            Some(old) => {
                self.replace(old, element)?;
                self.free_subtree(old);
                Ok(())
            }
            None => self.append_child(Self::DOCUMENT, element),
        }
    }

    /// Copy a subtree of `source` into this tree, returning the unlinked copy
    ///
    /// `source` may be a different tree; names are re-interned.
    pub fn import_node(&mut self, source: &XmlTree, id: NodeId) -> Result<NodeId, TreeError> {
        let copy = self.copy_shallow(source, id)?;
        let mut pending = vec![(id, copy)];
        while let Some((src, dst)) = pending.pop() {
            for child in source.children(src) {
                let child_copy = self.copy_shallow(source, child)?;
                self.append_child(dst, child_copy)?;
                pending.push((child, child_copy));
            }
        }
        Ok(copy)
    }

    /// Copy a subtree within this tree, returning the unlinked copy
    pub fn deep_copy(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        let mut fragment = XmlTree::new();
        let copy = fragment.import_node(self, id)?;
        self.import_node(&fragment, copy)
    }

    fn copy_shallow(&mut self, source: &XmlTree, id: NodeId) -> Result<NodeId, TreeError> {
        let node = source.get_node(id).ok_or(TreeError::UnknownNode(id))?;
        if node.kind == NodeKind::Document {
            return Err(TreeError::InvalidLink { node: id, parent: id });
        }
        let name_id = match source.strings.get_str(node.name_id) {
            Some(name) => self.strings.intern(name),
            None => 0,
        };
        let attributes = node
            .attributes
            .iter()
            .map(|a| {
                let name = source.strings.get_str(a.name_id).unwrap_or_default();
                XmlAttribute::new(self.strings.intern(name), a.value.clone())
            })
            .collect();
        let mut copy = match node.kind {
            NodeKind::Element => XmlNode::element(name_id),
            NodeKind::Text => XmlNode::text(node.content.clone()),
            NodeKind::CData => XmlNode::cdata(node.content.clone()),
            NodeKind::Comment => XmlNode::comment(node.content.clone()),
            _ => XmlNode::processing_instruction(name_id, node.content.clone()),
        };
        copy.attributes = attributes;
        Ok(self.alloc(copy))
    }

    // ------------------------------------------------------------------
    // Paths and ordering
    // ------------------------------------------------------------------

    /// Positional absolute path of a node, e.g. `/a/b[2]/text()`
    ///
    /// Index predicates appear only where same-named siblings exist.
    pub fn node_path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.get_node(node_id) else { break };
            if node.kind == NodeKind::Document {
                break;
            }
            segments.push(self.path_segment(node_id, node));
            current = node.parent;
        }
        if segments.is_empty() {
            return "/".to_string();
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Last step of `node_path` for `id`
    pub fn step_segment(&self, id: NodeId) -> Option<String> {
        self.get_node(id).map(|node| self.path_segment(id, node))
    }

    fn path_segment(&self, id: NodeId, node: &XmlNode) -> String {
        let label = match node.kind {
            NodeKind::Element => self.strings.get_str(node.name_id).unwrap_or_default().to_string(),
            NodeKind::Text | NodeKind::CData => "text()".to_string(),
            NodeKind::Comment => "comment()".to_string(),
            NodeKind::ProcessingInstruction => format!(
                "processing-instruction('{}')",
                self.strings.get_str(node.name_id).unwrap_or_default()
            ),
            NodeKind::Document => String::new(),
        };

        let Some(parent) = node.parent else {
            return label;
        };
        let same = |other: &XmlNode| match node.kind {
            NodeKind::Element => other.kind == NodeKind::Element && other.name_id == node.name_id,
            NodeKind::Text | NodeKind::CData => other.is_text(),
            NodeKind::ProcessingInstruction => {
                other.kind == NodeKind::ProcessingInstruction && other.name_id == node.name_id
            }
            kind => other.kind == kind,
        };

        let mut position = 0;
        let mut total = 0;
        for sibling in self.children(parent) {
            let Some(other) = self.get_node(sibling) else { continue };
            if same(other) {
                total += 1;
                if sibling == id {
                    position = total;
                }
            }
        }
        if total > 1 {
            format!("{label}[{position}]")
        } else {
            label
        }
    }

    /// Document-order rank per slot; detached and free slots rank `u32::MAX`
    pub fn document_order(&self) -> Vec<u32> {
        let mut ranks = vec![u32::MAX; self.nodes.len()];
        ranks[Self::DOCUMENT as usize] = 0;
        for (rank, id) in self.descendants(Self::DOCUMENT).enumerate() {
            ranks[id as usize] = rank as u32 + 1;
        }
        ranks
    }
}

impl Default for XmlTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children
pub struct ChildIter<'t> {
    tree: &'t XmlTree,
    next: Option<NodeId>,
}

impl<'t> Iterator for ChildIter<'t> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendants (depth-first, document order)
pub struct DescendantIter<'t> {
    tree: &'t XmlTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for DescendantIter<'t> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Some(node) = self.tree.get_node(current) {
            if let Some(next) = node.next_sibling {
                self.stack.push(next);
            }
            if let Some(child) = node.first_child {
                self.stack.push(child);
            }
        }
        Some(current)
    }
}

impl DocumentAccess for XmlTree {
    fn document_node_id(&self) -> NodeId {
        Self::DOCUMENT
    }

    fn root_element_id(&self) -> Option<NodeId> {
        self.root_element()
    }

    fn node_kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.kind(id)
    }

    fn node_name(&self, id: NodeId) -> Option<&str> {
        self.name(id)
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id)
    }

    fn next_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.next_sibling
    }

    fn prev_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.prev_sibling
    }

    fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id).collect()
    }

    fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attribute(id, name)
    }

    fn get_attribute_values(&self, id: NodeId) -> Vec<(&str, &str)> {
        self.attributes(id)
    }

    fn string_value(&self, id: NodeId) -> String {
        XmlTree::string_value(self, id)
    }

    fn document_order(&self) -> Vec<u32> {
        XmlTree::document_order(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (XmlTree, NodeId, NodeId, NodeId) {
        let mut tree = XmlTree::with_root("root");
        let root = tree.root_element().unwrap();
        let a = tree.create_text_element("a", "one");
        let b = tree.create_text_element("a", "two");
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();
        (tree, root, a, b)
    }

    #[test]
    fn test_build_and_navigate() {
        let (tree, root, a, b) = sample();
        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.child_text(b), "two");
        assert_eq!(tree.string_value(root), "onetwo");
        assert_eq!(tree.child_count(root), 2);
    }

    #[test]
    fn test_node_path_positions() {
        let (mut tree, root, a, b) = sample();
        let c = tree.create_element("c");
        tree.append_child(root, c).unwrap();
        assert_eq!(tree.node_path(a), "/root/a[1]");
        assert_eq!(tree.node_path(b), "/root/a[2]");
        assert_eq!(tree.node_path(c), "/root/c");
        let text = tree.children(a).next().unwrap();
        assert_eq!(tree.node_path(text), "/root/a[1]/text()");
        assert_eq!(tree.node_path(XmlTree::DOCUMENT), "/");
    }

    #[test]
    fn test_insert_after_and_replace() {
        let (mut tree, root, a, b) = sample();
        let x = tree.create_element("x");
        tree.insert_after(a, x).unwrap();
        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, x, b]);

        let y = tree.create_element("y");
        tree.replace(x, y).unwrap();
        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, y, b]);
        assert_eq!(tree.parent(x), None);
    }

    #[test]
    fn test_remove_frees_slots() {
        let (mut tree, root, a, _) = sample();
        let before = tree.node_count();
        tree.remove(a).unwrap();
        assert_eq!(tree.node_count(), before - 2);
        assert_eq!(tree.child_count(root), 1);
        let reused = tree.create_element("z");
        assert!(reused == a || reused == a + 1);
    }

    #[test]
    fn test_cycles_rejected() {
        let (mut tree, root, a, _) = sample();
        assert!(matches!(tree.append_child(a, root), Err(TreeError::InvalidLink { .. })));
        assert!(tree.append_child(a, XmlTree::DOCUMENT).is_err());
    }

    #[test]
    fn test_import_between_trees() {
        let (source, root, _, _) = sample();
        let mut target = XmlTree::with_root("host");
        let host = target.root_element().unwrap();
        let copy = target.import_node(&source, root).unwrap();
        target.append_child(host, copy).unwrap();
        assert_eq!(target.node_path(copy), "/host/root");
        assert_eq!(target.string_value(host), "onetwo");
        // Source is untouched
        assert_eq!(source.child_count(root), 2);
    }

    #[test]
    fn test_deep_copy_within_tree() {
        let (mut tree, root, a, _) = sample();
        tree.set_attribute(a, "uID", "first").unwrap();
        let copy = tree.deep_copy(a).unwrap();
        assert_eq!(tree.parent(copy), None);
        assert_eq!(tree.attribute(copy, "uID"), Some("first"));
        assert_eq!(tree.child_text(copy), "one");
        assert_eq!(tree.child_count(root), 2);
    }

    #[test]
    fn test_attributes() {
        let (mut tree, _, a, _) = sample();
        tree.set_attribute(a, "k", "1").unwrap();
        tree.set_attribute(a, "k", "2").unwrap();
        assert_eq!(tree.attributes(a), vec![("k", "2")]);
        assert_eq!(tree.remove_attribute(a, "k"), Some("2".to_string()));
        assert_eq!(tree.attribute(a, "k"), None);
        let text = tree.children(a).next().unwrap();
        assert_eq!(tree.set_attribute(text, "k", "v"), Err(TreeError::NotAnElement(text)));
    }

    #[test]
    fn test_namespace_lookup() {
        let (mut tree, root, a, _) = sample();
        tree.set_attribute(root, "xmlns:cp", "urn:cp").unwrap();
        assert_eq!(tree.lookup_namespace(a, Some("cp")), Some("urn:cp"));
        assert_eq!(tree.lookup_namespace(a, Some("other")), None);
        assert!(tree.lookup_namespace(a, Some("xml")).is_some());
    }

    #[test]
    fn test_duplicate_has_new_identity() {
        let (tree, root, _, _) = sample();
        let copy = tree.duplicate();
        assert_ne!(copy.id(), tree.id());
        assert_eq!(copy.string_value(root), "onetwo");
    }

    #[test]
    fn test_document_order_ranks() {
        let (mut tree, root, a, b) = sample();
        let ranks = tree.document_order();
        assert!(ranks[root as usize] < ranks[a as usize]);
        assert!(ranks[a as usize] < ranks[b as usize]);
        tree.detach(b).unwrap();
        assert_eq!(tree.document_order()[b as usize], u32::MAX);
        assert!(!tree.is_attached(b));
    }
}
