//! uID index
//!
//! Elements may carry a `uID` attribute naming them uniquely within the
//! document. Elements with an `isLink` attribute refer to another element by
//! putting its uID in their text content.

use crate::dom::{NodeId, XmlTree};
use crate::error::{Error, Result};

pub const UID_ATTRIBUTE: &str = "uID";
pub const LINK_ATTRIBUTE: &str = "isLink";

#[derive(Debug, Clone, PartialEq, Eq)]
struct UidEntry {
    uid: String,
    node: NodeId,
}

/// Snapshot of the uIDs present in a tree
///
/// Lookups check each recorded node against the tree, so elements removed or
/// renumbered since the last `read_uids` are not reported. Call `read_uids`
/// again to pick up uIDs added after the snapshot.
#[derive(Debug, Default, Clone)]
pub struct UidIndex {
    entries: Vec<UidEntry>,
}

impl UidIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from every element carrying a uID, in document order
    pub fn read_uids(&mut self, tree: &XmlTree) {
        self.entries = tree
            .descendants(XmlTree::DOCUMENT)
            .filter_map(|node| {
                tree.attribute(node, UID_ATTRIBUTE).map(|uid| UidEntry {
                    uid: uid.to_string(),
                    node,
                })
            })
            .collect();
        tracing::debug!(count = self.entries.len(), "uID index rebuilt");
    }

    /// Fail on the first uID used twice; empty uIDs only warn
    pub fn check_duplicates(&self) -> Result<()> {
        let mut warned = false;
        let mut seen = std::collections::HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if entry.uid.is_empty() {
                if !warned {
                    tracing::warn!("empty uID found, this may lead to unexpected behavior");
                    warned = true;
                }
                continue;
            }
            if !seen.insert(entry.uid.as_str()) {
                tracing::error!(uid = %entry.uid, "duplicated uID found");
                return Err(Error::UidDuplicated(entry.uid.clone()));
            }
        }
        Ok(())
    }

    /// Every element marked `isLink` must name an indexed uID
    pub fn check_links(&self, tree: &XmlTree) -> Result<()> {
        for node in tree.descendants(XmlTree::DOCUMENT) {
            if tree.attribute(node, LINK_ATTRIBUTE).is_none() {
                continue;
            }
            let target = tree.child_text(node);
            if !self.exists(tree, &target) {
                tracing::error!(uid = %target, "broken link, uID not found");
                return Err(Error::UidLinkBroken(target));
            }
        }
        Ok(())
    }

    /// Positional path of the element carrying `uid`
    pub fn path(&self, tree: &XmlTree, uid: &str) -> Option<String> {
        self.node(tree, uid).map(|n| tree.node_path(n))
    }

    /// Indexed element for `uid`, if it is still attached and still carries it
    pub fn node(&self, tree: &XmlTree, uid: &str) -> Option<NodeId> {
        self.entries
            .iter()
            .filter(|e| e.uid == uid)
            .map(|e| e.node)
            .find(|&n| tree.is_attached(n) && tree.attribute(n, UID_ATTRIBUTE) == Some(uid))
    }

    pub fn exists(&self, tree: &XmlTree, uid: &str) -> bool {
        self.node(tree, uid).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;

    fn indexed(xml: &str) -> (XmlTree, UidIndex) {
        let tree = parse(xml.as_bytes()).unwrap();
        let mut index = UidIndex::new();
        index.read_uids(&tree);
        (tree, index)
    }

    #[test]
    fn test_read_and_path() {
        let (tree, index) = indexed(r#"<r><w uID="w1"/><w uID="w2"><s uID="s1"/></w></r>"#);
        assert_eq!(index.len(), 3);
        assert!(index.exists(&tree, "s1"));
        assert!(!index.exists(&tree, "s2"));
        assert_eq!(index.path(&tree, "w2").as_deref(), Some("/r/w[2]"));
        assert_eq!(index.path(&tree, "s1").as_deref(), Some("/r/w[2]/s"));
        assert_eq!(index.path(&tree, "nope"), None);
    }

    #[test]
    fn test_duplicates() {
        let (_, index) = indexed(r#"<r><a uID="x"/><b uID="x"/></r>"#);
        assert_eq!(index.check_duplicates(), Err(Error::UidDuplicated("x".into())));

        let (_, index) = indexed(r#"<r><a uID=""/><b uID=""/><c uID="y"/></r>"#);
        assert!(index.check_duplicates().is_ok());
    }

    #[test]
    fn test_links() {
        let (tree, index) = indexed(r#"<r><a uID="w1"/><l isLink="true">w1</l></r>"#);
        assert!(index.check_links(&tree).is_ok());

        let (tree, index) = indexed(r#"<r><a uID="w1"/><l isLink="true">w9</l></r>"#);
        assert_eq!(index.check_links(&tree), Err(Error::UidLinkBroken("w9".into())));
    }

    #[test]
    fn test_reused_slot_is_not_reported() {
        let (mut tree, index) = indexed(r#"<r><a uID="x"/><b/></r>"#);
        let a = index.node(&tree, "x").unwrap();
        let b = tree.first_named_child(tree.root_element().unwrap(), "b").unwrap();
        tree.remove(a).unwrap();
        let other = tree.create_element("other");
        tree.append_child(b, other).unwrap();

        assert!(!index.exists(&tree, "x"));
        assert_eq!(index.path(&tree, "x"), None);
    }

    #[test]
    fn test_changed_uid_is_not_reported() {
        let (mut tree, index) = indexed(r#"<r><a uID="x"/></r>"#);
        let a = index.node(&tree, "x").unwrap();
        tree.set_attribute(a, UID_ATTRIBUTE, "y").unwrap();
        assert_eq!(index.node(&tree, "x"), None);
    }

    #[test]
    fn test_clear() {
        let (_, mut index) = indexed(r#"<r uID="a"/>"#);
        index.clear();
        assert!(index.is_empty());
    }
}
