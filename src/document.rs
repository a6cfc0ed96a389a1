//! Documents
//!
//! A `Document` owns one tree together with the XPath context and cache
//! bound to it, the scratch pool for strings handed to callers, and the uID
//! index. All reads and writes go through path expressions resolved by
//! [`crate::resolve`].

use std::fs;
use std::path::Path;

use crate::config::Options;
use crate::dom::{is_valid_name, parse_with_options, save_file, NodeId, NodeKind, XmlTree};
use crate::error::{Error, Result};
use crate::external;
use crate::fetch::strip_dirname;
use crate::pathgen;
use crate::registry::Handle;
use crate::resolve;
use crate::scratch::{ScratchPool, Untracked};
use crate::uid::UidIndex;
use crate::xpath::{XPathCache, XPathContext, XPathValue};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Opened,
    Saved,
}

/// How external data is treated on save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Write the tree as it is in memory
    Complete,
    /// Write inlined content back to its files, keep reference nodes
    Split,
    /// Drop inlined content entirely
    Remove,
}

/// Coordinates read from a point element
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

/// An XML document with its query state
///
/// Fields drop in declaration order: scratch pool, uID index, XPath
/// context, XPath cache, tree.
#[derive(Debug)]
pub struct Document {
    scratch: ScratchPool,
    uids: UidIndex,
    xpath: XPathContext,
    cache: XPathCache,
    tree: XmlTree,
    handle: Option<Handle>,
    xml_filename: Option<String>,
    dirname: Option<String>,
    filename: Option<String>,
    validation_filename: Option<String>,
    is_valid: bool,
    status: DocumentStatus,
    pretty_print: bool,
    has_included_external_files: bool,
    options: Options,
}

impl Document {
    fn from_tree(tree: XmlTree, options: Options) -> Self {
        Document {
            scratch: ScratchPool::new(),
            uids: UidIndex::new(),
            xpath: XPathContext::new(&tree),
            cache: XPathCache::new(options.xpath_cache_capacity),
            tree,
            handle: None,
            xml_filename: None,
            dirname: None,
            filename: None,
            validation_filename: None,
            is_valid: false,
            status: DocumentStatus::Opened,
            pretty_print: options.pretty_print,
            has_included_external_files: false,
            options,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// New document holding only a root element
    pub fn create(root_name: &str) -> Result<Self> {
        Self::create_with_options(root_name, Options::from_env())
    }

    pub fn create_with_options(root_name: &str, options: Options) -> Result<Self> {
        if !is_valid_name(root_name) {
            tracing::error!("invalid root element name {:?}", root_name);
            return Err(Error::InvalidXmlName(root_name.to_string()));
        }
        Ok(Self::from_tree(XmlTree::with_root(root_name), options))
    }

    /// Read and parse a file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, Options::from_env())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        let path = path.as_ref();
        let name = path.to_string_lossy().into_owned();
        let bytes = fs::read(path).map_err(|e| {
            tracing::error!("cannot open {}: {}", name, e);
            Error::OpenFailed(name.clone())
        })?;
        let tree = parse_with_options(&bytes, options.parse_options()).map_err(|e| {
            tracing::error!("cannot parse {}: {}", name, e);
            Error::OpenFailed(name.clone())
        })?;
        let mut doc = Self::from_tree(tree, options);
        doc.dirname = Some(strip_dirname(&name));
        doc.filename = path.file_name().map(|f| f.to_string_lossy().into_owned());
        doc.xml_filename = Some(name);
        tracing::debug!(file = ?doc.xml_filename, "document opened");
        Ok(doc)
    }

    /// Open a file and inline all of its external data
    pub fn open_recursive(path: impl AsRef<Path>) -> Result<Self> {
        let mut doc = Self::open(path)?;
        doc.include_external_files()?;
        Ok(doc)
    }

    /// Parse a document held in memory
    pub fn import_from_str(xml: &str) -> Result<Self> {
        Self::import_from_str_with_options(xml, Options::from_env())
    }

    pub fn import_from_str_with_options(xml: &str, options: Options) -> Result<Self> {
        let tree = parse_with_options(xml.as_bytes(), options.parse_options()).map_err(|e| {
            tracing::error!("cannot import document from string: {}", e);
            Error::Failed(e.to_string())
        })?;
        Ok(Self::from_tree(tree, options))
    }

    /// Independent copy with a fresh query context and empty scratch state
    ///
    /// The copy is not registered.
    pub fn deep_copy(&self) -> Result<Self> {
        if self.tree.root_element().is_none() {
            tracing::error!("cannot copy document: no root element");
            return Err(Error::RootNodeMissing);
        }
        let mut copy = Self::from_tree(self.tree.duplicate(), self.options.clone());
        copy.xml_filename = self.xml_filename.clone();
        copy.dirname = self.dirname.clone();
        copy.filename = self.filename.clone();
        copy.validation_filename = self.validation_filename.clone();
        copy.is_valid = self.is_valid;
        copy.status = self.status;
        copy.pretty_print = self.pretty_print;
        copy.has_included_external_files = self.has_included_external_files;
        Ok(copy)
    }

    /// Release everything the document owns; repeated calls are no-ops
    pub fn release(&mut self) {
        self.scratch.release_all();
        self.uids.clear();
        self.cache.reset();
        self.tree = XmlTree::new();
        self.xpath = XPathContext::new(&self.tree);
        self.xml_filename = None;
        self.dirname = None;
        self.filename = None;
        self.validation_filename = None;
    }

    /// Write the document to `filename`
    ///
    /// Split and Remove work on a copy, the document itself is never
    /// changed by a save. On failure the recorded file name and status stay
    /// as they were.
    pub fn save(&mut self, filename: impl AsRef<Path>, mode: SaveMode) -> Result<()> {
        let target = filename.as_ref();
        if target.as_os_str().is_empty() {
            tracing::error!("no filename given");
            return Err(Error::Failed("no filename given".to_string()));
        }
        let name = target.to_string_lossy().into_owned();

        let written = match mode {
            SaveMode::Complete => save_file(&self.tree, target, self.pretty_print),
            SaveMode::Split => {
                let mut copy = self.deep_copy()?;
                copy.dirname = Some(strip_dirname(&name));
                copy.filename = target.file_name().map(|f| f.to_string_lossy().into_owned());
                external::split_external_files(&mut copy)?;
                save_file(copy.tree(), target, self.pretty_print)
            }
            SaveMode::Remove => {
                let mut copy = self.deep_copy()?;
                external::remove_external_files(&mut copy)?;
                save_file(copy.tree(), target, copy.pretty_print)
            }
        };
        written.map_err(|e| {
            tracing::error!("failed in writing document to {}: {}", name, e);
            Error::Failed(format!("{name}: {e}"))
        })?;

        self.xml_filename = Some(name);
        self.status = DocumentStatus::Saved;
        Ok(())
    }

    /// Inline every external data reference, returning the file count
    pub fn include_external_files(&mut self) -> Result<usize> {
        external::include_external_files(self)
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn handle(&self) -> Option<Handle> {
        self.handle
    }

    pub(crate) fn set_handle(&mut self, handle: Handle) {
        self.handle = Some(handle);
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    /// Mutable tree access; cached query results are dropped
    pub fn tree_mut(&mut self) -> &mut XmlTree {
        self.cache.clear();
        &mut self.tree
    }

    /// Evaluate a path expression with the document node as context
    pub fn query(&mut self, expr: &str) -> Result<XPathValue> {
        self.xpath
            .evaluate(&self.tree, &mut self.cache, expr)
            .map_err(|message| {
                tracing::error!("invalid XPath expression {:?}: {}", expr, message);
                Error::InvalidPath(expr.to_string())
            })
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Hand `value` to the scratch pool and return a view of it
    pub fn track(&mut self, value: String) -> Result<&str> {
        self.scratch.track(value).map_err(|Untracked(value)| {
            tracing::error!(len = value.len(), "memory allocation failed");
            Error::MemoryAllocationFailed
        })
    }

    pub fn scratch_len(&self) -> usize {
        self.scratch.len()
    }

    pub fn xml_filename(&self) -> Option<&str> {
        self.xml_filename.as_deref()
    }

    pub fn dirname(&self) -> Option<&str> {
        self.dirname.as_deref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn validation_filename(&self) -> Option<&str> {
        self.validation_filename.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn pretty_print(&self) -> bool {
        self.pretty_print
    }

    pub fn set_pretty_print(&mut self, pretty: bool) {
        self.pretty_print = pretty;
    }

    pub fn has_included_external_files(&self) -> bool {
        self.has_included_external_files
    }

    pub(crate) fn set_has_included_external_files(&mut self, included: bool) {
        self.has_included_external_files = included;
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    // ========================================================================
    // Element access
    // ========================================================================

    /// Text content of the node at `path`
    pub fn text_element(&mut self, path: &str) -> Result<&str> {
        let node = resolve::resolve_unique(self, path)?;
        let text = match self.tree.kind(node) {
            Some(NodeKind::Text) => self.tree.content(node).unwrap_or_default().to_string(),
            _ => self.tree.child_text(node),
        };
        self.track(text)
    }

    /// Value of attribute `name` on the element at `path`
    pub fn text_attribute(&mut self, path: &str, name: &str) -> Result<&str> {
        if name.is_empty() {
            tracing::error!("no attribute name specified");
            return Err(Error::NoAttributeName);
        }
        let node = resolve::resolve_unique(self, path)?;
        let Some(value) = self.tree.attribute(node, name).map(str::to_string) else {
            tracing::error!("attribute {:?} not found at {:?}", name, path);
            return Err(Error::AttributeNotFound {
                path: path.to_string(),
                name: name.to_string(),
            });
        };
        self.track(value)
    }

    /// Set attribute `name` on the element at `path`
    ///
    /// A prefixed name needs its prefix declared on the element or an
    /// ancestor.
    pub fn add_text_attribute(&mut self, path: &str, name: &str, value: &str) -> Result<()> {
        if name.is_empty() {
            tracing::error!("no attribute name specified");
            return Err(Error::NoAttributeName);
        }
        if !is_valid_name(name) {
            tracing::error!("invalid attribute name {:?}", name);
            return Err(Error::InvalidXmlName(name.to_string()));
        }
        let node = resolve::resolve_unique(self, path)?;
        if !self.tree.is_element(node) {
            tracing::error!("{:?} does not point to an element node", path);
            return Err(Error::NotAnElement(path.to_string()));
        }
        if let Some((prefix, _)) = name.split_once(':') {
            if prefix != "xmlns" && self.tree.lookup_namespace(node, Some(prefix)).is_none() {
                tracing::error!("unknown namespace prefix {:?}", prefix);
                return Err(Error::InvalidNamespacePrefix(prefix.to_string()));
            }
        }
        self.tree_mut().set_attribute(node, name, value).map_err(|e| {
            tracing::error!("failed to add attribute {:?} to {:?}: {}", name, path, e);
            Error::Failed(e.to_string())
        })
    }

    /// Number of direct children of any kind
    pub fn child_node_count(&mut self, path: &str) -> Result<usize> {
        let node = resolve::resolve_unique(self, path)?;
        Ok(self.tree.child_count(node))
    }

    /// Number of element children called `name`
    pub fn named_children_count(&mut self, path: &str, name: &str) -> Result<usize> {
        let node = resolve::resolve_unique(self, path)?;
        Ok(self.tree.named_children(node, name).count())
    }

    /// Path that resolves back to `node`, tracked in the scratch pool
    pub fn generate_path(&mut self, node: NodeId) -> Result<&str> {
        pathgen::generate(self, node)
    }

    // ========================================================================
    // Points
    // ========================================================================

    /// Coordinates of the `index`-th (1-based) element matched by `path`
    ///
    /// Missing coordinates are `None`; a point without any is `NoPointFound`.
    pub fn point(&mut self, path: &str, index: i64, ignore_missing: bool) -> Result<Point> {
        if index < 1 {
            tracing::error!(index, "invalid point index");
            return Err(Error::IndexOutOfRange {
                path: path.to_string(),
                index,
            });
        }
        let count = match resolve::exists(self, path) {
            Ok(nodes) => nodes.len(),
            Err(Error::ElementNotFound(_)) => {
                tracing::error!("no point element found at {:?}", path);
                return Err(Error::NoPointFound(path.to_string()));
            }
            Err(e) => return Err(e),
        };
        if index > count as i64 {
            tracing::error!(index, count, "index larger than number of point elements");
            return Err(Error::IndexOutOfRange {
                path: path.to_string(),
                index,
            });
        }

        let mut read = |name: &str| match self.coordinate(path, index, name) {
            Ok(value) => Some(value),
            Err(_) => {
                if !ignore_missing {
                    tracing::error!("point element {:?} has no {}-coordinate", path, name);
                }
                None
            }
        };
        let point = Point {
            x: read("x"),
            y: read("y"),
            z: read("z"),
        };
        if point.x.is_none() && point.y.is_none() && point.z.is_none() {
            return Err(Error::NoPointFound(path.to_string()));
        }
        Ok(point)
    }

    /// One coordinate child of the `index`-th point
    pub fn coordinate(&mut self, path: &str, index: i64, name: &str) -> Result<f64> {
        let coordinate_path = format!("({path})[{index}]/{name}");
        let node = resolve::resolve_unique(self, &coordinate_path)
            .map_err(|_| Error::CoordinateNotFound(coordinate_path.clone()))?;
        self.tree
            .child_text(node)
            .trim()
            .parse()
            .map_err(|_| Error::CoordinateNotFound(coordinate_path))
    }

    // ========================================================================
    // uIDs
    // ========================================================================

    /// Rebuild the uID index from the current tree
    pub fn read_uids(&mut self) {
        self.uids.read_uids(&self.tree);
    }

    pub fn check_uid_duplicates(&self) -> Result<()> {
        self.uids.check_duplicates()
    }

    pub fn check_uid_links(&self) -> Result<()> {
        self.uids.check_links(&self.tree)
    }

    /// Positional path of the element carrying `uid`, tracked
    pub fn uid_path(&mut self, uid: &str) -> Result<&str> {
        let Some(path) = self.uids.path(&self.tree, uid) else {
            tracing::error!(uid, "uID not found");
            return Err(Error::ElementNotFound(uid.to_string()));
        };
        self.track(path)
    }

    pub fn uid_exists(&self, uid: &str) -> bool {
        self.uids.exists(&self.tree, uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::write_fragment;

    #[test]
    fn test_create_and_invalid_name() {
        let doc = Document::create("plane").unwrap();
        assert_eq!(doc.status(), DocumentStatus::Opened);
        assert!(doc.pretty_print());
        assert_eq!(doc.handle(), None);
        assert_eq!(Document::create("1bad").unwrap_err(), Error::InvalidXmlName("1bad".into()));
    }

    #[test]
    fn test_open_records_names() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.xml");
        fs::write(&file, "<r/>").unwrap();
        let doc = Document::open(&file).unwrap();
        assert_eq!(doc.filename(), Some("in.xml"));
        assert_eq!(doc.dirname(), dir.path().to_str());

        assert!(matches!(Document::open(dir.path().join("none.xml")), Err(Error::OpenFailed(_))));
        fs::write(&file, "<r>").unwrap();
        assert!(matches!(Document::open(&file), Err(Error::OpenFailed(_))));
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let mut doc = Document::import_from_str("<r><a>1</a></r>").unwrap();
        doc.text_element("/r/a").unwrap();
        let mut copy = doc.deep_copy().unwrap();
        assert_eq!(copy.scratch_len(), 0);
        copy.add_text_attribute("/r/a", "k", "v").unwrap();
        assert!(doc.text_attribute("/r/a", "k").is_err());
        assert_eq!(copy.text_attribute("/r/a", "k").unwrap(), "v");

        let empty = Document::from_tree(XmlTree::new(), Options::default());
        assert_eq!(empty.deep_copy().unwrap_err(), Error::RootNodeMissing);
    }

    #[test]
    fn test_release_twice() {
        let mut doc = Document::import_from_str(r#"<r uID="x"/>"#).unwrap();
        doc.text_element("/r").unwrap();
        doc.read_uids();
        doc.release();
        doc.release();
        assert_eq!(doc.scratch_len(), 0);
        assert!(!doc.uid_exists("x"));
        assert!(doc.tree().root_element().is_none());
    }

    #[test]
    fn test_text_access() {
        let mut doc = Document::import_from_str(r#"<r><a k="v">hello</a><b/></r>"#).unwrap();
        assert_eq!(doc.text_element("/r/a").unwrap(), "hello");
        assert_eq!(doc.text_element("/r/a/text()").unwrap(), "hello");
        assert_eq!(doc.text_attribute("/r/a", "k").unwrap(), "v");
        assert_eq!(doc.text_attribute("/r/a", ""), Err(Error::NoAttributeName));
        assert_eq!(
            doc.text_attribute("/r/b", "k"),
            Err(Error::AttributeNotFound {
                path: "/r/b".into(),
                name: "k".into()
            })
        );
        assert_eq!(doc.scratch_len(), 3);
    }

    #[test]
    fn test_add_text_attribute_rules() {
        let xml = r#"<r xmlns:ns="urn:x"><a>t</a></r>"#;
        let mut doc = Document::import_from_str(xml).unwrap();
        doc.add_text_attribute("/r/a", "ns:k", "1").unwrap();
        assert_eq!(
            doc.add_text_attribute("/r/a", "zz:k", "1"),
            Err(Error::InvalidNamespacePrefix("zz".into()))
        );
        assert_eq!(doc.add_text_attribute("/r/a", "", "1"), Err(Error::NoAttributeName));
        assert_eq!(doc.add_text_attribute("/r/a", "a b", "1"), Err(Error::InvalidXmlName("a b".into())));
        assert_eq!(
            doc.add_text_attribute("/r/a/text()", "k", "1"),
            Err(Error::NotAnElement("/r/a/text()".into()))
        );
        // cached results must not hide the new attribute
        assert_eq!(doc.query("count(/r/a/@*)").unwrap(), XPathValue::Number(1.0));
        doc.add_text_attribute("/r/a", "k2", "2").unwrap();
        assert_eq!(doc.query("count(/r/a/@*)").unwrap(), XPathValue::Number(2.0));
    }

    #[test]
    fn test_child_counts() {
        let mut doc = Document::import_from_str("<r><f>a</f><f>b</f><g/>text</r>").unwrap();
        assert_eq!(doc.child_node_count("/r"), Ok(4));
        assert_eq!(doc.named_children_count("/r", "f"), Ok(2));
        assert_eq!(doc.named_children_count("/r", "h"), Ok(0));
    }

    #[test]
    fn test_point_lookup() {
        let xml = "<r><pts><point><x>1</x><y>2</y><z>3</z></point><point><x>4</x></point></pts>\
                   <one><point><x>0</x></point></one></r>";
        let mut doc = Document::import_from_str(xml).unwrap();
        assert_eq!(
            doc.point("/r/pts/point", 1, false).unwrap(),
            Point {
                x: Some(1.0),
                y: Some(2.0),
                z: Some(3.0)
            }
        );
        assert_eq!(
            doc.point("/r/pts/point", 2, true).unwrap(),
            Point {
                x: Some(4.0),
                y: None,
                z: None
            }
        );
        assert!(matches!(doc.point("/r/one/point", 2, false), Err(Error::IndexOutOfRange { .. })));
        assert!(matches!(doc.point("/r/one/point", 0, false), Err(Error::IndexOutOfRange { .. })));
        assert!(matches!(doc.point("/r/none/point", 1, false), Err(Error::NoPointFound(_))));
    }

    #[test]
    fn test_point_without_coordinates() {
        let mut doc = Document::import_from_str("<r><point><w>1</w></point></r>").unwrap();
        assert!(matches!(doc.point("/r/point", 1, true), Err(Error::NoPointFound(_))));
        assert!(matches!(doc.coordinate("/r/point", 1, "x"), Err(Error::CoordinateNotFound(_))));
    }

    #[test]
    fn test_uid_operations() {
        let mut doc = Document::import_from_str(r#"<r><a uID="one"/><l isLink="1">one</l></r>"#).unwrap();
        doc.read_uids();
        assert!(doc.uid_exists("one"));
        assert_eq!(doc.uid_path("one").unwrap(), "/r/a");
        assert!(doc.check_uid_duplicates().is_ok());
        assert!(doc.check_uid_links().is_ok());
        assert!(doc.uid_path("two").is_err());
    }

    #[test]
    fn test_uid_lookup_after_removal() {
        let mut doc = Document::import_from_str(r#"<r><a uID="x"/><b/></r>"#).unwrap();
        doc.read_uids();
        let a = resolve::resolve_unique(&mut doc, "/r/a").unwrap();
        let b = resolve::resolve_unique(&mut doc, "/r/b").unwrap();
        let tree = doc.tree_mut();
        tree.remove(a).unwrap();
        let other = tree.create_element("other");
        tree.append_child(b, other).unwrap();

        assert!(!doc.uid_exists("x"));
        assert!(matches!(doc.uid_path("x"), Err(Error::ElementNotFound(_))));
    }

    #[test]
    fn test_save_complete_records_state() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.xml");
        let mut doc = Document::import_from_str("<r><a/></r>").unwrap();
        doc.save(&target, SaveMode::Complete).unwrap();
        assert_eq!(doc.status(), DocumentStatus::Saved);
        assert_eq!(doc.xml_filename(), target.to_str());
        let written = fs::read_to_string(&target).unwrap();
        assert_eq!(written, "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<r>\n  <a/>\n</r>\n");
    }

    #[test]
    fn test_failed_save_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::import_from_str("<r/>").unwrap();
        let bad = dir.path().join("missing").join("out.xml");
        assert!(matches!(doc.save(&bad, SaveMode::Complete), Err(Error::Failed(_))));
        assert_eq!(doc.status(), DocumentStatus::Opened);
        assert_eq!(doc.xml_filename(), None);
        assert!(doc.save("", SaveMode::Complete).is_err());
    }

    #[test]
    fn test_split_save_leaves_live_tree_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/sub.xml"), "<payload>42</payload>").unwrap();
        let host = dir.path().join("host.xml");
        fs::write(
            &host,
            "<root><externaldata><path>data</path><filename>sub.xml</filename></externaldata></root>",
        )
        .unwrap();

        let mut doc = Document::open_recursive(&host).unwrap();
        let out_dir = dir.path().join("out");
        fs::create_dir_all(&out_dir).unwrap();
        doc.set_pretty_print(false);
        doc.save(out_dir.join("saved.xml"), SaveMode::Split).unwrap();

        let saved = fs::read_to_string(out_dir.join("saved.xml")).unwrap();
        assert!(saved.contains("<externaldata><path>data</path><filename>sub.xml</filename></externaldata>"));
        let sub = fs::read_to_string(out_dir.join("data/sub.xml")).unwrap();
        assert!(sub.contains("<payload>42</payload>"));

        let root = doc.tree().root_element().unwrap();
        assert!(write_fragment(doc.tree(), root, false).starts_with("<root><payload"));

        doc.save(out_dir.join("removed.xml"), SaveMode::Remove).unwrap();
        let removed = fs::read_to_string(out_dir.join("removed.xml")).unwrap();
        assert!(removed.contains("<root/>"));
    }
}
