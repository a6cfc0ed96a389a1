//! External Data Splicing
//!
//! A reference node
//!
//! ```xml
//! <externaldata>
//!   <path>data</path>
//!   <filename>sub.xml</filename>
//! </externaldata>
//! ```
//!
//! stands for the content of `data/sub.xml`. Inlining replaces it with the
//! root of that file, stamped with three restoration attributes. Splitting
//! writes stamped elements back out and rebuilds the reference node;
//! removing drops them.
//!
//! Node ids and query results do not survive a mutation here. The inline
//! loop re-queries after every reference node, and the save passes collect
//! all targets before touching the tree.

use std::fs;

use crate::document::Document;
use crate::dom::{parse_with_options, save_file, NodeId, XmlTree};
use crate::error::{Error, Result};
use crate::fetch::{self, FetchOptions};
use crate::xpath::XPathValue;

pub const EXTERNAL_DATA_NODE_NAME: &str = "externaldata";
pub const EXTERNAL_DATA_NODE_NAME_PATH: &str = "path";
pub const EXTERNAL_DATA_NODE_NAME_FILENAME: &str = "filename";

pub const EXTERNAL_DATA_XML_ATTR_NODEPATH: &str = "externalDataNodePath";
pub const EXTERNAL_DATA_XML_ATTR_FILENAME: &str = "externalFileName";
pub const EXTERNAL_DATA_XML_ATTR_DIRECTORY: &str = "externalDataDirectory";

const EXTERNAL_DATA_QUERY: &str = "//externaldata";

/// True for an element carrying all three restoration attributes
pub fn is_external_node(tree: &XmlTree, node: NodeId) -> bool {
    tree.is_element(node)
        && tree.attribute(node, EXTERNAL_DATA_XML_ATTR_NODEPATH).is_some()
        && tree.attribute(node, EXTERNAL_DATA_XML_ATTR_FILENAME).is_some()
        && tree.attribute(node, EXTERNAL_DATA_XML_ATTR_DIRECTORY).is_some()
}

/// Build an unlinked reference node with one `filename` child per name
pub fn create_external_node<S: AsRef<str>>(tree: &mut XmlTree, directory: &str, filenames: &[S]) -> Result<NodeId> {
    let node = tree.create_element(EXTERNAL_DATA_NODE_NAME);
    let path = tree.create_element(EXTERNAL_DATA_NODE_NAME_PATH);
    tree.append_child(node, path).map_err(tree_failure)?;
    if !directory.is_empty() {
        let text = tree.create_text(directory);
        tree.append_child(path, text).map_err(tree_failure)?;
    }
    for filename in filenames {
        let filename = filename.as_ref();
        let file = tree.create_element(EXTERNAL_DATA_NODE_NAME_FILENAME);
        tree.append_child(node, file).map_err(tree_failure)?;
        if !filename.is_empty() {
            let text = tree.create_text(filename);
            tree.append_child(file, text).map_err(tree_failure)?;
        }
    }
    Ok(node)
}

fn tree_failure(e: crate::dom::TreeError) -> Error {
    tracing::error!("tree mutation failed: {}", e);
    Error::Failed(e.to_string())
}

// ============================================================================
// Inline
// ============================================================================

/// Inline every reference node until none remain
///
/// Returns the number of files inlined.
pub fn include_external_files(doc: &mut Document) -> Result<usize> {
    let mut count = 0;
    loop {
        let matches = match doc.query(EXTERNAL_DATA_QUERY)? {
            XPathValue::NodeSet(nodes) => nodes,
            _ => Vec::new(),
        };
        if matches.is_empty() {
            break;
        }
        let Some(node) = matches.iter().copied().find(|&n| doc.tree().is_element(n)) else {
            doc.clear_cache();
            break;
        };
        doc.clear_cache();

        count += load_external_data_node(doc, node)?;

        let limit = doc.options().max_inlined_files;
        if count > limit {
            tracing::error!(limit, "too many external files, the document may include itself");
            return Err(Error::OpenFailed(format!("more than {limit} external files")));
        }
    }
    if count > 0 {
        doc.set_has_included_external_files(true);
        tracing::info!(count, "external files included");
    }
    Ok(count)
}

/// Replace one reference node with the content of its files
///
/// All files are fetched before the tree is touched, so a fetch failure
/// leaves the reference node in place.
fn load_external_data_node(doc: &mut Document, node: NodeId) -> Result<usize> {
    let tree = doc.tree();
    let Some(path_node) = tree.first_named_child(node, EXTERNAL_DATA_NODE_NAME_PATH) else {
        tracing::error!("no path defined in externaldata node");
        return Err(Error::OpenFailed(tree.node_path(node)));
    };
    let directory = tree.child_text(path_node);
    let filenames: Vec<String> = tree
        .named_children(node, EXTERNAL_DATA_NODE_NAME_FILENAME)
        .map(|f| tree.child_text(f))
        .collect();
    if filenames.is_empty() {
        tracing::error!("no filename nodes defined in externaldata node");
        return Err(Error::OpenFailed(tree.node_path(node)));
    }
    let parent_path = tree.parent(node).map(|p| tree.node_path(p)).unwrap_or_else(|| "/".to_string());

    let base = doc.dirname().unwrap_or_default();
    let resolved = fetch::resolve_directory(base, &directory).map_err(|e| {
        tracing::error!("cannot resolve external directory {:?}: {}", directory, e);
        Error::OpenFailed(directory.clone())
    })?;

    let options = doc.options();
    let fetch_options = FetchOptions {
        timeout: options.fetch_timeout,
        user_agent: &options.user_agent,
    };
    let mut contents = Vec::with_capacity(filenames.len());
    for filename in &filenames {
        let location = fetch::file_location(&resolved, filename).map_err(|e| {
            tracing::error!("invalid external file name {:?}: {}", filename, e);
            Error::OpenFailed(format!("{resolved}{filename}"))
        })?;
        match fetch::load_external_file(&location, &fetch_options) {
            Ok(bytes) => contents.push((filename, location, bytes)),
            Err(e) => {
                tracing::error!("error in fetching external file {:?}: {}", location, e);
                return Err(Error::OpenFailed(location));
            }
        }
    }

    let parse_options = options.parse_options();
    let data_uri = fetch::local_path_to_uri(&directory);
    let mut anchor = node;
    let mut inlined = 0;
    for (filename, location, bytes) in contents {
        let fragment = match parse_with_options(&bytes, parse_options) {
            Ok(fragment) => fragment,
            Err(e) => {
                tracing::warn!("document {} will be ignored, not a valid XML document: {}", location, e);
                continue;
            }
        };
        let Some(root) = fragment.root_element() else {
            tracing::warn!("document {} will be ignored, it has no root element", location);
            continue;
        };
        let tree = doc.tree_mut();
        let copy = tree.import_node(&fragment, root).map_err(tree_failure)?;
        tree.set_attribute(copy, EXTERNAL_DATA_XML_ATTR_FILENAME, filename)
            .map_err(tree_failure)?;
        tree.set_attribute(copy, EXTERNAL_DATA_XML_ATTR_DIRECTORY, &data_uri)
            .map_err(tree_failure)?;
        tree.set_attribute(copy, EXTERNAL_DATA_XML_ATTR_NODEPATH, &parent_path)
            .map_err(tree_failure)?;
        tree.insert_after(anchor, copy).map_err(tree_failure)?;
        anchor = copy;
        inlined += 1;
        tracing::debug!(file = %location, "external file inlined");
    }

    doc.tree_mut().remove(node).map_err(tree_failure)?;
    Ok(inlined)
}

// ============================================================================
// Save
// ============================================================================

/// Inlined elements, innermost first
fn collect_external_nodes(tree: &XmlTree) -> Vec<NodeId> {
    let mut targets: Vec<NodeId> = tree
        .descendants(XmlTree::DOCUMENT)
        .filter(|&n| is_external_node(tree, n))
        .collect();
    targets.reverse();
    targets
}

/// Inlined elements grouped by the reference node they came from, innermost
/// groups first
///
/// Adjacent siblings stamped with the same directory and node path form one
/// group. Two reference nodes that sat next to each other with the same
/// directory therefore come back as a single node listing both files.
fn collect_external_groups(tree: &XmlTree) -> Vec<Vec<NodeId>> {
    let mut groups: Vec<Vec<NodeId>> = Vec::new();
    for node in tree.descendants(XmlTree::DOCUMENT).filter(|&n| is_external_node(tree, n)) {
        let joined = tree
            .get_node(node)
            .and_then(|n| n.prev_sibling)
            .filter(|&prev| same_source(tree, prev, node))
            .and_then(|prev| groups.iter().rposition(|g| g.last() == Some(&prev)));
        match joined {
            Some(i) => groups[i].push(node),
            None => groups.push(vec![node]),
        }
    }
    groups.reverse();
    groups
}

fn same_source(tree: &XmlTree, a: NodeId, b: NodeId) -> bool {
    is_external_node(tree, a)
        && [EXTERNAL_DATA_XML_ATTR_DIRECTORY, EXTERNAL_DATA_XML_ATTR_NODEPATH]
            .iter()
            .all(|attr| tree.attribute(a, attr) == tree.attribute(b, attr))
}

/// Write every inlined element back to its file and restore the reference
/// node in its place
///
/// Elements whose directory is not on the local filesystem are not written
/// but still get their reference node back.
pub fn split_external_files(doc: &mut Document) -> Result<()> {
    let groups = collect_external_groups(doc.tree());
    let base = doc.dirname().unwrap_or_default().to_string();

    for group in groups {
        let Some((&first, rest)) = group.split_first() else {
            continue;
        };
        let tree = doc.tree_mut();
        let mut directory = String::new();
        let mut filenames = Vec::with_capacity(group.len());
        for &target in &group {
            let (dir, filename) = write_external_file(tree, &base, target)?;
            directory = dir;
            filenames.push(filename);
        }

        let reference = create_external_node(tree, &directory, filenames.as_slice())?;
        tree.replace(first, reference).map_err(tree_failure)?;
        tree.free_subtree(first);
        for &target in rest {
            tree.remove(target).map_err(tree_failure)?;
        }
    }
    Ok(())
}

/// Strip the restoration attributes from `target` and write it to its file
///
/// Returns the stored directory and file name.
fn write_external_file(tree: &mut XmlTree, base: &str, target: NodeId) -> Result<(String, String)> {
    let directory = tree
        .remove_attribute(target, EXTERNAL_DATA_XML_ATTR_DIRECTORY)
        .unwrap_or_default();
    let filename = tree
        .remove_attribute(target, EXTERNAL_DATA_XML_ATTR_FILENAME)
        .unwrap_or_default();
    tree.remove_attribute(target, EXTERNAL_DATA_XML_ATTR_NODEPATH);

    let mut standalone = XmlTree::new();
    let root = standalone.import_node(tree, target).map_err(tree_failure)?;
    standalone
        .append_child(XmlTree::DOCUMENT, root)
        .map_err(tree_failure)?;

    let resolved = fetch::resolve_directory(base, &directory).map_err(|e| {
        tracing::error!("cannot resolve external directory {:?}: {}", directory, e);
        Error::Failed(e.to_string())
    })?;
    match fetch::local_directory(&resolved) {
        Some(local) => {
            let target_file = local.join(&filename);
            fs::create_dir_all(&local)
                .and_then(|_| save_file(&standalone, &target_file, true))
                .map_err(|e| {
                    tracing::error!("failed writing external file {}: {}", target_file.display(), e);
                    Error::Failed(format!("{}: {}", target_file.display(), e))
                })?;
            tracing::debug!(file = %target_file.display(), "external file written");
        }
        None => {
            tracing::warn!("external directory {} is not local, {} not written", resolved, filename);
        }
    }
    Ok((directory, filename))
}

/// Drop every inlined element without leaving a reference behind
pub fn remove_external_files(doc: &mut Document) -> Result<()> {
    let targets = collect_external_nodes(doc.tree());
    let tree = doc.tree_mut();
    for target in targets {
        tree.remove(target).map_err(tree_failure)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::write_fragment;
    use std::path::Path;

    const HOST: &str = "<root><externaldata><path>data</path><filename>sub.xml</filename></externaldata></root>";

    fn host_in(dir: &Path, xml: &str) -> Document {
        let file = dir.join("host.xml");
        fs::write(&file, xml).unwrap();
        Document::open(&file).unwrap()
    }

    fn write_sub(dir: &Path, name: &str, xml: &str) {
        fs::create_dir_all(dir.join("data")).unwrap();
        fs::write(dir.join("data").join(name), xml).unwrap();
    }

    #[test]
    fn test_inline_stamps_restoration_attributes() {
        let dir = tempfile::tempdir().unwrap();
        write_sub(dir.path(), "sub.xml", "<payload>42</payload>");
        let mut doc = host_in(dir.path(), HOST);

        assert_eq!(include_external_files(&mut doc), Ok(1));
        assert!(doc.has_included_external_files());

        let tree = doc.tree();
        let root = tree.root_element().unwrap();
        let payload = tree.children(root).next().unwrap();
        assert_eq!(tree.name(payload), Some("payload"));
        assert_eq!(tree.child_text(payload), "42");
        assert_eq!(tree.attribute(payload, EXTERNAL_DATA_XML_ATTR_FILENAME), Some("sub.xml"));
        assert_eq!(tree.attribute(payload, EXTERNAL_DATA_XML_ATTR_DIRECTORY), Some("data"));
        assert_eq!(tree.attribute(payload, EXTERNAL_DATA_XML_ATTR_NODEPATH), Some("/root"));
        assert!(is_external_node(tree, payload));
    }

    #[test]
    fn test_split_restores_reference_node() {
        let dir = tempfile::tempdir().unwrap();
        write_sub(dir.path(), "sub.xml", "<payload>42</payload>");
        let mut doc = host_in(dir.path(), HOST);
        include_external_files(&mut doc).unwrap();
        fs::remove_file(dir.path().join("data/sub.xml")).unwrap();

        split_external_files(&mut doc).unwrap();

        let root = doc.tree().root_element().unwrap();
        assert_eq!(
            write_fragment(doc.tree(), root, false),
            "<root><externaldata><path>data</path><filename>sub.xml</filename></externaldata></root>"
        );
        let written = fs::read_to_string(dir.path().join("data/sub.xml")).unwrap();
        assert!(written.contains("<payload>42</payload>"));
        assert!(!written.contains(EXTERNAL_DATA_XML_ATTR_FILENAME));
    }

    #[test]
    fn test_inline_latin1_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(
            dir.path().join("data/sub.xml"),
            b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><payload>caf\xE9</payload>",
        )
        .unwrap();
        let mut doc = host_in(dir.path(), HOST);
        assert_eq!(include_external_files(&mut doc), Ok(1));
        assert_eq!(doc.text_element("/root/payload").unwrap(), "café");
    }

    #[test]
    fn test_missing_file_leaves_reference_node() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = host_in(dir.path(), HOST);
        let err = include_external_files(&mut doc).unwrap_err();
        assert!(matches!(err, Error::OpenFailed(_)));
        assert_eq!(crate::resolve::exists(&mut doc, "//externaldata").unwrap().len(), 1);
        assert!(!doc.has_included_external_files());
    }

    #[test]
    fn test_unparseable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_sub(dir.path(), "sub.xml", "<payload>");
        let mut doc = host_in(dir.path(), HOST);
        assert_eq!(include_external_files(&mut doc), Ok(0));
        let root = doc.tree().root_element().unwrap();
        assert_eq!(doc.tree().child_count(root), 0);
    }

    #[test]
    fn test_structural_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = host_in(dir.path(), "<r><externaldata><path>d</path></externaldata></r>");
        assert!(matches!(include_external_files(&mut doc), Err(Error::OpenFailed(_))));

        let mut doc = host_in(dir.path(), "<r><externaldata><filename>a.xml</filename></externaldata></r>");
        assert!(matches!(include_external_files(&mut doc), Err(Error::OpenFailed(_))));
    }

    #[test]
    fn test_multiple_files_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        write_sub(dir.path(), "a.xml", "<a/>");
        write_sub(dir.path(), "b.xml", "<b/>");
        let xml = "<r><x/><externaldata><path>data</path><filename>a.xml</filename>\
                   <filename>b.xml</filename></externaldata><y/></r>";
        let mut doc = host_in(dir.path(), xml);
        assert_eq!(include_external_files(&mut doc), Ok(2));
        let tree = doc.tree();
        let root = tree.root_element().unwrap();
        let names: Vec<&str> = tree.children(root).filter_map(|c| tree.name(c)).collect();
        assert_eq!(names, ["x", "a", "b", "y"]);
    }

    #[test]
    fn test_split_keeps_multi_file_reference() {
        let dir = tempfile::tempdir().unwrap();
        write_sub(dir.path(), "a.xml", "<a/>");
        write_sub(dir.path(), "b.xml", "<b/>");
        let reference = "<externaldata><path>data</path><filename>a.xml</filename>\
                         <filename>b.xml</filename></externaldata>";
        let mut doc = host_in(dir.path(), &format!("<r><x/>{reference}<y/></r>"));
        include_external_files(&mut doc).unwrap();
        fs::remove_file(dir.path().join("data/b.xml")).unwrap();

        split_external_files(&mut doc).unwrap();

        let root = doc.tree().root_element().unwrap();
        assert_eq!(write_fragment(doc.tree(), root, false), format!("<r><x/>{reference}<y/></r>"));
        assert!(fs::read_to_string(dir.path().join("data/b.xml")).unwrap().contains("<b/>"));
    }

    #[test]
    fn test_file_names_with_uri_characters() {
        let dir = tempfile::tempdir().unwrap();
        write_sub(dir.path(), "a#1.xml", "<a/>");
        write_sub(dir.path(), "50%.xml", "<b/>");
        let reference = "<externaldata><path>data</path><filename>a#1.xml</filename>\
                         <filename>50%.xml</filename></externaldata>";
        let mut doc = host_in(dir.path(), &format!("<r>{reference}</r>"));
        assert_eq!(include_external_files(&mut doc), Ok(2));
        fs::remove_file(dir.path().join("data/a#1.xml")).unwrap();

        split_external_files(&mut doc).unwrap();

        let root = doc.tree().root_element().unwrap();
        assert_eq!(write_fragment(doc.tree(), root, false), format!("<r>{reference}</r>"));
        assert!(dir.path().join("data/a#1.xml").exists());
    }

    #[test]
    fn test_nested_external_data() {
        let dir = tempfile::tempdir().unwrap();
        write_sub(
            dir.path(),
            "outer.xml",
            "<outer><externaldata><path>data</path><filename>inner.xml</filename></externaldata></outer>",
        );
        write_sub(dir.path(), "inner.xml", "<inner/>");
        let xml = "<r><externaldata><path>data</path><filename>outer.xml</filename></externaldata></r>";
        let mut doc = host_in(dir.path(), xml);
        assert_eq!(include_external_files(&mut doc), Ok(2));
        assert_eq!(crate::resolve::exists(&mut doc, "/r/outer/inner").unwrap().len(), 1);

        split_external_files(&mut doc).unwrap();
        let root = doc.tree().root_element().unwrap();
        assert_eq!(
            write_fragment(doc.tree(), root, false),
            "<r><externaldata><path>data</path><filename>outer.xml</filename></externaldata></r>"
        );
        let outer = fs::read_to_string(dir.path().join("data/outer.xml")).unwrap();
        assert!(outer.contains("<filename>inner.xml</filename>"));
    }

    #[test]
    fn test_self_inclusion_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        write_sub(
            dir.path(),
            "loop.xml",
            "<l><externaldata><path>data</path><filename>loop.xml</filename></externaldata></l>",
        );
        let xml = "<r><externaldata><path>data</path><filename>loop.xml</filename></externaldata></r>";
        let mut doc = host_in(dir.path(), xml);
        doc.options_mut().max_inlined_files = 5;
        assert!(matches!(include_external_files(&mut doc), Err(Error::OpenFailed(_))));
    }

    #[test]
    fn test_remove_drops_inlined_content() {
        let dir = tempfile::tempdir().unwrap();
        write_sub(dir.path(), "sub.xml", "<payload>42</payload>");
        let mut doc = host_in(dir.path(), HOST);
        include_external_files(&mut doc).unwrap();
        remove_external_files(&mut doc).unwrap();
        let root = doc.tree().root_element().unwrap();
        assert_eq!(write_fragment(doc.tree(), root, false), "<root/>");
    }

    #[test]
    fn test_partial_attribute_set_is_ignored() {
        let mut doc = Document::import_from_str(r#"<r><a externalFileName="f" externalDataDirectory="d"/></r>"#).unwrap();
        assert!(collect_external_nodes(doc.tree()).is_empty());
        remove_external_files(&mut doc).unwrap();
        assert_eq!(doc.tree().node_count(), 3);
    }
}
