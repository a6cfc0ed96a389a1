//! DOM Module - Arena-based mutable XML tree
//!
//! Implements the document representation using:
//! - Arena allocation for nodes with slot reuse
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for element/attribute names
//! - A memchr-driven parser and a two-space pretty printer

pub mod encoding;
pub mod entities;
pub mod node;
pub mod parser;
pub mod strings;
pub mod tree;
pub mod writer;

pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode};
pub use parser::{is_valid_name, parse, parse_with_options, ParseError, ParseOptions};
pub use strings::StringPool;
pub use tree::{TreeError, TreeId, XmlTree};
pub use writer::{save_file, write_document, write_fragment};

/// Read access the XPath engine evaluates against
pub trait DocumentAccess {
    /// The document node
    fn document_node_id(&self) -> NodeId;

    /// Get root element ID
    fn root_element_id(&self) -> Option<NodeId>;

    fn node_kind_of(&self, id: NodeId) -> Option<NodeKind>;

    /// Element name or PI target
    fn node_name(&self, id: NodeId) -> Option<&str>;

    /// Get node local name (without prefix)
    fn node_local_name(&self, id: NodeId) -> Option<&str> {
        let name = self.node_name(id)?;
        Some(name.rsplit_once(':').map_or(name, |(_, local)| local))
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId>;

    fn next_sibling_of(&self, id: NodeId) -> Option<NodeId>;

    fn prev_sibling_of(&self, id: NodeId) -> Option<NodeId>;

    /// Iterate over children - returns collected Vec for trait object compatibility
    fn children_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// Iterate over descendants - returns collected Vec for trait object compatibility
    fn descendants_vec(&self, id: NodeId) -> Vec<NodeId>;

    /// Get attribute value by name
    fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str>;

    /// Get all attribute names and values
    fn get_attribute_values(&self, id: NodeId) -> Vec<(&str, &str)>;

    /// XPath string-value of a node
    fn string_value(&self, id: NodeId) -> String;

    /// Document-order rank per node id
    fn document_order(&self) -> Vec<u32>;
}
