//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references. Slots of
//! freed nodes are recycled by the tree, so an id is only meaningful until the
//! next structural mutation.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the document node and detached subtrees)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for the element name or PI target, 0 otherwise
    pub name_id: u32,
    /// Character data of text, CDATA, comment and PI nodes
    pub content: String,
    /// Attributes in document order (elements only)
    pub attributes: Vec<XmlAttribute>,
}

impl XmlNode {
    fn blank(kind: NodeKind, name_id: u32, content: String) -> Self {
        XmlNode {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id,
            content,
            attributes: Vec::new(),
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::blank(NodeKind::Document, 0, String::new())
    }

    /// Create a new, unlinked element node
    pub fn element(name_id: u32) -> Self {
        Self::blank(NodeKind::Element, name_id, String::new())
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::blank(NodeKind::Text, 0, content)
    }

    /// Create a new CDATA node
    pub fn cdata(content: String) -> Self {
        Self::blank(NodeKind::CData, 0, content)
    }

    /// Create a new comment node
    pub fn comment(content: String) -> Self {
        Self::blank(NodeKind::Comment, 0, content)
    }

    /// Create a processing instruction node
    pub fn processing_instruction(target_id: u32, data: String) -> Self {
        Self::blank(NodeKind::ProcessingInstruction, target_id, data)
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this is a text or CDATA node
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Check if this node has attributes
    #[inline]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }
}

/// Stored attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Index into string pool for the qualified attribute name
    pub name_id: u32,
    /// Attribute value, entity-decoded
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name_id: u32, value: String) -> Self {
        XmlAttribute { name_id, value }
    }
}
