//! Error taxonomy
//!
//! Every fallible document operation returns one of these kinds. Lower layers
//! (`dom::ParseError`, `dom::TreeError`, `fetch::FetchError`, XPath strings)
//! are mapped here at the document boundary.

use crate::registry::Handle;

/// Document-level error kinds
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid document handle {0}")]
    InvalidHandle(Handle),
    #[error("invalid path expression {0:?}")]
    InvalidPath(String),
    #[error("no element matches {0:?}")]
    ElementNotFound(String),
    #[error("path {0:?} matches more than one node")]
    ElementPathNotUnique(String),
    #[error("path {0:?} does not select an element")]
    NotAnElement(String),
    #[error("no attribute name given")]
    NoAttributeName,
    #[error("attribute {name:?} not found at {path:?}")]
    AttributeNotFound { path: String, name: String },
    #[error("{0:?} is not a valid XML name")]
    InvalidXmlName(String),
    #[error("namespace prefix {0:?} is not declared")]
    InvalidNamespacePrefix(String),
    #[error("memory allocation failed")]
    MemoryAllocationFailed,
    #[error("failed to open {0}")]
    OpenFailed(String),
    #[error("failed to open schema {0}")]
    OpenSchemaFailed(String),
    #[error("document does not comply with schema {0}")]
    NotSchemaCompliant(String),
    #[error("index {index} out of range for {path:?}")]
    IndexOutOfRange { path: String, index: i64 },
    #[error("coordinate not found at {0:?}")]
    CoordinateNotFound(String),
    #[error("no point found at {0:?}")]
    NoPointFound(String),
    #[error("document has no root element")]
    RootNodeMissing,
    #[error("uID {0:?} is used more than once")]
    UidDuplicated(String),
    #[error("link target uID {0:?} does not exist")]
    UidLinkBroken(String),
    #[error("{0}")]
    Failed(String),
}

impl Error {
    /// Stable snake_case name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            Error::InvalidHandle(_) => "invalid_handle",
            Error::InvalidPath(_) => "invalid_xpath",
            Error::ElementNotFound(_) => "element_not_found",
            Error::ElementPathNotUnique(_) => "element_path_not_unique",
            Error::NotAnElement(_) => "element_is_not_an_element",
            Error::NoAttributeName => "no_attribute_name",
            Error::AttributeNotFound { .. } => "attribute_not_found",
            Error::InvalidXmlName(_) => "invalid_xml_name",
            Error::InvalidNamespacePrefix(_) => "invalid_namespace_prefix",
            Error::MemoryAllocationFailed => "memory_allocation_failed",
            Error::OpenFailed(_) => "open_failed",
            Error::OpenSchemaFailed(_) => "open_schema_failed",
            Error::NotSchemaCompliant(_) => "not_schema_compliant",
            Error::IndexOutOfRange { .. } => "index_out_of_range",
            Error::CoordinateNotFound(_) => "coordinate_not_found",
            Error::NoPointFound(_) => "no_point_found",
            Error::RootNodeMissing => "root_node_missing",
            Error::UidDuplicated(_) => "uid_duplicated",
            Error::UidLinkBroken(_) => "uid_link_broken",
            Error::Failed(_) => "failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
