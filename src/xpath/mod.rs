//! XPath 1.0 Engine
//!
//! XPath 1.0 over the arena tree with:
//! - All tree axes (namespace axis is empty)
//! - Core function library
//! - Per-document LRU cache of compiled expressions and results

pub mod axes;
pub mod cache;
pub mod compiler;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use cache::{XPathCache, XPathContext};
pub use compiler::{compile, CompiledExpr};
pub use eval::{evaluate, evaluate_compiled, evaluate_from_node};
pub use value::XPathValue;
