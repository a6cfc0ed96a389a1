//! Per-document XPath context and cache
//!
//! Compiled expressions depend only on the expression text and are kept
//! across mutations. Result values depend on the tree and are dropped by
//! `clear` whenever the owning document hands out mutable tree access.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::compiler::{compile, CompiledExpr};
use super::eval::evaluate_compiled;
use super::value::XPathValue;
use crate::dom::{TreeId, XmlTree};

/// Evaluation context bound to one tree
#[derive(Debug, Clone, Copy)]
pub struct XPathContext {
    tree: TreeId,
}

impl XPathContext {
    pub fn new(tree: &XmlTree) -> Self {
        XPathContext { tree: tree.id() }
    }

    pub fn is_bound_to(&self, tree: &XmlTree) -> bool {
        self.tree == tree.id()
    }

    /// Evaluate `expr` against `tree` with the document node as context
    pub fn evaluate(&self, tree: &XmlTree, cache: &mut XPathCache, expr: &str) -> Result<XPathValue, String> {
        if !self.is_bound_to(tree) {
            return Err("XPath context belongs to a different tree".to_string());
        }
        if let Some(hit) = cache.result(expr) {
            return Ok(hit);
        }
        let compiled = cache.compiled(expr)?;
        let value = evaluate_compiled(tree, &compiled, XmlTree::DOCUMENT)?;
        cache.store(expr, value.clone());
        Ok(value)
    }
}

/// LRU cache of compiled expressions and evaluation results
pub struct XPathCache {
    compiled: LruCache<String, Arc<CompiledExpr>>,
    results: LruCache<String, XPathValue>,
}

impl XPathCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        XPathCache {
            compiled: LruCache::new(capacity),
            results: LruCache::new(capacity),
        }
    }

    /// Compiled form of `expr`, compiling on a miss
    pub fn compiled(&mut self, expr: &str) -> Result<Arc<CompiledExpr>, String> {
        if let Some(hit) = self.compiled.get(expr) {
            return Ok(Arc::clone(hit));
        }
        let compiled = Arc::new(compile(expr)?);
        self.compiled.put(expr.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn result(&mut self, expr: &str) -> Option<XPathValue> {
        self.results.get(expr).cloned()
    }

    pub fn store(&mut self, expr: &str, value: XPathValue) {
        self.results.put(expr.to_string(), value);
    }

    /// Drop every cached result
    pub fn clear(&mut self) {
        self.results.clear();
    }

    /// Drop results and compiled expressions
    pub fn reset(&mut self) {
        self.results.clear();
        self.compiled.clear();
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl std::fmt::Debug for XPathCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XPathCache")
            .field("compiled", &self.compiled.len())
            .field("results", &self.results.len())
            .finish()
    }
}
