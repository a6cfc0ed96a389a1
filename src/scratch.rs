//! Per-document scratch allocations
//!
//! Strings handed back to callers (generated paths, element text, attribute
//! values) are owned here so their lifetime follows the document rather than
//! the call.

/// A payload the pool could not take ownership of
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("scratch pool could not reserve an entry")]
pub struct Untracked(pub String);

/// Owned strings released together with their document
#[derive(Debug, Default)]
pub struct ScratchPool {
    entries: Vec<Box<str>>,
}

impl ScratchPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `value` and return a view tied to the pool
    ///
    /// If no entry can be reserved the value is handed back untouched.
    pub fn track(&mut self, value: String) -> Result<&str, Untracked> {
        if self.entries.try_reserve(1).is_err() {
            return Err(Untracked(value));
        }
        self.entries.push(value.into_boxed_str());
        Ok(self.entries.last().map(|entry| &**entry).unwrap_or_default())
    }

    /// Drop every tracked string; a no-op on an empty pool
    pub fn release_all(&mut self) {
        self.entries.clear();
        self.entries.shrink_to_fit();
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

    #[test]
    fn test_track_returns_view() {
        let mut pool = ScratchPool::new();
        let view = pool.track("/root/a".to_string()).unwrap();
        assert_eq!(view, "/root/a");
        pool.track(String::new()).unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut pool = ScratchPool::new();
        pool.release_all();
        pool.track("x".to_string()).unwrap();
        pool.release_all();
        assert!(pool.is_empty());
        pool.release_all();
        assert!(pool.is_empty());
    }
}
