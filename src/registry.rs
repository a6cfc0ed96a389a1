//! Handle Registry
//!
//! Maps small integer handles to live documents. Handles come from a
//! process-wide counter and are never reused, even after a document is
//! closed.
//!
//! Each document sits behind its own `Mutex`. The registry lock is held only
//! to look a handle up, so a long save on one document does not block work
//! on the others.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use crate::document::Document;
use crate::error::{Error, Result};

/// Opaque document handle
pub type Handle = u32;

/// A registered document, shared with in-flight calls
pub type SharedDocument = Arc<Mutex<Document>>;

static NEXT_HANDLE: AtomicU32 = AtomicU32::new(0);

static GLOBAL: LazyLock<Mutex<HandleRegistry>> = LazyLock::new(|| Mutex::new(HandleRegistry::new()));

fn next_handle() -> Handle {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed) + 1
}

/// Owning table of registered documents
#[derive(Debug, Default)]
pub struct HandleRegistry {
    documents: HashMap<Handle, SharedDocument>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `document` and assign it a fresh handle
    pub fn register(&mut self, mut document: Document) -> Result<Handle> {
        if self.documents.try_reserve(1).is_err() {
            tracing::error!("cannot register document: allocation failed");
            return Err(Error::MemoryAllocationFailed);
        }
        let handle = next_handle();
        document.set_handle(handle);
        self.documents.insert(handle, Arc::new(Mutex::new(document)));
        tracing::debug!(handle, "document registered");
        Ok(handle)
    }

    pub fn get(&self, handle: Handle) -> Option<SharedDocument> {
        self.documents.get(&handle).cloned()
    }

    /// Remove a document from the table
    ///
    /// Calls already holding the document finish first; it is dropped with
    /// the last reference.
    pub fn unregister(&mut self, handle: Handle) -> Result<SharedDocument> {
        match self.documents.remove(&handle) {
            Some(document) => {
                tracing::debug!(handle, "document unregistered");
                Ok(document)
            }
            None => {
                tracing::error!(handle, "invalid document handle");
                Err(Error::InvalidHandle(handle))
            }
        }
    }

    /// Deep-copy a registered document and register the copy
    pub fn copy_document(&mut self, handle: Handle) -> Result<Handle> {
        let shared = self.get(handle).ok_or(Error::InvalidHandle(handle))?;
        let copy = lock(&shared).deep_copy()?;
        self.register(copy)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Lock the process-wide registry
///
/// A poisoned lock is recovered: every registry operation leaves the table
/// consistent before it can panic.
pub fn global() -> MutexGuard<'static, HandleRegistry> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lock one document, recovering from a poisoned lock
pub fn lock(document: &SharedDocument) -> MutexGuard<'_, Document> {
    document.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run `f` on the document registered under `handle`
///
/// Only the document's own lock is held while `f` runs.
pub fn with_document<F, R>(handle: Handle, f: F) -> Result<R>
where
    F: FnOnce(&mut Document) -> Result<R>,
{
    let shared = global().get(handle);
    let Some(shared) = shared else {
        tracing::error!(handle, "invalid document handle");
        return Err(Error::InvalidHandle(handle));
    };
    let mut document = lock(&shared);
    f(&mut document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::create("root").unwrap()
    }

    #[test]
    fn test_handles_increase_and_are_not_reused() {
        let mut registry = HandleRegistry::new();
        let first = registry.register(doc()).unwrap();
        registry.unregister(first).unwrap();
        let second = registry.register(doc()).unwrap();
        assert!(second > first);
        assert!(first > 0);
    }

    #[test]
    fn test_lookup_matches_registration() {
        let mut registry = HandleRegistry::new();
        let handle = registry.register(doc()).unwrap();
        let shared = registry.get(handle).unwrap();
        assert_eq!(lock(&shared).handle(), Some(handle));
        let removed = registry.unregister(handle).unwrap();
        assert!(Arc::ptr_eq(&shared, &removed));
        assert!(registry.get(handle).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_unknown_handle() {
        let mut registry = HandleRegistry::new();
        assert_eq!(registry.unregister(999_999).unwrap_err(), Error::InvalidHandle(999_999));
        let handle = registry.register(doc()).unwrap();
        assert!(registry.unregister(handle + 1_000).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_copy_document_gets_new_handle() {
        let mut registry = HandleRegistry::new();
        let handle = registry.register(doc()).unwrap();
        let copy = registry.copy_document(handle).unwrap();
        assert_ne!(copy, handle);
        assert_eq!(registry.len(), 2);
        assert!(registry.copy_document(0).is_err());
    }

    #[test]
    fn test_with_document_on_global() {
        let handle = global().register(doc()).unwrap();
        let name = with_document(handle, |d| {
            let root = d.tree().root_element().ok_or(Error::RootNodeMissing)?;
            Ok(d.tree().name(root).unwrap_or_default().to_string())
        })
        .unwrap();
        assert_eq!(name, "root");
        global().unregister(handle).unwrap();
        assert!(with_document(handle, |_| Ok(())).is_err());
    }

    #[test]
    fn test_registry_usable_while_document_busy() {
        let busy = global().register(doc()).unwrap();
        let other = global().register(doc()).unwrap();
        with_document(busy, |_| {
            let copy = global().copy_document(other)?;
            with_document(copy, |d| {
                assert_eq!(d.handle(), Some(copy));
                Ok(())
            })?;
            global().unregister(copy)?;
            Ok(())
        })
        .unwrap();
        global().unregister(busy).unwrap();
        global().unregister(other).unwrap();
    }

    #[test]
    fn test_unregistered_document_outlives_in_flight_call() {
        let handle = global().register(doc()).unwrap();
        let name = with_document(handle, |d| {
            global().unregister(handle)?;
            let root = d.tree().root_element().ok_or(Error::RootNodeMissing)?;
            Ok(d.tree().name(root).unwrap_or_default().to_string())
        })
        .unwrap();
        assert_eq!(name, "root");
        assert!(global().get(handle).is_none());
    }
}
