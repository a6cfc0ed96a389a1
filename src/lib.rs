//! SpliceXML - handle-based XML documents with external data splicing
//!
//! Layers:
//! - `dom`: arena tree, parser and writer
//! - `xpath`: XPath 1.0 evaluation with a per-document cache
//! - `registry` / `document`: integer handles to owned documents
//! - `resolve` / `pathgen`: path expression to node and back
//! - `external`: inline `externaldata` references on load, split or drop
//!   them on save
//!
//! With the `nif` feature the crate also builds as an Erlang NIF library.

pub mod config;
pub mod document;
pub mod dom;
pub mod error;
pub mod external;
pub mod fetch;
pub mod pathgen;
pub mod registry;
pub mod resolve;
pub mod scratch;
pub mod uid;
pub mod xpath;

#[cfg(feature = "nif")]
mod nif;

use std::path::Path;

pub use config::Options;
pub use document::{Document, DocumentStatus, Point, SaveMode};
pub use error::{Error, Result};
pub use registry::{with_document, Handle};
pub use xpath::XPathValue;

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    fn record_peak(current: usize) {
        let mut peak = PEAK_ALLOCATED.load(Ordering::Relaxed);
        while current > peak {
            match PEAK_ALLOCATED.compare_exchange_weak(peak, current, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                record_peak(ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size());
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Bytes currently allocated (0 without `memory_tracking`)
pub fn rust_memory() -> usize {
    #[cfg(feature = "memory_tracking")]
    {
        tracking::ALLOCATED.load(std::sync::atomic::Ordering::SeqCst)
    }
    #[cfg(not(feature = "memory_tracking"))]
    {
        0
    }
}

/// Highest allocation level seen since the last reset
pub fn rust_memory_peak() -> usize {
    #[cfg(feature = "memory_tracking")]
    {
        tracking::PEAK_ALLOCATED.load(std::sync::atomic::Ordering::SeqCst)
    }
    #[cfg(not(feature = "memory_tracking"))]
    {
        0
    }
}

/// Reset the peak to the current level, returning (current, previous peak)
pub fn reset_rust_memory_stats() -> (usize, usize) {
    #[cfg(feature = "memory_tracking")]
    {
        use std::sync::atomic::Ordering;
        let current = tracking::ALLOCATED.load(Ordering::SeqCst);
        let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
        (current, peak)
    }
    #[cfg(not(feature = "memory_tracking"))]
    {
        (0, 0)
    }
}

// ============================================================================
// Handle API
// ============================================================================

/// Open a file and register it
pub fn open_document(path: impl AsRef<Path>) -> Result<Handle> {
    let doc = Document::open(path)?;
    registry::global().register(doc)
}

/// Open a file, inline its external data and register it
///
/// Returns the handle and the number of files inlined.
pub fn open_document_recursive(path: impl AsRef<Path>) -> Result<(Handle, usize)> {
    let mut doc = Document::open(path)?;
    let count = doc.include_external_files()?;
    Ok((registry::global().register(doc)?, count))
}

/// Register a new document with a single root element
pub fn create_document(root_name: &str) -> Result<Handle> {
    let doc = Document::create(root_name)?;
    registry::global().register(doc)
}

/// Parse `xml` and register it
pub fn import_from_string(xml: &str) -> Result<Handle> {
    let doc = Document::import_from_str(xml)?;
    registry::global().register(doc)
}

/// Unregister and release a document
pub fn close_document(handle: Handle) -> Result<()> {
    let shared = registry::global().unregister(handle)?;
    registry::lock(&shared).release();
    Ok(())
}

/// Deep-copy a document under a new handle
pub fn copy_document(handle: Handle) -> Result<Handle> {
    let copy = with_document(handle, |doc| doc.deep_copy())?;
    registry::global().register(copy)
}

/// Save with inlined external data written back to its files
pub fn save_document(handle: Handle, filename: impl AsRef<Path>) -> Result<()> {
    with_document(handle, |doc| doc.save(filename, SaveMode::Split))
}

/// Save the tree exactly as it is in memory
pub fn save_complete_document(handle: Handle, filename: impl AsRef<Path>) -> Result<()> {
    with_document(handle, |doc| doc.save(filename, SaveMode::Complete))
}

/// Save without any inlined external data
pub fn save_and_remove_document(handle: Handle, filename: impl AsRef<Path>) -> Result<()> {
    with_document(handle, |doc| doc.save(filename, SaveMode::Remove))
}

/// Text content of the node at `path`
pub fn get_text_element(handle: Handle, path: &str) -> Result<String> {
    with_document(handle, |doc| doc.text_element(path).map(str::to_string))
}
