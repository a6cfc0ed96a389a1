//! Erlang NIF surface
//!
//! Every call returns `{:ok, value}` or `{:error, kind}` where `kind` is the
//! snake_case name of the [`Error`] variant.

use rustler::{Atom, Env};

use crate::error::Error;
use crate::registry::Handle;
use crate::{document::SaveMode, pathgen, resolve, with_document};

rustler::atoms! {
    complete,
    split,
    remove,
    failed,
}

fn to_atom(env: Env, error: Error) -> Atom {
    Atom::from_str(env, error.name()).unwrap_or_else(|_| failed())
}

// ============================================================================
// Documents
// ============================================================================

#[rustler::nif(schedule = "DirtyIo")]
fn open_document(env: Env, path: String, recursive: bool) -> Result<Handle, Atom> {
    let opened = if recursive {
        crate::open_document_recursive(&path).map(|(handle, _)| handle)
    } else {
        crate::open_document(&path)
    };
    opened.map_err(|e| to_atom(env, e))
}

#[rustler::nif]
fn create_document(env: Env, root_name: String) -> Result<Handle, Atom> {
    crate::create_document(&root_name).map_err(|e| to_atom(env, e))
}

#[rustler::nif]
fn close_document(env: Env, handle: Handle) -> Result<Handle, Atom> {
    crate::close_document(handle)
        .map(|_| handle)
        .map_err(|e| to_atom(env, e))
}

#[rustler::nif]
fn get_text_element(env: Env, handle: Handle, path: String) -> Result<String, Atom> {
    crate::get_text_element(handle, &path).map_err(|e| to_atom(env, e))
}

/// Canonical path of the node matched by `path`
#[rustler::nif]
fn generate_path(env: Env, handle: Handle, path: String) -> Result<String, Atom> {
    with_document(handle, |doc| {
        let node = resolve::node_at(doc, &path)?;
        pathgen::generate(doc, node).map(str::to_string)
    })
    .map_err(|e| to_atom(env, e))
}

#[rustler::nif(schedule = "DirtyIo")]
fn save_document(env: Env, handle: Handle, filename: String, mode: Atom) -> Result<Handle, Atom> {
    let mode = if mode == complete() {
        SaveMode::Complete
    } else if mode == split() {
        SaveMode::Split
    } else if mode == remove() {
        SaveMode::Remove
    } else {
        return Err(failed());
    };
    with_document(handle, |doc| doc.save(&filename, mode))
        .map(|_| handle)
        .map_err(|e| to_atom(env, e))
}

// ============================================================================
// Memory Tracking
// ============================================================================

#[rustler::nif]
fn get_rust_memory() -> usize {
    crate::rust_memory()
}

#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    crate::rust_memory_peak()
}

#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    crate::reset_rust_memory_stats()
}

rustler::init!("Elixir.SpliceXML.Native");
