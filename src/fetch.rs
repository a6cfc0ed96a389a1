//! Resource Fetching
//!
//! External data lives either on the local filesystem (plain paths or
//! `file://` URIs) or behind a remote URI. Directories are carried around as
//! URI strings ending in `/`; file names are added with `file_location`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

/// Failure to locate or read a resource
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("cannot read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid location {0:?}")]
    InvalidLocation(String),
    #[error("fetching {location} failed: {message}")]
    Remote { location: String, message: String },
    #[error("remote fetching is disabled, cannot load {0}")]
    RemoteDisabled(String),
}

/// Settings for remote fetches
#[derive(Debug, Clone)]
pub struct FetchOptions<'a> {
    pub timeout: Duration,
    pub user_agent: &'a str,
}

/// True when `location` starts with a URI scheme such as `file://`
///
/// Single-letter schemes are rejected so Windows drive paths stay local.
pub fn is_uri(location: &str) -> bool {
    let Some(end) = location.find("://") else {
        return false;
    };
    let scheme = &location[..end];
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub fn is_file_uri(location: &str) -> bool {
    location.starts_with("file://")
}

/// Convert a `file://` URI into a local path
pub fn uri_to_local_path(uri: &str) -> Option<PathBuf> {
    Url::parse(uri).ok()?.to_file_path().ok()
}

/// URI reference for a directory as written in a reference node
///
/// URIs are kept, absolute paths become `file://` URIs and relative paths stay
/// relative with `/` separators.
pub fn local_path_to_uri(path: &str) -> String {
    if is_uri(path) {
        return path.to_string();
    }
    let as_path = Path::new(path);
    if as_path.is_absolute() {
        let url = if path.ends_with('/') || path.ends_with('\\') {
            Url::from_directory_path(as_path)
        } else {
            Url::from_file_path(as_path)
        };
        if let Ok(url) = url {
            return url.to_string();
        }
    }
    path.replace('\\', "/")
}

fn directory_url(dir: &Path) -> Result<Url, FetchError> {
    let absolute = std::path::absolute(dir).map_err(|source| FetchError::Io {
        location: dir.display().to_string(),
        source,
    })?;
    Url::from_directory_path(&absolute).map_err(|_| FetchError::InvalidLocation(dir.display().to_string()))
}

/// Resolve `dir` against the document directory `base_dir`
///
/// Returns an absolute URI ending in `/`. `base_dir` may itself be a path or
/// a URI; an empty base means the working directory.
pub fn resolve_directory(base_dir: &str, dir: &str) -> Result<String, FetchError> {
    let mut dir = dir.trim().replace('\\', "/");
    if !dir.ends_with('/') {
        dir.push('/');
    }
    let resolved = if is_uri(&dir) {
        Url::parse(&dir).map_err(|_| FetchError::InvalidLocation(dir.clone()))?
    } else if Path::new(&dir).is_absolute() {
        directory_url(Path::new(&dir))?
    } else {
        let base = if is_uri(base_dir) {
            let mut base = base_dir.to_string();
            if !base.ends_with('/') {
                base.push('/');
            }
            Url::parse(&base).map_err(|_| FetchError::InvalidLocation(base.clone()))?
        } else if base_dir.is_empty() {
            directory_url(Path::new("."))?
        } else {
            directory_url(Path::new(base_dir))?
        };
        base.join(&dir).map_err(|_| FetchError::InvalidLocation(dir.clone()))?
    };
    Ok(resolved.to_string())
}

/// Location of `filename` inside a resolved directory URI
///
/// The name is appended as path segments, so characters such as `#` or `%`
/// stay part of the file name.
pub fn file_location(resolved: &str, filename: &str) -> Result<String, FetchError> {
    let invalid = || FetchError::InvalidLocation(format!("{resolved}{filename}"));
    let mut url = Url::parse(resolved).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(filename.split('/'));
    Ok(url.to_string())
}

/// Local directory of a resolved directory URI, if it has one
pub fn local_directory(resolved: &str) -> Option<PathBuf> {
    if is_file_uri(resolved) {
        uri_to_local_path(resolved)
    } else {
        None
    }
}

/// Directory part of a file name, without a trailing separator
pub fn strip_dirname(filename: &str) -> String {
    Path::new(filename)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read a local path, `file://` URI or remote URI as raw bytes
pub fn load_external_file(location: &str, options: &FetchOptions<'_>) -> Result<Vec<u8>, FetchError> {
    if !is_uri(location) {
        return read_local(Path::new(location), location);
    }
    if is_file_uri(location) {
        let path = uri_to_local_path(location).ok_or_else(|| FetchError::InvalidLocation(location.to_string()))?;
        return read_local(&path, location);
    }
    fetch_remote(location, options)
}

fn read_local(path: &Path, location: &str) -> Result<Vec<u8>, FetchError> {
    fs::read(path).map_err(|source| FetchError::Io {
        location: location.to_string(),
        source,
    })
}

#[cfg(feature = "remote")]
fn fetch_remote(location: &str, options: &FetchOptions<'_>) -> Result<Vec<u8>, FetchError> {
    use std::io::Read;

    tracing::debug!(location, "fetching remote resource");
    let agent = ureq::AgentBuilder::new()
        .timeout(options.timeout)
        .user_agent(options.user_agent)
        .build();
    let response = agent.get(location).call().map_err(|e| FetchError::Remote {
        location: location.to_string(),
        message: e.to_string(),
    })?;
    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|source| FetchError::Io {
            location: location.to_string(),
            source,
        })?;
    Ok(body)
}

#[cfg(not(feature = "remote"))]
fn fetch_remote(location: &str, _options: &FetchOptions<'_>) -> Result<Vec<u8>, FetchError> {
    Err(FetchError::RemoteDisabled(location.to_string()))
}
