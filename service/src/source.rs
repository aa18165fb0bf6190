//! Reading documents and schemas by URL

use schemadiag_core::config::SchemaConfig;
use schemadiag_core::{DiagnosticsError, Result};
use std::path::Path;
use url::Url;

/// Read the full contents behind a URL
///
/// # Errors
///
/// Returns an error for non-`file` schemes and for any I/O failure.
pub fn read_url(url: &Url) -> Result<Vec<u8>> {
    if url.scheme() != "file" {
        return Err(DiagnosticsError::UnsupportedScheme(url.scheme().to_string()));
    }
    let path = url
        .to_file_path()
        .map_err(|()| DiagnosticsError::invalid_url(url.as_str(), "not a local file path"))?;
    Ok(std::fs::read(path)?)
}

/// Turn a filesystem path into a `file:` URL
///
/// # Errors
///
/// Returns an error if the path does not exist.
pub fn path_to_url(path: impl AsRef<Path>) -> Result<Url> {
    let path = path.as_ref();
    let absolute = path.canonicalize()?;
    Url::from_file_path(&absolute)
        .map_err(|()| DiagnosticsError::invalid_url(path.display().to_string(), "not absolute"))
}

/// Every file in `dir` with the configured schema extension, sorted by file name
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn schema_urls_in(dir: impl AsRef<Path>, config: &SchemaConfig) -> Result<Vec<Url>> {
    let extension = config.extension.trim_start_matches('.');
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            paths.push(path);
        }
    }
    paths.sort();
    paths.iter().map(path_to_url).collect()
}

/// The last path segment of a URL, used to name a document in messages
#[must_use]
pub fn document_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back().map(str::to_string))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| url.to_string())
}
