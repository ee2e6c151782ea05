//! Source persistence: lossless TOML round-trip of the configuration model.
//!
//! Writes are all-or-nothing: the complete document is rendered to a buffer
//! before anything touches the filesystem, so a failed write leaves the
//! previously persisted state intact. Creates parent directories as needed.
//!
//! Runtime state — `origin`, `writable`, the modified flag, and normalized
//! marks — is not part of the persisted form; the loader re-establishes it.
//! The document shape is `[[device]]` tables containing
//! `[[device.application]]` tables with an `options` map each.

use std::path::PathBuf;

use crate::error::DrircError;
use crate::model::ConfigSource;

/// Render a source to its persisted document form.
pub fn to_document(source: &ConfigSource) -> Result<String, DrircError> {
    toml::to_string_pretty(source).map_err(|e| DrircError::Serialize {
        path: source.origin.clone(),
        source: e,
    })
}

/// Parse a persisted document into a source rooted at `origin`.
pub fn from_document(
    origin: impl Into<PathBuf>,
    writable: bool,
    content: &str,
) -> Result<ConfigSource, DrircError> {
    let origin = origin.into();
    let mut source: ConfigSource = toml::from_str(content).map_err(|e| DrircError::Parse {
        path: origin.clone(),
        source: e,
    })?;
    source.origin = origin;
    source.writable = writable;
    Ok(source)
}

/// Read and parse one source file.
pub fn read_source(origin: impl Into<PathBuf>, writable: bool) -> Result<ConfigSource, DrircError> {
    let origin = origin.into();
    let content = std::fs::read_to_string(&origin).map_err(|e| DrircError::Io {
        path: origin.clone(),
        source: e,
    })?;
    from_document(origin, writable, &content)
}

/// Persist a source back to its origin, clearing the modified flag on
/// success. Failure leaves the in-memory model valid and still marked
/// modified-but-unsaved.
pub fn write_source(source: &mut ConfigSource) -> Result<(), DrircError> {
    let document = to_document(source)?;
    if let Some(parent) = source.origin.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| DrircError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(&source.origin, document).map_err(|e| DrircError::Io {
        path: source.origin.clone(),
        source: e,
    })?;
    source.modified = false;
    Ok(())
}

/// Load every origin that holds a readable source, in the given order.
/// Missing files are silently skipped — listing a location is a suggestion,
/// not a requirement. Unparseable files are skipped with a warning; one
/// broken file never blocks the rest of the working set.
pub fn load_sources<I>(origins: I) -> Vec<ConfigSource>
where
    I: IntoIterator<Item = (PathBuf, bool)>,
{
    let mut sources = Vec::new();
    for (origin, writable) in origins {
        match read_source(origin.clone(), writable) {
            Ok(source) => sources.push(source),
            Err(DrircError::Io { source: e, .. }) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %origin.display(), "no configuration file");
            }
            Err(err) => {
                tracing::warn!(
                    path = %origin.display(),
                    error = %err,
                    "skipping unusable configuration source"
                );
            }
        }
    }
    sources
}
