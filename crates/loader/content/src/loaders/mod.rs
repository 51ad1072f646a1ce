//! Loaders that read content packs from a data directory.
//!
//! Documents may be written as JSON (`.json`) or RON (`.ron`); both are parsed
//! into a [`serde_json::Value`] tree before the codecs see them, so every
//! schema accepts either syntax.

pub mod factory;
pub mod manifest;

pub use factory::ContentFactory;
pub use manifest::{ContentManifest, ManifestLoader};

use std::path::Path;

use serde_json::Value;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

/// Reads a JSON or RON document, picked by file extension.
pub fn parse_document(path: &Path) -> LoadResult<Value> {
    let content = read_file(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse JSON at {}: {}", path.display(), e)),
        Some("ron") => ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse RON at {}: {}", path.display(), e)),
        _ => anyhow::bail!(
            "Unsupported document format {} (expected .json or .ron)",
            path.display()
        ),
    }
}
