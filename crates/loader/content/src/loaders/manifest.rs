//! Content manifest loader.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Name of the manifest file inside a data directory.
pub const MANIFEST_FILE: &str = "content.toml";

/// Describes which files make up a content pack.
///
/// ```toml
/// namespace = "content"
/// stats = "stats.ron"
/// recipes = ["recipes/baking.ron", "recipes/soups.json"]
/// strict = true
/// ```
///
/// Paths are relative to the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentManifest {
    /// Namespace every recipe id must live in.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_stats")]
    pub stats: PathBuf,

    #[serde(default)]
    pub recipes: Vec<PathBuf>,

    /// Reject recipe documents carrying keys no field consumes.
    #[serde(default)]
    pub strict: bool,
}

fn default_namespace() -> String {
    "content".to_owned()
}

fn default_stats() -> PathBuf {
    PathBuf::from("stats.ron")
}

impl Default for ContentManifest {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            stats: default_stats(),
            recipes: Vec::new(),
            strict: false,
        }
    }
}

/// Loader for the content manifest from TOML files.
pub struct ManifestLoader;

impl ManifestLoader {
    pub fn load(path: &Path) -> LoadResult<ContentManifest> {
        let content = read_file(path)?;
        let manifest: ContentManifest = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse manifest TOML: {}", e))?;

        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let manifest: ContentManifest = toml::from_str("").unwrap();
        assert_eq!(manifest, ContentManifest::default());
    }

    #[test]
    fn parses_every_field() {
        let manifest: ContentManifest = toml::from_str(
            r#"
            namespace = "bakery"
            stats = "defs/stats.json"
            recipes = ["recipes/bread.ron", "recipes/cake.json"]
            strict = true
            "#,
        )
        .unwrap();

        assert_eq!(manifest.namespace, "bakery");
        assert_eq!(manifest.stats, PathBuf::from("defs/stats.json"));
        assert_eq!(manifest.recipes.len(), 2);
        assert!(manifest.strict);
    }

    #[test]
    fn malformed_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        std::fs::write(&path, "strict = \"yes\"").unwrap();
        let err = ManifestLoader::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse manifest TOML"));
    }
}
