//! Content factory for building content packs from data files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::effects::EffectCodecs;
use crate::loaders::manifest::MANIFEST_FILE;
use crate::loaders::{ContentManifest, LoadResult, ManifestLoader, parse_document};
use crate::pack::{ContentCodecs, ContentPack};
use crate::recipes::Recipe;
use crate::stats::{StatRegistry, StatType, build_stat_registry};

/// Content factory that loads a content pack from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── content.toml
/// ├── stats.ron
/// └── recipes/
///     ├── baking.ron
///     └── soups.json
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
    effects: Option<EffectCodecs>,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Path to the directory containing `content.toml`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            effects: None,
        }
    }

    /// Uses `effects` instead of the built-in effect registry, so documents
    /// may reference extension variants.
    pub fn with_effects(mut self, effects: EffectCodecs) -> Self {
        self.effects = Some(effects);
        self
    }

    /// Load the manifest from `content.toml`.
    pub fn load_manifest(&self) -> LoadResult<ContentManifest> {
        ManifestLoader::load(&self.data_dir.join(MANIFEST_FILE))
    }

    /// Builds the codecs the manifest asks for.
    pub fn codecs(&self, manifest: &ContentManifest) -> LoadResult<ContentCodecs> {
        let effects = match &self.effects {
            Some(effects) => effects.clone(),
            None => EffectCodecs::new().context("Failed to build effect registry")?,
        };
        Ok(ContentCodecs::with_effects(effects, manifest.strict))
    }

    /// Load and validate stat definitions.
    pub fn load_stats(&self, manifest: &ContentManifest) -> LoadResult<StatRegistry> {
        let path = self.data_dir.join(&manifest.stats);
        let doc = parse_document(&path)?;
        let stats: Vec<StatType> = serde_json::from_value(doc)
            .with_context(|| format!("Invalid stat list in {}", path.display()))?;
        build_stat_registry(stats).with_context(|| format!("Invalid stats in {}", path.display()))
    }

    /// Load every recipe file listed in the manifest, in order.
    pub fn load_recipes(
        &self,
        manifest: &ContentManifest,
        codecs: &ContentCodecs,
    ) -> LoadResult<Vec<Recipe>> {
        let mut recipes = Vec::new();
        for file in &manifest.recipes {
            let path = self.data_dir.join(file);
            let doc = parse_document(&path)?;
            let loaded = codecs
                .read_recipes(&doc)
                .with_context(|| format!("Invalid recipe document {}", path.display()))?;

            if let Some(stray) = loaded
                .iter()
                .find(|recipe| recipe.id.namespace() != manifest.namespace)
            {
                anyhow::bail!(
                    "Recipe '{}' in {} is outside namespace '{}'",
                    stray.id,
                    path.display(),
                    manifest.namespace
                );
            }

            info!(
                target: "loader::content",
                file = %path.display(),
                count = loaded.len(),
                "loaded recipes"
            );
            recipes.extend(loaded);
        }
        Ok(recipes)
    }

    /// Load the whole pack described by `content.toml`.
    pub fn load_pack(&self) -> LoadResult<ContentPack> {
        let manifest = self.load_manifest()?;
        let codecs = self.codecs(&manifest)?;
        let stats = self.load_stats(&manifest)?;
        let recipes = self.load_recipes(&manifest, &codecs)?;

        let pack = ContentPack::assemble(codecs, stats, recipes)
            .with_context(|| format!("Inconsistent content in {}", self.data_dir.display()))?;

        info!(
            target: "loader::content",
            data_dir = %self.data_dir.display(),
            namespace = %manifest.namespace,
            stats = pack.stats().len(),
            recipes = pack.recipes().len(),
            strict = manifest.strict,
            "content pack loaded"
        );

        Ok(pack)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }
}
