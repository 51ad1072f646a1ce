//! Assembled content: stats and recipes plus the codecs that read them.

use std::sync::Arc;

use loader_core::{CodecError, IdAwareRegistry, Key, ListCodec, ValueCodec};
use serde_json::Value;
use tracing::debug;

use crate::effects::EffectCodecs;
use crate::recipes::{RECIPE_REGISTRY, Recipe, recipe_codec};
use crate::stats::StatRegistry;

/// Registered recipes, keyed by their id.
pub type RecipeRegistry = IdAwareRegistry<Arc<Recipe>>;

/// Every codec a content pack needs, built once and shared.
#[derive(Clone)]
pub struct ContentCodecs {
    effects: EffectCodecs,
    recipe: Arc<dyn ValueCodec<Recipe>>,
}

impl ContentCodecs {
    /// Codecs over the built-in effect variants.
    pub fn new(strict: bool) -> loader_core::Result<Self> {
        Ok(Self::with_effects(EffectCodecs::new()?, strict))
    }

    /// Codecs over an effect registry that may carry extension variants.
    pub fn with_effects(effects: EffectCodecs, strict: bool) -> Self {
        let recipe = recipe_codec(&effects, strict);
        Self { effects, recipe }
    }

    pub fn effects(&self) -> &EffectCodecs {
        &self.effects
    }

    pub fn recipe(&self) -> &Arc<dyn ValueCodec<Recipe>> {
        &self.recipe
    }

    /// Reads a recipe document: either one recipe object or an array of them.
    pub fn read_recipes(&self, doc: &Value) -> loader_core::Result<Vec<Recipe>> {
        match doc {
            Value::Array(_) => ListCodec::new(Arc::clone(&self.recipe)).read(doc),
            single => self.recipe.read(single).map(|recipe| vec![recipe]),
        }
    }
}

/// Stats and recipes that passed every cross-check.
pub struct ContentPack {
    codecs: ContentCodecs,
    stats: StatRegistry,
    recipes: RecipeRegistry,
}

impl ContentPack {
    /// Registers `recipes` and checks that every stat their effects scale
    /// with is registered in `stats`.
    pub fn assemble(
        codecs: ContentCodecs,
        stats: StatRegistry,
        recipes: impl IntoIterator<Item = Recipe>,
    ) -> loader_core::Result<Self> {
        let mut registry = RecipeRegistry::new(RECIPE_REGISTRY);
        let mut errors = Vec::new();
        for recipe in recipes {
            let recipe = registry.register(Arc::new(recipe))?;
            errors.extend(dangling_stats(recipe, &stats));
        }
        if !errors.is_empty() {
            return Err(CodecError::from_many(errors));
        }

        debug!(
            target: "loader::content",
            stats = stats.len(),
            recipes = registry.len(),
            "assembled content pack"
        );

        Ok(Self {
            codecs,
            stats,
            recipes: registry,
        })
    }

    pub fn codecs(&self) -> &ContentCodecs {
        &self.codecs
    }

    pub fn stats(&self) -> &StatRegistry {
        &self.stats
    }

    pub fn recipes(&self) -> &RecipeRegistry {
        &self.recipes
    }

    pub fn recipe(&self, id: &Key) -> Option<&Arc<Recipe>> {
        self.recipes.get(id)
    }
}

fn dangling_stats(recipe: &Recipe, stats: &StatRegistry) -> Vec<CodecError> {
    recipe
        .effects()
        .filter_map(|effect| effect.stat())
        .filter(|stat| stats.get(stat).is_none())
        .map(|stat| {
            CodecError::InvalidValue(format!(
                "recipe '{}' scales with unregistered stat '{}'",
                recipe.id, stat
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::stats::{StatType, build_stat_registry};

    fn health() -> StatType {
        StatType {
            key: Key::parse("stat:health").unwrap(),
            min: 0.0,
            max: 20.0,
            default: 20.0,
        }
    }

    fn stew(stat: &str) -> Value {
        json!({
            "id": "content:stew",
            "ingredients": [{"item": "content:carrot", "count": 2}],
            "result": "content:stew",
            "effect": {"type": "effect:scaling", "stat": stat, "factor": 0.5}
        })
    }

    #[test]
    fn reads_one_recipe_or_a_list() {
        let codecs = ContentCodecs::new(true).unwrap();
        assert_eq!(codecs.read_recipes(&stew("stat:health")).unwrap().len(), 1);

        let recipes = codecs
            .read_recipes(&json!([stew("stat:health"), stew("stat:mana")]))
            .unwrap();
        assert_eq!(recipes.len(), 2);
    }

    #[test]
    fn list_errors_carry_the_recipe_index() {
        let codecs = ContentCodecs::new(true).unwrap();
        let err = codecs
            .read_recipes(&json!([stew("stat:health"), {"id": "content:bad"}]))
            .unwrap_err();
        assert_eq!(err.path().map(ToString::to_string), Some("1".into()));
    }

    #[test]
    fn assembles_a_consistent_pack() {
        let codecs = ContentCodecs::new(true).unwrap();
        let recipes = codecs.read_recipes(&stew("stat:health")).unwrap();
        let stats = build_stat_registry([health()]).unwrap();

        let pack = ContentPack::assemble(codecs, stats, recipes).unwrap();
        let stew = pack.recipe(&Key::parse("content:stew").unwrap()).unwrap();
        assert_eq!(stew.count, 1);
        assert_eq!(pack.recipes().len(), 1);
    }

    #[test]
    fn rejects_effects_scaling_with_unknown_stats() {
        let codecs = ContentCodecs::new(true).unwrap();
        let recipes = codecs.read_recipes(&stew("stat:mana")).unwrap();
        let stats = build_stat_registry([health()]).unwrap();

        let err = ContentPack::assemble(codecs, stats, recipes).err().unwrap();
        assert_eq!(
            err.to_string(),
            "invalid value: recipe 'content:stew' scales with unregistered stat 'stat:mana'"
        );
    }

    #[test]
    fn rejects_duplicate_recipe_ids() {
        let codecs = ContentCodecs::new(true).unwrap();
        let mut recipes = codecs.read_recipes(&stew("stat:health")).unwrap();
        recipes.push(recipes[0].clone());
        let stats = build_stat_registry([health()]).unwrap();

        let err = ContentPack::assemble(codecs, stats, recipes).err().unwrap();
        assert!(matches!(err, CodecError::DuplicateKey { .. }));
    }
}
