//! Data-driven content built on loader-core.
//!
//! This crate defines the content schemas and provides loaders for RON/JSON data files:
//! - Effects (open polymorphic type, compact registry with a default instance)
//! - Stat types (self-keyed registry)
//! - Recipes (record schema exercising every field shape)
//! - Content packs and their binary snapshots
//!
//! Loaders (behind the `loaders` feature) read a data directory described by a
//! TOML manifest.

pub mod effects;
pub mod pack;
pub mod recipes;
pub mod stats;
pub mod sync;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use effects::{
    EFFECT_REGISTRY, Effect, EffectBehavior, EffectCodecs, FixedEffect, NoEffect, ScalingEffect,
};
pub use pack::{ContentCodecs, ContentPack, RecipeRegistry};
pub use recipes::{Ingredient, RECIPE_REGISTRY, Recipe, Reward, recipe_codec};
pub use stats::{STAT_REGISTRY, StatRegistry, StatType, build_stat_registry};
pub use sync::ContentSnapshot;

#[cfg(feature = "loaders")]
pub use loaders::{ContentFactory, ContentManifest, LoadResult, ManifestLoader, parse_document};
