//! Cooking recipes.
//!
//! A recipe document exercises every field shape:
//!
//! ```json
//! {
//!   "id": "content:bread",
//!   "ingredients": [{"item": "content:wheat", "count": 3}, {"item": "content:salt"}],
//!   "result": "content:bread",
//!   "count": 2,
//!   "cookingtime": 100,
//!   "experience": 0.35,
//!   "effect": {"type": "effect:fixed", "amount": 4},
//!   "rewards": [{"chance": 0.5, "effect": "effect:scaling", "stat": "stat:health", "factor": 1.2}]
//! }
//! ```
//!
//! `count` (1) and `cook_time` (200) are omitted when they hold their default,
//! `cookingtime` is accepted as a legacy spelling of `cook_time`, and an
//! absent `effect` means `effect:none`. Reward effects are merged into the
//! reward object with their discriminator under `effect`.

use std::sync::Arc;

use loader_core::{Field, Key, Record, SelfKeyed, SerdeCodec, ValueCodec, ValueCodecExt};

use crate::effects::{Effect, EffectCodecs};

/// Name of the recipe registry.
pub const RECIPE_REGISTRY: &str = "recipe";

pub const DEFAULT_COUNT: u32 = 1;
pub const DEFAULT_COOK_TIME: u32 = 200;

#[derive(Clone, Debug, PartialEq)]
pub struct Ingredient {
    pub item: Key,
    pub count: u32,
}

/// An effect granted with some probability when the recipe completes.
#[derive(Clone, Debug, PartialEq)]
pub struct Reward {
    pub chance: f32,
    pub effect: Effect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recipe {
    pub id: Key,
    pub ingredients: Vec<Ingredient>,
    pub result: Key,
    pub count: u32,
    pub cook_time: u32,
    pub experience: Option<f32>,
    pub effect: Effect,
    pub rewards: Vec<Reward>,
}

impl Recipe {
    /// Every effect the recipe can apply, rewards included.
    pub fn effects(&self) -> impl Iterator<Item = &Effect> {
        std::iter::once(&self.effect).chain(self.rewards.iter().map(|reward| &reward.effect))
    }
}

impl SelfKeyed for Recipe {
    fn self_key(&self) -> &Key {
        &self.id
    }
}

fn ingredient_codec() -> impl ValueCodec<Ingredient> + use<> {
    Record::new(
        (
            Field::required("item", SerdeCodec::new(), |i: &Ingredient| &i.item),
            Field::defaulting("count", SerdeCodec::new(), 1, false, |i: &Ingredient| {
                &i.count
            }),
        ),
        |(item, count)| Ingredient { item, count },
    )
    .strict()
}

fn reward_codec(effects: &EffectCodecs) -> impl ValueCodec<Reward> + use<> {
    Record::new(
        (
            Field::defaulting("chance", SerdeCodec::new(), 1.0, false, |r: &Reward| &r.chance),
            effects
                .variants()
                .merging_field("effect", |r: &Reward| &r.effect),
        ),
        |(chance, effect)| Reward { chance, effect },
    )
}

/// Builds the recipe schema. A strict schema rejects unknown top-level keys.
pub fn recipe_codec(effects: &EffectCodecs, strict: bool) -> Arc<dyn ValueCodec<Recipe>> {
    let record = Record::new(
        (
            Field::required("id", SerdeCodec::new(), |r: &Recipe| &r.id),
            Field::required("ingredients", ingredient_codec().list(), |r: &Recipe| {
                &r.ingredients
            }),
            Field::required("result", SerdeCodec::new(), |r: &Recipe| &r.result),
            Field::defaulting("count", SerdeCodec::new(), DEFAULT_COUNT, false, |r: &Recipe| {
                &r.count
            }),
            Field::defaulting(
                "cook_time",
                SerdeCodec::new(),
                DEFAULT_COOK_TIME,
                false,
                |r: &Recipe| &r.cook_time,
            )
            .merging("cookingtime"),
            Field::nullable("experience", SerdeCodec::new(), |r: &Recipe| &r.experience),
            effects
                .optional()
                .default_field("effect", false, |r: &Recipe| &r.effect),
            Field::defaulting(
                "rewards",
                reward_codec(effects).list(),
                Vec::new(),
                false,
                |r: &Recipe| &r.rewards,
            ),
        ),
        |(id, ingredients, result, count, cook_time, experience, effect, rewards)| Recipe {
            id,
            ingredients,
            result,
            count,
            cook_time,
            experience,
            effect,
            rewards,
        },
    );

    if strict {
        Arc::new(record.strict())
    } else {
        Arc::new(record)
    }
}
