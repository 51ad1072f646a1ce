//! Effect descriptors attached to recipes and rewards.
//!
//! `Effect` is an open abstract type: each variant is a struct implementing
//! [`EffectBehavior`] that points at its own [`Loader`]. The built-in variants
//! live in a compact registry named `effect`:
//!
//! ```text
//! {"type": "effect:fixed", "amount": 5}
//! {"type": "effect:scaling", "stat": "stat:health", "factor": 1.5}
//! "effect:none"
//! ```
//!
//! `effect:none` doubles as the default instance of the defaulting registry,
//! so recipes without an effect serialize as nothing at all.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock};

use loader_core::{
    DefaultingRegistry, Field, InstanceIdentity, Key, Loader, PolymorphicRegistry,
    PolymorphicRegistryBuilder, Record, RecordVariant, SelfDescribing, SerdeCodec, UnitVariant,
};

/// Behaviour of one effect variant.
pub trait EffectBehavior: Any + fmt::Debug + Send + Sync {
    /// Loader of the variant; must be registered in the effect registry.
    fn loader(&self) -> &Loader<Effect>;

    /// Applies the effect to `value`.
    fn apply(&self, value: f64) -> f64;

    /// Stat the effect scales with, if any.
    fn stat(&self) -> Option<&Key> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn eq_dyn(&self, other: &dyn EffectBehavior) -> bool;
}

/// Shared handle to an effect variant.
#[derive(Clone)]
pub struct Effect(Arc<dyn EffectBehavior>);

impl Effect {
    pub fn new(behavior: impl EffectBehavior) -> Self {
        Self(Arc::new(behavior))
    }

    /// The `effect:none` singleton.
    pub fn none() -> Self {
        NONE.clone()
    }

    pub fn behavior(&self) -> &dyn EffectBehavior {
        self.0.as_ref()
    }

    pub fn downcast_ref<B: EffectBehavior>(&self) -> Option<&B> {
        self.0.as_any().downcast_ref()
    }

    pub fn apply(&self, value: f64) -> f64 {
        self.0.apply(value)
    }

    pub fn stat(&self) -> Option<&Key> {
        self.0.stat()
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(other.0.as_ref())
    }
}

impl SelfDescribing for Effect {
    fn loader(&self) -> &Loader<Self> {
        self.0.loader()
    }
}

impl InstanceIdentity for Effect {
    fn same_instance(&self, other: &Self) -> bool {
        self.0.same_instance(&other.0)
    }
}

macro_rules! effect_behavior {
    ($ty:ty, $loader:ident) => {
        fn loader(&self) -> &Loader<Effect> {
            &$loader
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn eq_dyn(&self, other: &dyn EffectBehavior) -> bool {
            other.as_any().downcast_ref::<$ty>() == Some(self)
        }
    };
}

/// Adds a flat amount.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedEffect {
    pub amount: i64,
}

impl EffectBehavior for FixedEffect {
    effect_behavior!(FixedEffect, FIXED);

    fn apply(&self, value: f64) -> f64 {
        value + self.amount as f64
    }
}

/// Multiplies by `factor`, scaled by a stat.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalingEffect {
    pub stat: Key,
    pub factor: f64,
}

impl EffectBehavior for ScalingEffect {
    effect_behavior!(ScalingEffect, SCALING);

    fn apply(&self, value: f64) -> f64 {
        value * self.factor
    }

    fn stat(&self) -> Option<&Key> {
        Some(&self.stat)
    }
}

/// Does nothing. Only one instance exists, see [`Effect::none`].
#[derive(Clone, Debug, PartialEq)]
pub struct NoEffect;

impl EffectBehavior for NoEffect {
    effect_behavior!(NoEffect, NONE_LOADER);

    fn apply(&self, value: f64) -> f64 {
        value
    }
}

static FIXED: LazyLock<Loader<Effect>> = LazyLock::new(|| {
    Loader::new(RecordVariant::new(
        Record::new(
            (Field::required("amount", SerdeCodec::new(), |e: &FixedEffect| &e.amount),),
            |(amount,)| FixedEffect { amount },
        ),
        Effect::new,
        Effect::downcast_ref,
    ))
});

static SCALING: LazyLock<Loader<Effect>> = LazyLock::new(|| {
    Loader::new(RecordVariant::new(
        Record::new(
            (
                Field::required("stat", SerdeCodec::new(), |e: &ScalingEffect| &e.stat),
                Field::defaulting("factor", SerdeCodec::new(), 1.0, false, |e: &ScalingEffect| {
                    &e.factor
                }),
            ),
            |(stat, factor)| ScalingEffect { stat, factor },
        ),
        Effect::new,
        Effect::downcast_ref,
    ))
});

static NONE_LOADER: LazyLock<Loader<Effect>> =
    LazyLock::new(|| Loader::new(UnitVariant::new(Effect::none)));

static NONE: LazyLock<Effect> = LazyLock::new(|| Effect::new(NoEffect));

/// Name of the effect registry; also the namespace of the built-in variants.
pub const EFFECT_REGISTRY: &str = "effect";

/// The effect registries shared by every schema that embeds effects.
#[derive(Clone)]
pub struct EffectCodecs {
    variants: Arc<PolymorphicRegistry<Effect>>,
    optional: Arc<DefaultingRegistry<Effect>>,
}

impl EffectCodecs {
    /// Registry builder with the built-in variants already registered.
    ///
    /// Extensions register their own variants on the returned builder before
    /// passing it to [`EffectCodecs::from_builder`].
    pub fn builder() -> loader_core::Result<PolymorphicRegistryBuilder<Effect>> {
        let mut builder = PolymorphicRegistry::builder(EFFECT_REGISTRY).compact();
        builder
            .register_local("fixed", FIXED.clone())?
            .register_local("scaling", SCALING.clone())?
            .register_local("none", NONE_LOADER.clone())?;
        Ok(builder)
    }

    pub fn new() -> loader_core::Result<Self> {
        Ok(Self::from_builder(Self::builder()?))
    }

    pub fn from_builder(builder: PolymorphicRegistryBuilder<Effect>) -> Self {
        let variants = Arc::new(builder.build());
        let optional = Arc::new(DefaultingRegistry::new(
            Arc::clone(&variants),
            Effect::none(),
        ));
        Self { variants, optional }
    }

    /// Every effect, `effect:none` included, dispatched by discriminator.
    pub fn variants(&self) -> &Arc<PolymorphicRegistry<Effect>> {
        &self.variants
    }

    /// Effects where `effect:none` stands for "absent".
    pub fn optional(&self) -> &Arc<DefaultingRegistry<Effect>> {
        &self.optional
    }
}

#[cfg(test)]
mod tests {
    use loader_core::{CodecError, WireReader, WireWriter};
    use serde_json::{Value, json};

    use super::*;

    fn scaling(stat: &str, factor: f64) -> Effect {
        Effect::new(ScalingEffect {
            stat: Key::parse(stat).unwrap(),
            factor,
        })
    }

    #[test]
    fn built_in_variants_use_the_effect_namespace() {
        let codecs = EffectCodecs::new().unwrap();
        let keys: Vec<_> = codecs
            .variants()
            .codecs()
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, ["effect:fixed", "effect:scaling", "effect:none"]);
    }

    #[test]
    fn scaling_factor_defaults_to_one() {
        let codecs = EffectCodecs::new().unwrap();
        let effect = codecs
            .variants()
            .convert(&json!({"type": "effect:scaling", "stat": "stat:health"}), "test")
            .unwrap();
        assert_eq!(effect, scaling("stat:health", 1.0));
        assert_eq!(effect.stat().map(Key::path), Some("health"));

        let doc = codecs.variants().serialize(&effect).unwrap();
        assert_eq!(doc, json!({"type": "effect:scaling", "stat": "stat:health"}));
    }

    #[test]
    fn unknown_effect_is_rejected() {
        let codecs = EffectCodecs::new().unwrap();
        let err = codecs
            .optional()
            .convert(&json!({"type": "effect:heal", "amount": 1}), "recipes.json")
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownVariant { ref key, .. } if key == "effect:heal"));
    }

    #[test]
    fn none_is_the_default_instance() {
        let codecs = EffectCodecs::new().unwrap();
        let none = Effect::none();
        assert_eq!(codecs.variants().serialize(&none).unwrap(), json!("effect:none"));
        assert_eq!(codecs.optional().serialize(&none).unwrap(), Value::Null);

        let read = codecs
            .optional()
            .convert(&json!("effect:none"), "test")
            .unwrap();
        assert!(read.same_instance(&none));
        assert_eq!(read.apply(3.0), 3.0);
    }

    #[test]
    fn a_fresh_no_effect_is_equal_but_not_the_default() {
        let codecs = EffectCodecs::new().unwrap();
        let other = Effect::new(NoEffect);
        assert_eq!(other, Effect::none());
        assert_eq!(
            codecs.optional().serialize(&other).unwrap(),
            json!("effect:none")
        );
    }

    #[test]
    fn effects_apply() {
        assert_eq!(Effect::new(FixedEffect { amount: 5 }).apply(1.0), 6.0);
        assert_eq!(scaling("stat:mana", 2.0).apply(1.5), 3.0);
    }

    #[test]
    fn optional_effect_wire_round_trip() {
        let codecs = EffectCodecs::new().unwrap();
        let mut writer = WireWriter::new();
        codecs
            .optional()
            .encode(&mut writer, &Effect::new(FixedEffect { amount: -2 }))
            .unwrap();
        codecs
            .optional()
            .encode(&mut writer, &Effect::none())
            .unwrap();
        let bytes = writer.into_bytes();

        let mut reader = WireReader::new(&bytes);
        assert_eq!(
            codecs.optional().decode(&mut reader).unwrap(),
            Effect::new(FixedEffect { amount: -2 })
        );
        assert!(
            codecs
                .optional()
                .decode(&mut reader)
                .unwrap()
                .same_instance(&Effect::none())
        );
        reader.finish().unwrap();
    }

    #[test]
    fn extensions_register_their_own_variants() {
        #[derive(Debug, PartialEq)]
        struct Double;

        static DOUBLE: LazyLock<Loader<Effect>> =
            LazyLock::new(|| Loader::new(UnitVariant::new(|| Effect::new(Double))));

        impl EffectBehavior for Double {
            effect_behavior!(Double, DOUBLE);

            fn apply(&self, value: f64) -> f64 {
                value * 2.0
            }
        }

        let mut builder = EffectCodecs::builder().unwrap();
        builder
            .register(Key::new("mymod", "double").unwrap(), DOUBLE.clone())
            .unwrap();
        let codecs = EffectCodecs::from_builder(builder);

        let effect = codecs
            .variants()
            .convert(&json!("mymod:double"), "test")
            .unwrap();
        assert_eq!(effect.apply(2.0), 4.0);
        assert_eq!(
            codecs.variants().serialize(&effect).unwrap(),
            json!("mymod:double")
        );
    }
}
