//! Stat type definitions.

use std::sync::Arc;

use loader_core::{CodecError, IdAwareRegistry, Key, SelfKeyed};
use serde::{Deserialize, Serialize};

/// Name of the stat registry.
pub const STAT_REGISTRY: &str = "stat";

/// A stat that effects can scale with (`stat:health`, `stat:mana`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatType {
    pub key: Key,
    #[serde(default)]
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub default: f64,
}

impl StatType {
    /// Checks `min <= default <= max`.
    pub fn validate(&self) -> loader_core::Result<()> {
        if self.min > self.max {
            return Err(CodecError::InvalidValue(format!(
                "stat '{}': min {} is greater than max {}",
                self.key, self.min, self.max
            )));
        }
        if !(self.min..=self.max).contains(&self.default) {
            return Err(CodecError::InvalidValue(format!(
                "stat '{}': default {} is outside {}..={}",
                self.key, self.default, self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl SelfKeyed for StatType {
    fn self_key(&self) -> &Key {
        &self.key
    }
}

/// Registered stat types, keyed by their own key.
pub type StatRegistry = IdAwareRegistry<Arc<StatType>>;

/// Builds a registry from validated stat definitions.
pub fn build_stat_registry(
    stats: impl IntoIterator<Item = StatType>,
) -> loader_core::Result<StatRegistry> {
    let mut registry = StatRegistry::new(STAT_REGISTRY);
    for stat in stats {
        stat.validate()?;
        registry.register(Arc::new(stat))?;
    }
    Ok(registry)
}
