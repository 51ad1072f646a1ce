//! Registries of values that carry their own key.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, error};

use crate::error::{CodecError, Result};
use crate::key::Key;
use crate::wire::{WireReader, WireWriter};

/// A value that knows the key it is registered under.
pub trait SelfKeyed {
    fn self_key(&self) -> &Key;
}

impl<U: SelfKeyed + ?Sized> SelfKeyed for Arc<U> {
    fn self_key(&self) -> &Key {
        (**self).self_key()
    }
}

/// Registry keyed by each value's own [`SelfKeyed::self_key`].
///
/// Reverse lookup reads the key off the value, so no reverse map is kept.
#[derive(Debug)]
pub struct IdAwareRegistry<V> {
    name: String,
    entries: IndexMap<Key, V>,
}

impl<V: SelfKeyed> IdAwareRegistry<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `value` under its own key.
    pub fn register(&mut self, value: V) -> Result<&V> {
        let key = value.self_key().clone();
        if self.entries.contains_key(&key) {
            error!(
                target: "loader::registry",
                registry = %self.name,
                key = %key,
                "duplicate registration"
            );
            return Err(CodecError::DuplicateKey {
                registry: self.name.clone(),
                key,
            });
        }
        debug!(target: "loader::registry", registry = %self.name, key = %key, "registered");
        let (index, _) = self.entries.insert_full(key, value);
        Ok(&self.entries[index])
    }

    pub fn get(&self, key: &Key) -> Option<&V> {
        self.entries.get(key)
    }

    /// The key `value` reports, provided it is registered here.
    pub fn key_of<'v>(&self, value: &'v V) -> Result<&'v Key> {
        let key = value.self_key();
        if self.entries.contains_key(key) {
            Ok(key)
        } else {
            Err(CodecError::UnknownValue {
                registry: self.name.clone(),
            })
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode_value(&self, writer: &mut WireWriter, value: &V) -> Result<()> {
        writer.write_key(self.key_of(value)?)
    }

    pub fn decode_value(&self, reader: &mut WireReader<'_>) -> Result<&V> {
        let raw = reader.read_str()?;
        Key::parse(&raw)
            .ok()
            .and_then(|key| self.entries.get(&key))
            .ok_or_else(|| CodecError::UnknownVariant {
                registry: self.name.clone(),
                key: raw,
                context: "wire".to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Stat {
        key: Key,
        max: u32,
    }

    impl SelfKeyed for Stat {
        fn self_key(&self) -> &Key {
            &self.key
        }
    }

    fn stat(path: &str, max: u32) -> Arc<Stat> {
        Arc::new(Stat {
            key: Key::new("stat", path).unwrap(),
            max,
        })
    }

    #[test]
    fn registers_under_own_key() {
        let mut registry = IdAwareRegistry::new("stat");
        let health = stat("health", 100);
        registry.register(Arc::clone(&health)).unwrap();

        let found = registry.get(&Key::new("stat", "health").unwrap()).unwrap();
        assert_eq!(found.max, 100);
        assert_eq!(registry.key_of(&health).unwrap().path(), "health");
    }

    #[test]
    fn same_key_twice_is_duplicate() {
        let mut registry = IdAwareRegistry::new("stat");
        registry.register(stat("health", 100)).unwrap();
        let err = registry.register(stat("health", 5)).unwrap_err();
        assert!(matches!(err, CodecError::DuplicateKey { .. }));
        assert_eq!(registry.values().next().unwrap().max, 100);
    }

    #[test]
    fn unregistered_value_has_no_key() {
        let registry = IdAwareRegistry::<Arc<Stat>>::new("stat");
        let err = registry.key_of(&stat("mana", 10)).unwrap_err();
        assert!(matches!(err, CodecError::UnknownValue { .. }));
    }

    #[test]
    fn wire_resolves_registered_value() {
        let mut registry = IdAwareRegistry::new("stat");
        let mana = stat("mana", 50);
        registry.register(Arc::clone(&mana)).unwrap();

        let mut writer = WireWriter::new();
        registry.encode_value(&mut writer, &mana).unwrap();
        let bytes = writer.into_bytes();
        let decoded = registry.decode_value(&mut WireReader::new(&bytes)).unwrap();
        assert!(Arc::ptr_eq(decoded, &mana));
    }
}
