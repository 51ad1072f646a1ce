//! Bidirectional `Key <-> value` registries.
//!
//! Registries follow a two-phase lifecycle:
//!
//! 1. **Setup**: a [`NamedRegistryBuilder`] (single producer) or a
//!    [`Registrar`] (independent producers racing during bootstrap) collects
//!    registrations and rejects duplicates.
//! 2. **Use**: `build()` / `finish()` produce an immutable [`NamedRegistry`]
//!    that can be shared across threads and read without locking.
//!
//! Values are never unregistered.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::error::{CodecError, Result};
use crate::key::Key;
use crate::wire::{WireReader, WireWriter};

/// Collects registrations for a [`NamedRegistry`].
#[derive(Debug)]
pub struct NamedRegistryBuilder<V> {
    name: String,
    entries: IndexMap<Key, V>,
    reverse: HashMap<V, Key>,
}

impl<V> NamedRegistryBuilder<V>
where
    V: Clone + Eq + Hash,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: IndexMap::new(),
            reverse: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds `key` to `value`.
    ///
    /// # Errors
    ///
    /// - [`CodecError::DuplicateKey`] if `key` is already bound
    /// - [`CodecError::DuplicateValue`] if `value` is already bound to another key
    ///
    /// A failed registration leaves the registry unchanged.
    pub fn register(&mut self, key: Key, value: V) -> Result<&V> {
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
        if let Some(existing) = self.reverse.get(&value) {
            return Err(CodecError::DuplicateValue {
                registry: self.name.clone(),
                key: existing.clone(),
            });
        }

        debug!(target: "loader::registry", registry = %self.name, key = %key, "registered");
        self.reverse.insert(value.clone(), key.clone());
        let (index, _) = self.entries.insert_full(key, value);
        Ok(&self.entries[index])
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ends the setup phase.
    pub fn build(self) -> NamedRegistry<V> {
        NamedRegistry {
            name: self.name,
            entries: self.entries,
            reverse: self.reverse,
        }
    }
}

/// Serializes registration from independent producers during setup.
///
/// Every producer holds a shared reference and calls [`Registrar::register`];
/// registrations are applied one at a time. Once all producers are done,
/// [`Registrar::finish`] yields the immutable registry.
#[derive(Debug)]
pub struct Registrar<V> {
    inner: Mutex<NamedRegistryBuilder<V>>,
}

impl<V> Registrar<V>
where
    V: Clone + Eq + Hash,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(NamedRegistryBuilder::new(name)),
        }
    }

    /// Binds `key` to `value`, returning the registered value.
    pub fn register(&self, key: Key, value: V) -> Result<V> {
        self.inner.lock().register(key, value).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn finish(self) -> NamedRegistry<V> {
        self.inner.into_inner().build()
    }
}

/// Immutable bidirectional mapping between keys and registered values.
///
/// Iteration follows registration order.
#[derive(Debug)]
pub struct NamedRegistry<V> {
    name: String,
    entries: IndexMap<Key, V>,
    reverse: HashMap<V, Key>,
}

impl<V> NamedRegistry<V>
where
    V: Clone + Eq + Hash,
{
    pub fn builder(name: impl Into<String>) -> NamedRegistryBuilder<V> {
        NamedRegistryBuilder::new(name)
    }

    /// Display name, used in diagnostics only.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &Key) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Reverse lookup.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnknownValue`] if `value` was never registered here. This
    /// is a programming error (registries mixed up), not bad input.
    pub fn key_of(&self, value: &V) -> Result<&Key> {
        self.reverse.get(value).ok_or_else(|| {
            error!(
                target: "loader::registry",
                registry = %self.name,
                "reverse lookup for a value that was never registered"
            );
            CodecError::UnknownValue {
                registry: self.name.clone(),
            }
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &V)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the key `value` is registered under.
    pub fn encode_value(&self, writer: &mut WireWriter, value: &V) -> Result<()> {
        writer.write_key(self.key_of(value)?)
    }

    /// Reads a key and resolves it to its registered value.
    pub fn decode_value(&self, reader: &mut WireReader<'_>) -> Result<(&Key, &V)> {
        let raw = reader.read_str()?;
        self.lookup(&raw, "wire")
    }

    /// Resolves a discriminator string, failing with `UnknownVariant`.
    pub(crate) fn lookup(&self, raw: &str, context: &str) -> Result<(&Key, &V)> {
        Key::parse(raw)
            .ok()
            .and_then(|key| self.entries.get_key_value(&key))
            .ok_or_else(|| CodecError::UnknownVariant {
                registry: self.name.clone(),
                key: raw.to_owned(),
                context: context.to_owned(),
            })
    }
}
