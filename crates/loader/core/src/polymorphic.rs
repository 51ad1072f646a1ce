//! Discriminator-based dispatch for abstract types.
//!
//! A [`PolymorphicRegistry`] maps discriminator keys to variant [`Loader`]s
//! and converts values of the abstract type in both representations:
//!
//! ```text
//! document  {"type": "effect:fixed", "amount": 5}
//! compact   "effect:none"                 (variants with no fields, compact registries only)
//! wire      [key: str][variant payload]
//! ```
//!
//! Reads dispatch on the discriminator; writes dispatch on the value's own
//! [`SelfDescribing::loader`], so no runtime type inspection is involved.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::error;

use crate::codec::ValueCodec;
use crate::error::{CodecError, Result};
use crate::field::InlineField;
use crate::key::Key;
use crate::named::{NamedRegistry, NamedRegistryBuilder};
use crate::variant::{FieldView, Loader, SelfDescribing};
use crate::wire::{WireReader, WireWriter};

/// Default name of the discriminator field.
pub const TYPE_FIELD: &str = "type";

/// Collects variant registrations for a [`PolymorphicRegistry`].
pub struct PolymorphicRegistryBuilder<T: 'static> {
    codecs: NamedRegistryBuilder<Loader<T>>,
    compact: bool,
    type_field: String,
}

impl<T: SelfDescribing> PolymorphicRegistryBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            codecs: NamedRegistryBuilder::new(name),
            compact: false,
            type_field: TYPE_FIELD.to_owned(),
        }
    }

    /// Accepts and produces bare discriminator tokens for field-less variants.
    #[must_use]
    pub fn compact(mut self) -> Self {
        self.compact = true;
        self
    }

    /// Renames the discriminator field (default `"type"`).
    #[must_use]
    pub fn type_field(mut self, name: impl Into<String>) -> Self {
        self.type_field = name.into();
        self
    }

    /// Registers `loader` under `key`.
    pub fn register(&mut self, key: Key, loader: Loader<T>) -> Result<&mut Self> {
        self.codecs.register(key, loader)?;
        Ok(self)
    }

    /// Registers `loader` under `path` in the namespace named after the registry.
    pub fn register_local(&mut self, path: &str, loader: Loader<T>) -> Result<&mut Self> {
        let key = Key::new(self.codecs.name(), path)?;
        self.register(key, loader)
    }

    pub fn build(self) -> PolymorphicRegistry<T> {
        PolymorphicRegistry {
            codecs: self.codecs.build(),
            compact: self.compact,
            type_field: self.type_field,
        }
    }
}

/// Immutable registry of the variants of `T`.
pub struct PolymorphicRegistry<T: 'static> {
    codecs: NamedRegistry<Loader<T>>,
    compact: bool,
    type_field: String,
}

impl<T: SelfDescribing> PolymorphicRegistry<T> {
    pub fn builder(name: impl Into<String>) -> PolymorphicRegistryBuilder<T> {
        PolymorphicRegistryBuilder::new(name)
    }

    /// Wraps loaders collected elsewhere, e.g. by a
    /// [`Registrar`](crate::Registrar) shared between independent producers.
    pub fn from_named(codecs: NamedRegistry<Loader<T>>, compact: bool) -> Self {
        Self {
            codecs,
            compact,
            type_field: TYPE_FIELD.to_owned(),
        }
    }

    /// Renames the discriminator field of a registry built by [`Self::from_named`].
    #[must_use]
    pub fn with_type_field(mut self, name: impl Into<String>) -> Self {
        self.type_field = name.into();
        self
    }

    pub fn name(&self) -> &str {
        self.codecs.name()
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    pub fn type_field(&self) -> &str {
        &self.type_field
    }

    pub fn codecs(&self) -> &NamedRegistry<Loader<T>> {
        &self.codecs
    }

    pub fn get(&self, key: &Key) -> Option<&Loader<T>> {
        self.codecs.get(key)
    }

    /// Discriminator of `value`.
    pub fn key_of(&self, value: &T) -> Result<&Key> {
        self.codecs.key_of(value.loader())
    }

    /// Converts a document to a value.
    ///
    /// `context` names where the document came from and is carried by
    /// `UnknownVariant` and `InvalidShape`.
    ///
    /// # Errors
    ///
    /// - [`CodecError::UnknownVariant`] if the discriminator is not registered
    /// - [`CodecError::InvalidShape`] if the document is neither an object nor,
    ///   in compact mode, a string token
    /// - [`CodecError::MissingField`] if an object has no discriminator
    /// - whatever the variant's codec raises
    pub fn convert(&self, doc: &Value, context: &str) -> Result<T> {
        match doc {
            Value::Object(map) => self.read_object(map, &self.type_field, context),
            Value::String(token) if self.compact => {
                let (_, loader) = self.codecs.lookup(token, context)?;
                let empty = Map::new();
                loader.codec().read(&FieldView::new(&empty))
            }
            _ => Err(self.invalid_shape(context)),
        }
    }

    /// Converts a value to a document.
    ///
    /// In compact mode a variant that writes no fields collapses to its bare
    /// discriminator.
    pub fn serialize(&self, value: &T) -> Result<Value> {
        let (key, body) = self.write_body(value, &self.type_field)?;
        if self.compact && body.is_empty() {
            return Ok(Value::String(key.to_string()));
        }
        Ok(Value::Object(with_discriminator(
            &self.type_field,
            key,
            body,
        )))
    }

    /// Writes the discriminator key and then the variant payload.
    pub fn encode(&self, writer: &mut WireWriter, value: &T) -> Result<()> {
        let loader = value.loader();
        self.codecs.encode_value(writer, loader)?;
        loader.codec().write_binary(writer, value)
    }

    pub fn decode(&self, reader: &mut WireReader<'_>) -> Result<T> {
        let (_, loader) = self.codecs.decode_value(reader)?;
        loader.codec().read_binary(reader)
    }

    /// Embeds values of this registry into a parent record, discriminator
    /// under this registry's own type field.
    pub fn direct_field<P>(
        self: &Arc<Self>,
        getter: impl Fn(&P) -> &T + Send + Sync + 'static,
    ) -> InlineField<P, T> {
        InlineField::new(Arc::clone(self), self.type_field.clone(), Arc::new(getter))
    }

    /// Like [`direct_field`](Self::direct_field), with the discriminator
    /// stored under `type_key` so it cannot clash with a parent field.
    pub fn merging_field<P>(
        self: &Arc<Self>,
        type_key: impl Into<String>,
        getter: impl Fn(&P) -> &T + Send + Sync + 'static,
    ) -> InlineField<P, T> {
        InlineField::new(Arc::clone(self), type_key.into(), Arc::new(getter))
    }

    /// Reads a value whose fields live in `map` next to the parent's own.
    pub(crate) fn read_inline(&self, map: &Map<String, Value>, type_field: &str) -> Result<T> {
        self.read_object(map, type_field, type_field)
    }

    /// Writes a value in object form, discriminator under `type_field`.
    pub(crate) fn write_inline(&self, value: &T, type_field: &str) -> Result<Map<String, Value>> {
        let (key, body) = self.write_body(value, type_field)?;
        Ok(with_discriminator(type_field, key, body))
    }

    fn read_object(&self, map: &Map<String, Value>, type_field: &str, context: &str) -> Result<T> {
        let token = match map.get(type_field) {
            Some(Value::String(token)) => token,
            Some(_) => return Err(self.invalid_shape(context)),
            None => {
                return Err(CodecError::MissingField {
                    field: type_field.to_owned(),
                });
            }
        };
        let (_, loader) = self.codecs.lookup(token, context)?;
        loader.codec().read(&FieldView::hiding(map, type_field))
    }

    fn write_body(&self, value: &T, type_field: &str) -> Result<(&Key, Map<String, Value>)> {
        let loader = value.loader();
        let key = self.codecs.key_of(loader)?;
        let mut body = Map::new();
        loader.codec().write(value, &mut body)?;
        if body.contains_key(type_field) {
            error!(
                target: "loader::registry",
                registry = %self.name(),
                key = %key,
                field = type_field,
                "variant codec wrote its own discriminator"
            );
            return Err(CodecError::VariantContractViolation {
                registry: self.name().to_owned(),
                key: key.clone(),
                field: type_field.to_owned(),
            });
        }
        Ok((key, body))
    }

    fn invalid_shape(&self, context: &str) -> CodecError {
        CodecError::InvalidShape {
            registry: self.name().to_owned(),
            context: context.to_owned(),
            compact: self.compact,
        }
    }
}

fn with_discriminator(type_field: &str, key: &Key, body: Map<String, Value>) -> Map<String, Value> {
    let mut doc = Map::with_capacity(body.len() + 1);
    doc.insert(type_field.to_owned(), Value::String(key.to_string()));
    doc.extend(body);
    doc
}

impl<T: SelfDescribing> ValueCodec<T> for PolymorphicRegistry<T> {
    fn read(&self, value: &Value) -> Result<T> {
        self.convert(value, self.name())
    }

    fn write(&self, value: &T) -> Result<Value> {
        self.serialize(value)
    }

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<T> {
        PolymorphicRegistry::decode(self, reader)
    }

    fn encode(&self, writer: &mut WireWriter, value: &T) -> Result<()> {
        PolymorphicRegistry::encode(self, writer, value)
    }
}
