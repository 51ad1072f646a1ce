//! Named field descriptors that compose into record schemas.
//!
//! A [`FieldAdapter`] projects one field out of a parent value `P` and back,
//! in both representations. Records (see [`crate::record`]) are built from an
//! ordered tuple of adapters; the order is part of the wire contract because
//! binary fields are positional.
//!
//! | Shape | Constructor | Missing in document | Written when |
//! |-------|-------------|---------------------|--------------|
//! | required | [`Field::required`] | `MissingField` | always |
//! | nullable | [`Field::nullable`] | `None` | value is `Some` |
//! | defaulting | [`Field::defaulting`] | the default | value differs from the default, or `serialize_default` |
//! | merging | [`Field::merging`] | also tries the alias names | as the wrapped shape, under the primary name |
//! | direct / merging inline | [`PolymorphicRegistry::direct_field`](crate::PolymorphicRegistry::direct_field) | `MissingField` on the discriminator | fields merged into the parent |

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::codec::{NullableCodec, ValueCodec};
use crate::error::{CodecError, Result};
use crate::polymorphic::PolymorphicRegistry;
use crate::variant::{FieldView, SelfDescribing};
use crate::wire::{WireReader, WireWriter};

type Getter<P, V> = Arc<dyn Fn(&P) -> &V + Send + Sync>;

/// One named field of a record schema.
pub trait FieldAdapter: Send + Sync {
    /// The record type the field belongs to.
    type Parent;
    /// The field's own value type.
    type Value;

    /// Primary document name, used in error paths.
    fn name(&self) -> &str;

    /// Every document key the field may consume, or `None` if the field
    /// consumes an open set of keys (inline polymorphic fields).
    fn known_names(&self) -> Option<Vec<&str>>;

    fn get(&self, fields: &FieldView<'_>) -> Result<Self::Value>;

    fn set(&self, parent: &Self::Parent, doc: &mut Map<String, Value>) -> Result<()>;

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<Self::Value>;

    fn encode(&self, writer: &mut WireWriter, parent: &Self::Parent) -> Result<()>;
}

enum Presence<V> {
    Required,
    Fallback {
        make: Arc<dyn Fn() -> V + Send + Sync>,
        is_fallback: Arc<dyn Fn(&V) -> bool + Send + Sync>,
        serialize: bool,
    },
}

/// A field stored under its own document key.
pub struct Field<P, V> {
    name: String,
    aliases: Vec<String>,
    codec: Arc<dyn ValueCodec<V>>,
    getter: Getter<P, V>,
    presence: Presence<V>,
}

impl<P: 'static, V: 'static> Field<P, V> {
    /// A field that must be present.
    pub fn required(
        name: impl Into<String>,
        codec: impl ValueCodec<V> + 'static,
        getter: impl Fn(&P) -> &V + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            codec: Arc::new(codec),
            getter: Arc::new(getter),
            presence: Presence::Required,
        }
    }

    /// A field that falls back to `fallback()` when missing or `null`.
    ///
    /// When `is_fallback` holds for the current value and `serialize_fallback`
    /// is false, the field is left out of the document entirely. The wire
    /// always carries the value.
    pub fn with_fallback(
        name: impl Into<String>,
        codec: impl ValueCodec<V> + 'static,
        fallback: impl Fn() -> V + Send + Sync + 'static,
        is_fallback: impl Fn(&V) -> bool + Send + Sync + 'static,
        serialize_fallback: bool,
        getter: impl Fn(&P) -> &V + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            codec: Arc::new(codec),
            getter: Arc::new(getter),
            presence: Presence::Fallback {
                make: Arc::new(fallback),
                is_fallback: Arc::new(is_fallback),
                serialize: serialize_fallback,
            },
        }
    }

    /// A field that falls back to a fixed default, compared by value.
    pub fn defaulting(
        name: impl Into<String>,
        codec: impl ValueCodec<V> + 'static,
        default: V,
        serialize_default: bool,
        getter: impl Fn(&P) -> &V + Send + Sync + 'static,
    ) -> Self
    where
        V: Clone + PartialEq + Send + Sync,
    {
        let expected = default.clone();
        Self::with_fallback(
            name,
            codec,
            move || default.clone(),
            move |value| *value == expected,
            serialize_default,
            getter,
        )
    }

    /// Also accepts `alias` when reading. Writing always uses the primary name.
    ///
    /// If both names are present the primary name wins.
    #[must_use]
    pub fn merging(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

impl<P: 'static, V: 'static> Field<P, Option<V>> {
    /// A field whose absence (or `null`) reads as `None`; `None` is not written.
    pub fn nullable(
        name: impl Into<String>,
        codec: impl ValueCodec<V> + 'static,
        getter: impl Fn(&P) -> &Option<V> + Send + Sync + 'static,
    ) -> Self {
        Self::with_fallback(
            name,
            NullableCodec::new(codec),
            || None,
            Option::is_none,
            false,
            getter,
        )
    }
}

impl<P, V> Field<P, V> {
    fn lookup<'a>(&'a self, fields: &FieldView<'a>) -> Option<(&'a str, &'a Value)> {
        let optional = matches!(self.presence, Presence::Fallback { .. });
        std::iter::once(&self.name)
            .chain(&self.aliases)
            .find_map(|name| {
                fields
                    .get(name)
                    .filter(|value| !(optional && value.is_null()))
                    .map(|value| (name.as_str(), value))
            })
    }
}

impl<P, V> FieldAdapter for Field<P, V> {
    type Parent = P;
    type Value = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn known_names(&self) -> Option<Vec<&str>> {
        Some(
            std::iter::once(&self.name)
                .chain(&self.aliases)
                .map(String::as_str)
                .collect(),
        )
    }

    fn get(&self, fields: &FieldView<'_>) -> Result<V> {
        match (self.lookup(fields), &self.presence) {
            (Some((name, value)), _) => self.codec.read(value).map_err(|e| e.in_field(name)),
            (None, Presence::Fallback { make, .. }) => Ok(make()),
            (None, Presence::Required) => Err(CodecError::MissingField {
                field: self.name.clone(),
            }),
        }
    }

    fn set(&self, parent: &P, doc: &mut Map<String, Value>) -> Result<()> {
        let value = (self.getter)(parent);
        if let Presence::Fallback {
            is_fallback,
            serialize: false,
            ..
        } = &self.presence
        {
            if is_fallback(value) {
                return Ok(());
            }
        }

        let written = self
            .codec
            .write(value)
            .map_err(|e| e.in_field(&self.name))?;
        insert_unique(doc, self.name.clone(), written)
    }

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<V> {
        self.codec.decode(reader).map_err(|e| e.in_field(&self.name))
    }

    fn encode(&self, writer: &mut WireWriter, parent: &P) -> Result<()> {
        self.codec
            .encode(writer, (self.getter)(parent))
            .map_err(|e| e.in_field(&self.name))
    }
}

impl<P, V> fmt::Debug for Field<P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field(
                "required",
                &matches!(self.presence, Presence::Required),
            )
            .finish()
    }
}

/// A polymorphic value whose fields are merged into the parent document.
///
/// Built by [`PolymorphicRegistry::direct_field`] (discriminator under the
/// registry's own type field) and [`PolymorphicRegistry::merging_field`]
/// (discriminator renamed). The merged value is always written in object
/// form, never collapsed to a bare token.
pub struct InlineField<P, T: 'static> {
    registry: Arc<PolymorphicRegistry<T>>,
    type_field: String,
    getter: Getter<P, T>,
}

impl<P, T: SelfDescribing> InlineField<P, T> {
    pub(crate) fn new(
        registry: Arc<PolymorphicRegistry<T>>,
        type_field: String,
        getter: Getter<P, T>,
    ) -> Self {
        Self {
            registry,
            type_field,
            getter,
        }
    }
}

impl<P, T: SelfDescribing> FieldAdapter for InlineField<P, T> {
    type Parent = P;
    type Value = T;

    fn name(&self) -> &str {
        &self.type_field
    }

    fn known_names(&self) -> Option<Vec<&str>> {
        None
    }

    fn get(&self, fields: &FieldView<'_>) -> Result<T> {
        self.registry
            .read_inline(fields.raw(), &self.type_field)
            .map_err(|e| e.in_field(&self.type_field))
    }

    fn set(&self, parent: &P, doc: &mut Map<String, Value>) -> Result<()> {
        let merged = self
            .registry
            .write_inline((self.getter)(parent), &self.type_field)
            .map_err(|e| e.in_field(&self.type_field))?;
        for (name, value) in merged {
            insert_unique(doc, name, value)?;
        }
        Ok(())
    }

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<T> {
        self.registry
            .decode(reader)
            .map_err(|e| e.in_field(&self.type_field))
    }

    fn encode(&self, writer: &mut WireWriter, parent: &P) -> Result<()> {
        self.registry
            .encode(writer, (self.getter)(parent))
            .map_err(|e| e.in_field(&self.type_field))
    }
}

fn insert_unique(doc: &mut Map<String, Value>, name: String, value: Value) -> Result<()> {
    if doc.contains_key(&name) {
        return Err(CodecError::FieldCollision { field: name });
    }
    doc.insert(name, value);
    Ok(())
}
