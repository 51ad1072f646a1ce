//! Polymorphic registries with a designated "no value" instance.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::codec::ValueCodec;
use crate::error::Result;
use crate::field::Field;
use crate::polymorphic::PolymorphicRegistry;
use crate::variant::{InstanceIdentity, SelfDescribing};
use crate::wire::{WireReader, WireWriter};

/// A [`PolymorphicRegistry`] decorated with a default instance.
///
/// The default stands for "absent": it is written as `null` in documents and
/// as a cleared presence flag on the wire, and reading either yields a clone
/// of the very same instance (identity, not equality). It needs no
/// discriminator of its own; if its loader is also registered in the inner
/// registry, explicit discriminators still decode through that loader.
pub struct DefaultingRegistry<T: 'static> {
    inner: Arc<PolymorphicRegistry<T>>,
    default: T,
}

impl<T> DefaultingRegistry<T>
where
    T: SelfDescribing + InstanceIdentity + Clone + Send + Sync,
{
    pub fn new(inner: Arc<PolymorphicRegistry<T>>, default: T) -> Self {
        Self { inner, default }
    }

    pub fn inner(&self) -> &Arc<PolymorphicRegistry<T>> {
        &self.inner
    }

    pub fn default_instance(&self) -> &T {
        &self.default
    }

    /// True if `value` is the default instance itself.
    pub fn is_default(&self, value: &T) -> bool {
        value.same_instance(&self.default)
    }

    /// `null` converts to the default; everything else goes to the inner registry.
    pub fn convert(&self, doc: &Value, context: &str) -> Result<T> {
        match doc {
            Value::Null => Ok(self.default.clone()),
            other => self.inner.convert(other, context),
        }
    }

    pub fn serialize(&self, value: &T) -> Result<Value> {
        if self.is_default(value) {
            Ok(Value::Null)
        } else {
            self.inner.serialize(value)
        }
    }

    /// Writes a presence flag, then the discriminator and payload if present.
    pub fn encode(&self, writer: &mut WireWriter, value: &T) -> Result<()> {
        let present = !self.is_default(value);
        writer.write_bool(present);
        if present {
            self.inner.encode(writer, value)
        } else {
            Ok(())
        }
    }

    pub fn decode(&self, reader: &mut WireReader<'_>) -> Result<T> {
        if reader.read_bool()? {
            self.inner.decode(reader)
        } else {
            Ok(self.default.clone())
        }
    }

    /// Converts `doc[key]`, or returns the default without touching any codec
    /// when `key` is missing.
    pub fn get_or_default(&self, doc: &Map<String, Value>, key: &str) -> Result<T> {
        match doc.get(key) {
            Some(value) => self.convert(value, key).map_err(|e| e.in_field(key)),
            None => Ok(self.default.clone()),
        }
    }

    /// A record field that reads as the default when missing or `null`, and
    /// is left out of the document when it holds the default, unless
    /// `serialize_default` is set (then it is written as `null`).
    pub fn default_field<P: 'static>(
        self: &Arc<Self>,
        name: impl Into<String>,
        serialize_default: bool,
        getter: impl Fn(&P) -> &T + Send + Sync + 'static,
    ) -> Field<P, T> {
        let fallback = Arc::clone(self);
        let identity = Arc::clone(self);
        Field::with_fallback(
            name,
            Arc::clone(self),
            move || fallback.default.clone(),
            move |value| identity.is_default(value),
            serialize_default,
            getter,
        )
    }
}

impl<T> ValueCodec<T> for DefaultingRegistry<T>
where
    T: SelfDescribing + InstanceIdentity + Clone + Send + Sync,
{
    fn read(&self, value: &Value) -> Result<T> {
        self.convert(value, self.inner.name())
    }

    fn write(&self, value: &T) -> Result<Value> {
        self.serialize(value)
    }

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<T> {
        DefaultingRegistry::decode(self, reader)
    }

    fn encode(&self, writer: &mut WireWriter, value: &T) -> Result<()> {
        DefaultingRegistry::encode(self, writer, value)
    }
}
