//! Whole-value codecs used as building blocks for field adapters.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CodecError, Result};
use crate::wire::{WireReader, WireWriter};

/// Converts one value between the document form, the wire form and memory.
///
/// Unlike a [`VariantCodec`](crate::VariantCodec), a value codec owns the
/// whole document node: it may produce any JSON value, not only an object.
pub trait ValueCodec<V>: Send + Sync {
    fn read(&self, value: &Value) -> Result<V>;

    fn write(&self, value: &V) -> Result<Value>;

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<V>;

    fn encode(&self, writer: &mut WireWriter, value: &V) -> Result<()>;
}

impl<V, C> ValueCodec<V> for Arc<C>
where
    C: ValueCodec<V> + ?Sized,
{
    fn read(&self, value: &Value) -> Result<V> {
        (**self).read(value)
    }

    fn write(&self, value: &V) -> Result<Value> {
        (**self).write(value)
    }

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<V> {
        (**self).decode(reader)
    }

    fn encode(&self, writer: &mut WireWriter, value: &V) -> Result<()> {
        (**self).encode(writer, value)
    }
}

/// Combinators available on every codec.
pub trait ValueCodecExt<V: 'static>: ValueCodec<V> + Sized + 'static {
    /// Lifts the codec to `Option<V>`, with `null` standing for `None`.
    fn nullable(self) -> NullableCodec<V> {
        NullableCodec::new(self)
    }

    /// Lifts the codec to `Vec<V>`.
    fn list(self) -> ListCodec<V> {
        ListCodec::new(self)
    }
}

impl<V: 'static, C: ValueCodec<V> + 'static> ValueCodecExt<V> for C {}

/// Codec for any serde type.
///
/// Documents go through `serde_json`; the wire goes through the varint
/// bincode layout of [`WireWriter::write_serde`].
pub struct SerdeCodec<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> SerdeCodec<V> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<V> Default for SerdeCodec<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ValueCodec<V> for SerdeCodec<V>
where
    V: Serialize + DeserializeOwned,
{
    fn read(&self, value: &Value) -> Result<V> {
        Ok(serde_json::from_value(value.clone())?)
    }

    fn write(&self, value: &V) -> Result<Value> {
        Ok(serde_json::to_value(value)?)
    }

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<V> {
        reader.read_serde()
    }

    fn encode(&self, writer: &mut WireWriter, value: &V) -> Result<()> {
        writer.write_serde(value)
    }
}

/// `Option<V>` on top of a codec for `V`.
///
/// Document: `null` is `None`. Wire: a presence flag, then the payload.
pub struct NullableCodec<V> {
    inner: Arc<dyn ValueCodec<V>>,
}

impl<V: 'static> NullableCodec<V> {
    pub fn new(inner: impl ValueCodec<V> + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl<V> ValueCodec<Option<V>> for NullableCodec<V> {
    fn read(&self, value: &Value) -> Result<Option<V>> {
        match value {
            Value::Null => Ok(None),
            other => self.inner.read(other).map(Some),
        }
    }

    fn write(&self, value: &Option<V>) -> Result<Value> {
        match value {
            Some(value) => self.inner.write(value),
            None => Ok(Value::Null),
        }
    }

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<Option<V>> {
        if reader.read_bool()? {
            self.inner.decode(reader).map(Some)
        } else {
            Ok(None)
        }
    }

    fn encode(&self, writer: &mut WireWriter, value: &Option<V>) -> Result<()> {
        writer.write_bool(value.is_some());
        match value {
            Some(value) => self.inner.encode(writer, value),
            None => Ok(()),
        }
    }
}

/// `Vec<V>` on top of a codec for `V`.
///
/// Document: a JSON array. Wire: a varint element count, then each element.
/// Element failures are reported under their index.
pub struct ListCodec<V> {
    inner: Arc<dyn ValueCodec<V>>,
}

impl<V: 'static> ListCodec<V> {
    pub fn new(inner: impl ValueCodec<V> + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl<V> ValueCodec<Vec<V>> for ListCodec<V> {
    fn read(&self, value: &Value) -> Result<Vec<V>> {
        let Value::Array(items) = value else {
            return Err(CodecError::InvalidValue(format!(
                "expected an array, found {}",
                kind(value)
            )));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| self.inner.read(item).map_err(|e| e.in_field(index.to_string())))
            .collect()
    }

    fn write(&self, value: &Vec<V>) -> Result<Value> {
        value
            .iter()
            .enumerate()
            .map(|(index, item)| self.inner.write(item).map_err(|e| e.in_field(index.to_string())))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<Vec<V>> {
        let len = reader.read_var_u64()?;
        // Untrusted length: bound the preallocation by the unread input.
        let capacity = usize::try_from(len).unwrap_or(usize::MAX).min(reader.remaining());
        let mut items = Vec::with_capacity(capacity);
        for index in 0..len {
            items.push(
                self.inner
                    .decode(reader)
                    .map_err(|e| e.in_field(index.to_string()))?,
            );
        }
        Ok(items)
    }

    fn encode(&self, writer: &mut WireWriter, value: &Vec<V>) -> Result<()> {
        writer.write_var_u64(value.len() as u64)?;
        for (index, item) in value.iter().enumerate() {
            self.inner
                .encode(writer, item)
                .map_err(|e| e.in_field(index.to_string()))?;
        }
        Ok(())
    }
}

/// Name of a document node's kind, for diagnostics.
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
