//! Per-variant codecs and the self-describing value contract.
//!
//! A [`VariantCodec`] converts one concrete variant of an abstract type `T`
//! between the document form, the wire form and memory. Registries hold
//! codecs behind [`Loader`] handles, and every value reports the handle that
//! produced it through [`SelfDescribing`], so dispatch-on-write never inspects
//! the value's runtime type.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{CodecError, Result};
use crate::wire::{WireReader, WireWriter};

/// Read-only view over a document object with the discriminator hidden.
///
/// Variant codecs and field adapters read through this view. The registry
/// hides the discriminator so a codec can neither depend on it nor mistake
/// it for one of its own fields.
#[derive(Clone, Copy, Debug)]
pub struct FieldView<'a> {
    map: &'a Map<String, Value>,
    hidden: Option<&'a str>,
}

impl<'a> FieldView<'a> {
    /// A view over every field of `map`.
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map, hidden: None }
    }

    /// A view over `map` without the field named `hidden`.
    pub fn hiding(map: &'a Map<String, Value>, hidden: &'a str) -> Self {
        Self {
            map,
            hidden: Some(hidden),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        if self.hidden == Some(name) {
            None
        } else {
            self.map.get(name)
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Visible field names, in document order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + '_ {
        let hidden = self.hidden;
        self.map
            .keys()
            .map(String::as_str)
            .filter(move |key| Some(*key) != hidden)
    }

    pub fn is_empty(&self) -> bool {
        self.keys().next().is_none()
    }

    /// The underlying object, including the hidden field.
    pub fn raw(&self) -> &'a Map<String, Value> {
        self.map
    }
}

/// Converts one concrete variant of `T` in both representations.
///
/// # Contract
///
/// - `read(write(x)) == x` and `read_binary(write_binary(x)) == x`
/// - `read_binary` consumes exactly the bytes `write_binary` produced
/// - `write` never emits the registry's discriminator field
/// - decoding never needs the owning registry; only dispatch does
pub trait VariantCodec<T>: Send + Sync {
    fn read(&self, fields: &FieldView<'_>) -> Result<T>;

    /// Populates `doc` with the variant's fields. `doc` starts empty.
    fn write(&self, value: &T, doc: &mut Map<String, Value>) -> Result<()>;

    fn read_binary(&self, reader: &mut WireReader<'_>) -> Result<T>;

    fn write_binary(&self, writer: &mut WireWriter, value: &T) -> Result<()>;
}

/// Shared handle to a registered [`VariantCodec`].
///
/// Equality and hashing use the identity of the underlying allocation, so two
/// handles are equal only if one was cloned from the other. This is what the
/// registry's reverse lookup (`loader -> key`) is keyed on.
pub struct Loader<T: 'static>(Arc<dyn VariantCodec<T>>);

impl<T: 'static> Loader<T> {
    pub fn new(codec: impl VariantCodec<T> + 'static) -> Self {
        Self(Arc::new(codec))
    }

    pub fn codec(&self) -> &dyn VariantCodec<T> {
        self.0.as_ref()
    }

    fn address(&self) -> *const () {
        Arc::as_ptr(&self.0).cast::<()>()
    }
}

impl<T: 'static> Clone for Loader<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: 'static> PartialEq for Loader<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.address(), other.address())
    }
}

impl<T: 'static> Eq for Loader<T> {}

impl<T: 'static> Hash for Loader<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl<T: 'static> fmt::Debug for Loader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Loader").field(&self.address()).finish()
    }
}

/// A value that knows which [`Loader`] produced it.
///
/// The returned loader must be registered in the registry the value is
/// written through; otherwise writing fails with
/// [`CodecError::UnknownValue`].
pub trait SelfDescribing: Sized + 'static {
    fn loader(&self) -> &Loader<Self>;
}

/// Identity comparison for shared instances.
///
/// Used to recognise a designated default instance without relying on
/// structural equality.
pub trait InstanceIdentity {
    fn same_instance(&self, other: &Self) -> bool;
}

impl<U: ?Sized> InstanceIdentity for Arc<U> {
    fn same_instance(&self, other: &Self) -> bool {
        std::ptr::eq(Arc::as_ptr(self).cast::<()>(), Arc::as_ptr(other).cast::<()>())
    }
}

/// Codec for variants without fields (markers and singletons).
///
/// Reading produces a value from `make`; writing emits nothing, which lets a
/// compact registry collapse the value to its bare discriminator. A strict
/// unit variant rejects documents carrying any other field.
pub struct UnitVariant<T> {
    make: fn() -> T,
    strict: bool,
}

impl<T> UnitVariant<T> {
    pub fn new(make: fn() -> T) -> Self {
        Self {
            make,
            strict: false,
        }
    }

    /// Rejects documents with fields besides the discriminator.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

impl<T: 'static> VariantCodec<T> for UnitVariant<T> {
    fn read(&self, fields: &FieldView<'_>) -> Result<T> {
        if self.strict {
            if let Some(field) = fields.keys().next() {
                return Err(CodecError::UnknownField {
                    field: field.to_owned(),
                });
            }
        }
        Ok((self.make)())
    }

    fn write(&self, _value: &T, _doc: &mut Map<String, Value>) -> Result<()> {
        Ok(())
    }

    fn read_binary(&self, _reader: &mut WireReader<'_>) -> Result<T> {
        Ok((self.make)())
    }

    fn write_binary(&self, _writer: &mut WireWriter, _value: &T) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Nothing;

    impl VariantCodec<u8> for Nothing {
        fn read(&self, _fields: &FieldView<'_>) -> Result<u8> {
            Ok(0)
        }

        fn write(&self, _value: &u8, _doc: &mut Map<String, Value>) -> Result<()> {
            Ok(())
        }

        fn read_binary(&self, _reader: &mut WireReader<'_>) -> Result<u8> {
            Ok(0)
        }

        fn write_binary(&self, _writer: &mut WireWriter, _value: &u8) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn loaders_compare_by_identity() {
        let a = Loader::new(Nothing);
        let b = Loader::new(Nothing);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn view_hides_discriminator() {
        let doc = json!({"type": "effect:fixed", "amount": 5});
        let map = doc.as_object().unwrap();
        let view = FieldView::hiding(map, "type");
        assert!(view.get("type").is_none());
        assert_eq!(view.get("amount"), Some(&json!(5)));
        assert_eq!(view.keys().collect::<Vec<_>>(), vec!["amount"]);
        assert!(view.raw().contains_key("type"));
    }

    #[test]
    fn strict_unit_variant_rejects_extra_fields() {
        let doc = json!({"type": "effect:none", "extra": 1});
        let map = doc.as_object().unwrap();
        let view = FieldView::hiding(map, "type");

        let lenient = UnitVariant::new(|| 1u8);
        assert_eq!(lenient.read(&view).unwrap(), 1);

        let strict = UnitVariant::new(|| 1u8).strict();
        let err = strict.read(&view).unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { ref field } if field == "extra"));
    }

    #[test]
    fn arc_identity() {
        let a = Arc::new(5);
        let b = Arc::new(5);
        assert!(a.same_instance(&a.clone()));
        assert!(!a.same_instance(&b));
    }
}
