//! Record schemas synthesized from ordered field tuples.
//!
//! ```ignore
//! let reward = Record::new(
//!     (
//!         Field::defaulting("chance", SerdeCodec::new(), 1.0, false, |r: &Reward| &r.chance),
//!         effects.merging_field("effect", |r: &Reward| &r.effect),
//!     ),
//!     |(chance, effect)| Reward { chance, effect },
//! );
//! ```
//!
//! Reading collects the failure of every field before giving up, so one
//! report lists all offending keys. Writing and both binary directions walk the
//! fields in declared order.

use std::any::type_name;

use serde_json::{Map, Value};

use crate::codec::{ValueCodec, kind};
use crate::error::{CodecError, Result};
use crate::field::FieldAdapter;
use crate::variant::{FieldView, VariantCodec};
use crate::wire::{WireReader, WireWriter};

/// An ordered tuple of [`FieldAdapter`]s sharing one parent type.
pub trait FieldSet: Send + Sync {
    type Parent;
    /// Tuple of the fields' values, in declared order.
    type Values;

    fn read(&self, fields: &FieldView<'_>) -> Result<Self::Values>;

    fn write(&self, parent: &Self::Parent, doc: &mut Map<String, Value>) -> Result<()>;

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<Self::Values>;

    fn encode(&self, writer: &mut WireWriter, parent: &Self::Parent) -> Result<()>;

    /// Union of the fields' document keys, or `None` if any field is open.
    fn known_names(&self) -> Option<Vec<&str>>;
}

fn collect<V>(result: Result<V>, errors: &mut Vec<CodecError>) -> Option<V> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            errors.push(error);
            None
        }
    }
}

macro_rules! field_set {
    ($head:ident $head_value:ident $head_idx:tt $(, $ty:ident $value:ident $idx:tt)*) => {
        impl<$head $(, $ty)*> FieldSet for ($head, $($ty,)*)
        where
            $head: FieldAdapter,
            $($ty: FieldAdapter<Parent = $head::Parent>,)*
        {
            type Parent = $head::Parent;
            type Values = ($head::Value, $($ty::Value,)*);

            fn read(&self, fields: &FieldView<'_>) -> Result<Self::Values> {
                let mut errors = Vec::new();
                let values = (
                    collect(self.$head_idx.get(fields), &mut errors),
                    $(collect(self.$idx.get(fields), &mut errors),)*
                );
                match values {
                    (Some($head_value), $(Some($value),)*) => Ok(($head_value, $($value,)*)),
                    _ => Err(CodecError::from_many(errors)),
                }
            }

            fn write(&self, parent: &Self::Parent, doc: &mut Map<String, Value>) -> Result<()> {
                self.$head_idx.set(parent, doc)?;
                $(self.$idx.set(parent, doc)?;)*
                Ok(())
            }

            fn decode(&self, reader: &mut WireReader<'_>) -> Result<Self::Values> {
                let $head_value = self.$head_idx.decode(reader)?;
                $(let $value = self.$idx.decode(reader)?;)*
                Ok(($head_value, $($value,)*))
            }

            fn encode(&self, writer: &mut WireWriter, parent: &Self::Parent) -> Result<()> {
                self.$head_idx.encode(writer, parent)?;
                $(self.$idx.encode(writer, parent)?;)*
                Ok(())
            }

            fn known_names(&self) -> Option<Vec<&str>> {
                #[allow(unused_mut)]
                let mut names = self.$head_idx.known_names()?;
                $(names.extend(self.$idx.known_names()?);)*
                Some(names)
            }
        }
    };
}

field_set!(A a 0);
field_set!(A a 0, B b 1);
field_set!(A a 0, B b 1, C c 2);
field_set!(A a 0, B b 1, C c 2, D d 3);
field_set!(A a 0, B b 1, C c 2, D d 3, E e 4);
field_set!(A a 0, B b 1, C c 2, D d 3, E e 4, F f 5);
field_set!(A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6);
field_set!(A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6, H h 7);

type Build<F> = Box<dyn Fn(<F as FieldSet>::Values) -> <F as FieldSet>::Parent + Send + Sync>;

/// A record codec built from a [`FieldSet`] and a constructor.
pub struct Record<F: FieldSet> {
    fields: F,
    build: Build<F>,
    strict: bool,
}

impl<F: FieldSet> Record<F> {
    pub fn new(
        fields: F,
        build: impl Fn(F::Values) -> F::Parent + Send + Sync + 'static,
    ) -> Self {
        Self {
            fields,
            build: Box::new(build),
            strict: false,
        }
    }

    /// Rejects document keys no field consumes.
    ///
    /// Has no effect on records with an inline polymorphic field, whose key
    /// set is open.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Reads every field from `fields` and builds the record.
    pub fn read_fields(&self, fields: &FieldView<'_>) -> Result<F::Parent> {
        if self.strict {
            self.reject_unknown(fields)?;
        }
        self.fields.read(fields).map(&self.build)
    }

    /// Writes every field of `value` into `doc`, in declared order.
    pub fn write_fields(&self, value: &F::Parent, doc: &mut Map<String, Value>) -> Result<()> {
        self.fields.write(value, doc)
    }

    pub fn decode_fields(&self, reader: &mut WireReader<'_>) -> Result<F::Parent> {
        self.fields.decode(reader).map(&self.build)
    }

    pub fn encode_fields(&self, writer: &mut WireWriter, value: &F::Parent) -> Result<()> {
        self.fields.encode(writer, value)
    }

    fn reject_unknown(&self, fields: &FieldView<'_>) -> Result<()> {
        let Some(known) = self.fields.known_names() else {
            return Ok(());
        };
        let unknown: Vec<_> = fields
            .keys()
            .filter(|key| !known.contains(key))
            .map(|key| CodecError::UnknownField {
                field: key.to_owned(),
            })
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(CodecError::from_many(unknown))
        }
    }
}

impl<F: FieldSet> ValueCodec<F::Parent> for Record<F> {
    fn read(&self, value: &Value) -> Result<F::Parent> {
        match value {
            Value::Object(map) => self.read_fields(&FieldView::new(map)),
            other => Err(CodecError::InvalidValue(format!(
                "expected an object, found {}",
                kind(other)
            ))),
        }
    }

    fn write(&self, value: &F::Parent) -> Result<Value> {
        let mut doc = Map::new();
        self.write_fields(value, &mut doc)?;
        Ok(Value::Object(doc))
    }

    fn decode(&self, reader: &mut WireReader<'_>) -> Result<F::Parent> {
        self.decode_fields(reader)
    }

    fn encode(&self, writer: &mut WireWriter, value: &F::Parent) -> Result<()> {
        self.encode_fields(writer, value)
    }
}

/// Variant codec for one concrete record type `V` of an abstract type `T`.
///
/// `wrap` lifts a decoded record into `T`; `unwrap` projects a `T` back to the
/// record and returns `None` for values of other variants.
pub struct RecordVariant<T, F: FieldSet> {
    record: Record<F>,
    wrap: fn(F::Parent) -> T,
    unwrap: fn(&T) -> Option<&F::Parent>,
}

impl<T, F: FieldSet> RecordVariant<T, F> {
    pub fn new(
        record: Record<F>,
        wrap: fn(F::Parent) -> T,
        unwrap: fn(&T) -> Option<&F::Parent>,
    ) -> Self {
        Self {
            record,
            wrap,
            unwrap,
        }
    }

    fn project<'t>(&self, value: &'t T) -> Result<&'t F::Parent> {
        (self.unwrap)(value).ok_or(CodecError::VariantMismatch {
            expected: type_name::<F::Parent>(),
        })
    }
}

impl<T, F: FieldSet> VariantCodec<T> for RecordVariant<T, F> {
    fn read(&self, fields: &FieldView<'_>) -> Result<T> {
        self.record.read_fields(fields).map(self.wrap)
    }

    fn write(&self, value: &T, doc: &mut Map<String, Value>) -> Result<()> {
        self.record.write_fields(self.project(value)?, doc)
    }

    fn read_binary(&self, reader: &mut WireReader<'_>) -> Result<T> {
        self.record.decode_fields(reader).map(self.wrap)
    }

    fn write_binary(&self, writer: &mut WireWriter, value: &T) -> Result<()> {
        self.record.encode_fields(writer, self.project(value)?)
    }
}
