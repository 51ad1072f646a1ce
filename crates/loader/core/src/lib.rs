//! Polymorphic loader/registry framework.
//!
//! `loader-core` moves typed, extensible values between three forms: authored
//! documents ([`serde_json::Value`]), the compact binary wire used to
//! replicate state ([`WireWriter`] / [`WireReader`]), and in-memory values.
//!
//! - [`NamedRegistry`] / [`IdAwareRegistry`] bind [`Key`]s to values.
//! - [`PolymorphicRegistry`] dispatches an abstract type to per-variant
//!   [`VariantCodec`]s, optionally in compact mode.
//! - [`DefaultingRegistry`] adds a designated instance standing for "absent".
//! - [`Field`], [`InlineField`] and [`Record`] compose record schemas from
//!   named fields.
//!
//! Registries are built once during setup and are immutable afterwards, so
//! they can be shared across threads without locking. Nothing in this crate
//! performs I/O.
pub mod codec;
pub mod defaulting;
pub mod error;
pub mod field;
pub mod id_aware;
pub mod key;
pub mod named;
pub mod polymorphic;
pub mod record;
pub mod variant;
pub mod wire;

pub use codec::{ListCodec, NullableCodec, SerdeCodec, ValueCodec, ValueCodecExt};
pub use defaulting::DefaultingRegistry;
pub use error::{CodecError, ErrorSeverity, FieldPath, Result, WireError};
pub use field::{Field, FieldAdapter, InlineField};
pub use id_aware::{IdAwareRegistry, SelfKeyed};
pub use key::Key;
pub use named::{NamedRegistry, NamedRegistryBuilder, Registrar};
pub use polymorphic::{PolymorphicRegistry, PolymorphicRegistryBuilder, TYPE_FIELD};
pub use record::{FieldSet, Record, RecordVariant};
pub use variant::{FieldView, InstanceIdentity, Loader, SelfDescribing, UnitVariant, VariantCodec};
pub use wire::{WireReader, WireWriter};
