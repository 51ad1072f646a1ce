//! Error infrastructure for loader-core.
//!
//! Every fallible operation in this crate returns [`CodecError`]. Errors are
//! all-or-nothing: no conversion produces a partial value, so callers reject
//! the enclosing document or packet as a whole.
//!
//! # Design Principles
//!
//! - **Severity Classification**: user-data problems are separated from
//!   registry/schema defects so the surrounding application can decide whether
//!   to reject content or abort startup
//! - **Field Paths**: nested field adapters wrap failures with the field name,
//!   so a deeply nested failure still points at the exact offending key

use std::fmt;

use crate::key::Key;

/// Severity level of an error.
///
/// - **Validation**: bad or outdated content, or a stale network peer
/// - **Internal**: a schema or codec defect detected while converting a value
/// - **Fatal**: registry misconfiguration; never caused by user data
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Invalid input that should be rejected without retry.
    ///
    /// Examples: unknown discriminator, missing required field, malformed wire bytes
    Validation,

    /// A registered codec or schema misbehaved for one value.
    ///
    /// Examples: a variant codec handed a value of a different variant,
    /// an inline field colliding with a parent field
    Internal,

    /// Registry consistency is broken.
    ///
    /// Examples: duplicate registration, a value whose loader was never
    /// registered, a codec rewriting its own discriminator
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if the error is caused by the data being converted.
    pub const fn is_user_data(&self) -> bool {
        matches!(self, Self::Validation)
    }

    /// Returns true if this error indicates a defect in registered code.
    pub const fn is_defect(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Errors raised while reading or writing the binary wire format.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("wire encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("{remaining} unread bytes left in wire buffer")]
    TrailingBytes { remaining: usize },

    #[error("length {len} does not fit in {max}")]
    LengthOverflow { len: usize, max: u64 },
}

/// Dotted path of field names leading to a nested failure (`rewards.1.amount`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Segments from the outermost field to the innermost.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    fn push_front(&mut self, segment: String) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Errors surfaced by registries, codecs and field adapters.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("duplicate key '{key}' in registry '{registry}'")]
    DuplicateKey { registry: String, key: Key },

    #[error("value is already registered as '{key}' in registry '{registry}'")]
    DuplicateValue { registry: String, key: Key },

    #[error("unknown {registry} variant '{key}' in {context}")]
    UnknownVariant {
        registry: String,
        key: String,
        context: String,
    },

    #[error(
        "invalid {registry} document in {context}: expected an object{}",
        compact_hint(.compact)
    )]
    InvalidShape {
        registry: String,
        context: String,
        compact: bool,
    },

    #[error("variant codec '{key}' in registry '{registry}' wrote its own discriminator '{field}'")]
    VariantContractViolation {
        registry: String,
        key: Key,
        field: String,
    },

    #[error("variant codec for '{expected}' was handed a value of another variant")]
    VariantMismatch { expected: &'static str },

    #[error("value is not registered in registry '{registry}'")]
    UnknownValue { registry: String },

    #[error("missing required field '{field}'")]
    MissingField { field: String },

    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("field '{field}' is written twice")]
    FieldCollision { field: String },

    #[error("invalid key '{raw}': {reason}")]
    InvalidKey { raw: String, reason: &'static str },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("{path}: {source}")]
    InField {
        path: FieldPath,
        source: Box<CodecError>,
    },

    #[error("{}", join_errors(.0))]
    Multiple(Vec<CodecError>),
}

fn compact_hint(compact: &bool) -> &'static str {
    if *compact {
        " or a discriminator string"
    } else {
        ""
    }
}

fn join_errors(errors: &[CodecError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CodecError {
    /// Wraps this error with the field it occurred in, extending an existing path.
    #[must_use]
    pub fn in_field(self, field: impl Into<String>) -> Self {
        match self {
            Self::InField { mut path, source } => {
                path.push_front(field.into());
                Self::InField { path, source }
            }
            other => Self::InField {
                path: FieldPath(vec![field.into()]),
                source: Box::new(other),
            },
        }
    }

    /// Collapses a list of field failures; a single failure is returned as-is.
    pub fn from_many(mut errors: Vec<CodecError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Multiple(errors)
        }
    }

    /// Returns the innermost error, skipping field-path wrappers.
    pub fn root(&self) -> &CodecError {
        match self {
            Self::InField { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the field path of this error, if it was raised inside a field.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::InField { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DuplicateKey { .. }
            | Self::DuplicateValue { .. }
            | Self::UnknownValue { .. }
            | Self::VariantContractViolation { .. } => ErrorSeverity::Fatal,
            Self::VariantMismatch { .. } | Self::FieldCollision { .. } => ErrorSeverity::Internal,
            Self::UnknownVariant { .. }
            | Self::InvalidShape { .. }
            | Self::MissingField { .. }
            | Self::UnknownField { .. }
            | Self::InvalidKey { .. }
            | Self::InvalidValue(_)
            | Self::Wire(_) => ErrorSeverity::Validation,
            Self::InField { source, .. } => source.severity(),
            Self::Multiple(errors) => errors
                .iter()
                .map(CodecError::severity)
                .max()
                .unwrap_or(ErrorSeverity::Validation),
        }
    }

    /// Returns a static identifier for this error variant.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::DuplicateValue { .. } => "duplicate_value",
            Self::UnknownVariant { .. } => "unknown_variant",
            Self::InvalidShape { .. } => "invalid_shape",
            Self::VariantContractViolation { .. } => "variant_contract_violation",
            Self::VariantMismatch { .. } => "variant_mismatch",
            Self::UnknownValue { .. } => "unknown_value",
            Self::MissingField { .. } => "missing_field",
            Self::UnknownField { .. } => "unknown_field",
            Self::FieldCollision { .. } => "field_collision",
            Self::InvalidKey { .. } => "invalid_key",
            Self::InvalidValue(_) => "invalid_value",
            Self::Wire(_) => "wire",
            Self::InField { source, .. } => source.error_code(),
            Self::Multiple(_) => "multiple",
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidValue(error.to_string())
    }
}

impl From<bincode::Error> for CodecError {
    fn from(error: bincode::Error) -> Self {
        Self::Wire(WireError::Encoding(error))
    }
}

/// Result alias used throughout loader-core.
pub type Result<T, E = CodecError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_fields_build_dotted_path() {
        let error = CodecError::MissingField {
            field: "amount".into(),
        }
        .in_field("1")
        .in_field("rewards");

        assert_eq!(error.path().map(ToString::to_string), Some("rewards.1".into()));
        assert_eq!(
            error.to_string(),
            "rewards.1: missing required field 'amount'"
        );
        assert!(matches!(error.root(), CodecError::MissingField { .. }));
    }

    #[test]
    fn severity_follows_wrapped_error() {
        let error = CodecError::UnknownValue {
            registry: "effect".into(),
        }
        .in_field("effect");
        assert_eq!(error.severity(), ErrorSeverity::Fatal);
        assert_eq!(error.error_code(), "unknown_value");
    }

    #[test]
    fn multiple_reports_worst_severity() {
        let error = CodecError::from_many(vec![
            CodecError::MissingField { field: "a".into() },
            CodecError::FieldCollision { field: "b".into() },
        ]);
        assert_eq!(error.severity(), ErrorSeverity::Internal);
        assert_eq!(
            error.to_string(),
            "missing required field 'a'; field 'b' is written twice"
        );
    }

    #[test]
    fn single_error_is_not_wrapped() {
        let error = CodecError::from_many(vec![CodecError::MissingField { field: "a".into() }]);
        assert!(matches!(error, CodecError::MissingField { .. }));
    }
}
