//! Namespaced identifiers used as registry discriminators.

use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, Result};

/// An immutable `namespace:path` identifier.
///
/// Keys name registered variants, stat types, recipes and anything else that
/// needs to be looked up by name. Equality is structural.
///
/// # Format
///
/// - namespace: one or more of `a-z 0-9 _ - .`
/// - path: one or more of `a-z 0-9 _ - . /`
///
/// A string without a `:` separator is parsed with [`Key::DEFAULT_NAMESPACE`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    namespace: String,
    path: String,
}

impl Key {
    /// Namespace applied when a key is written without one.
    pub const DEFAULT_NAMESPACE: &'static str = "core";

    /// Creates a key from its two parts, validating both.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let path = path.into();
        validate(&namespace, &path)?;
        Ok(Self { namespace, path })
    }

    /// Parses `namespace:path`, or `path` under the default namespace.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once(':') {
            Some((namespace, path)) => {
                validate(namespace, path).map_err(|error| invalid(raw, error))?;
                Ok(Self {
                    namespace: namespace.to_owned(),
                    path: path.to_owned(),
                })
            }
            None => Self::new(Self::DEFAULT_NAMESPACE, raw).map_err(|error| invalid(raw, error)),
        }
    }

    /// Returns the namespace part.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the path part.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a key in the same namespace with a different path.
    pub fn sibling(&self, path: impl Into<String>) -> Result<Self> {
        Self::new(self.namespace.clone(), path)
    }
}

fn invalid(raw: &str, error: CodecError) -> CodecError {
    match error {
        CodecError::InvalidKey { reason, .. } => CodecError::InvalidKey {
            raw: raw.to_owned(),
            reason,
        },
        other => other,
    }
}

fn validate(namespace: &str, path: &str) -> Result<()> {
    let reason = if namespace.is_empty() {
        Some("empty namespace")
    } else if path.is_empty() {
        Some("empty path")
    } else if !namespace.bytes().all(is_namespace_byte) {
        Some("namespace may only contain [a-z0-9_.-]")
    } else if !path.bytes().all(|b| is_namespace_byte(b) || b == b'/') {
        Some("path may only contain [a-z0-9_.-/]")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CodecError::InvalidKey {
            raw: format!("{namespace}:{path}"),
            reason,
        }),
        None => Ok(()),
    }
}

const fn is_namespace_byte(b: u8) -> bool {
    matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.')
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Key {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl serde::Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
