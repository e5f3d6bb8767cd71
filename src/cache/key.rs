//! Cache Key Module
//!
//! Derives bounded, collision-resistant store keys from a namespace and a raw
//! key. Digesting only bounds key length; it is not a security boundary.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;

// == Raw Key ==
/// A caller-supplied key before derivation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawKey {
    /// Used verbatim
    Text(String),
    /// Canonicalized and digested
    Structured(Value),
}

impl RawKey {
    /// Builds a structured key from any serializable value.
    pub fn structured<T: Serialize>(value: &T) -> Result<Self> {
        Ok(match serde_json::to_value(value)? {
            Value::String(s) => RawKey::Text(s),
            other => RawKey::Structured(other),
        })
    }
}

impl From<&str> for RawKey {
    fn from(key: &str) -> Self {
        RawKey::Text(key.to_string())
    }
}

impl From<String> for RawKey {
    fn from(key: String) -> Self {
        RawKey::Text(key)
    }
}

impl From<&String> for RawKey {
    fn from(key: &String) -> Self {
        RawKey::Text(key.clone())
    }
}

impl From<Value> for RawKey {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RawKey::Text(s),
            other => RawKey::Structured(other),
        }
    }
}

// == Cache Key ==
/// A derived store key: `"{namespace}:{key}"` or just `key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives a key from an optional namespace and a raw key.
    ///
    /// Structured keys serialize with sorted object fields, so two values that
    /// differ only in field order produce the same key.
    pub fn new(namespace: Option<&str>, raw: impl Into<RawKey>) -> Self {
        let base = match raw.into() {
            RawKey::Text(s) => s,
            RawKey::Structured(value) => digest(&value),
        };

        match namespace {
            Some(ns) => CacheKey(format!("{}:{}", ns, base)),
            None => CacheKey(base),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey::new(None, key)
    }
}

/// Hex SHA-256 of the canonical JSON encoding.
fn digest(value: &Value) -> String {
    // serde_json::Map is BTreeMap-backed, so to_string is already canonical.
    let canonical = value.to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
