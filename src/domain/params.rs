//! Canonical string form of call arguments and the digest derived from it.
//!
//! The ledger client and the queue body both carry arguments as strings.
//! Structured values (objects, arrays) are JSON-encoded; everything else uses
//! its plain string representation. `serde_json` keeps object keys sorted, so
//! the encoding of a given value is stable and the digest can be used for
//! transport-level deduplication.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Ordered string form of a parameter sequence. Same length and order as the
/// source values.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(transparent)]
pub struct NormalizedParams(Vec<String>);

impl NormalizedParams {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for NormalizedParams {
    fn from(params: Vec<String>) -> Self {
        Self(params)
    }
}

/// Converts each value to its transport string. Never fails: a
/// `serde_json::Value` is always acyclic and serializable.
pub fn normalize(params: &[Value]) -> NormalizedParams {
    NormalizedParams(params.iter().map(normalize_value).collect())
}

fn normalize_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        // Display on Value is compact JSON; for scalars that is their plain form.
        other => other.to_string(),
    }
}

/// Hex SHA-256 digest identifying a payload to the queue transport.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
#[serde(transparent)]
pub struct DeduplicationKey(String);

impl DeduplicationKey {
    /// Digest over the params only. The caller is deliberately not part of
    /// the key, so identical payloads from different callers collide.
    pub fn from_params(params: &NormalizedParams) -> Self {
        Self::digest(params, None)
    }

    /// Digest over the params plus a one-off salt, used for forced
    /// resubmissions.
    pub fn salted(params: &NormalizedParams, salt: &str) -> Self {
        Self::digest(params, Some(salt))
    }

    fn digest(params: &NormalizedParams, salt: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        // Length-prefix each element so ["ab","c"] and ["a","bc"] differ.
        for param in params.as_slice() {
            hasher.update((param.len() as u64).to_be_bytes());
            hasher.update(param.as_bytes());
        }
        if let Some(salt) = salt {
            hasher.update(b"\x00salt");
            hasher.update(salt.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeduplicationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
