//! Decoded credential claims

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tpen_core::constants::{AGENT_CLAIM_SUFFIX, EXPIRY_CLAIM};

/// The claims object carried in a credential's middle segment.
///
/// Key order is the order in which the issuer wrote the claims, which
/// decides which `*/agent` claim wins when several are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Expiration instant in seconds since the epoch
    pub fn exp(&self) -> Option<f64> {
        self.0.get(EXPIRY_CLAIM).and_then(Value::as_f64)
    }

    /// The value of the first claim whose key ends in `/agent`, or of
    /// `default_key` when no key does
    pub fn agent_iri(&self, default_key: &str) -> Option<&str> {
        let key = self
            .0
            .keys()
            .find(|k| k.ends_with(AGENT_CLAIM_SUFFIX))
            .map(String::as_str)
            .unwrap_or(default_key);
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
