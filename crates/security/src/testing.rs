//! Fixture credentials for tests and local development.
//!
//! These tokens carry a placeholder signature and are only meaningful to code
//! that reads claims without verifying them.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::{json, Value};
use tpen_core::constants::DEFAULT_AGENT_CLAIM;

/// Build an unsigned three-part token whose payload is `claims`
pub fn unsigned_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.unsigned")
}

/// Agent IRI for `user_id` in the form the identity provider issues
pub fn agent_iri(user_id: &str) -> String {
    format!("https://store.rerum.io/v1/id/{user_id}")
}

/// A token for `user_id` expiring at `exp_secs`
pub fn token_expiring_at(exp_secs: i64, user_id: &str) -> String {
    unsigned_token(&json!({
        "exp": exp_secs,
        DEFAULT_AGENT_CLAIM: agent_iri(user_id),
    }))
}
