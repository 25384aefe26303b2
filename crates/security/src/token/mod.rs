//! Token utilities
//!
//! Pure functions over an opaque bearer credential: a dot-separated,
//! three-part signed token whose middle segment is base64url-encoded JSON.
//! Nothing here verifies signatures or talks to the network; the services
//! API does that. These helpers only read what the credential claims.

mod claims;

pub use claims::Claims;

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chrono::Utc;
use std::time::Duration;
use tpen_core::constants::{DEFAULT_AGENT_CLAIM, EXPIRY_CLAIM};
use tpen_core::{Error, Result};

/// Append `=` until the length is a multiple of four.
///
/// A remainder of one can never come from base64 and is rejected.
pub fn restore_padding(segment: &str) -> Result<String> {
    match segment.len() % 4 {
        0 => Ok(segment.to_string()),
        1 => Err(Error::invalid_length(segment.len())),
        rem => {
            let mut padded = String::with_capacity(segment.len() + 4 - rem);
            padded.push_str(segment);
            padded.extend(std::iter::repeat('=').take(4 - rem));
            Ok(padded)
        }
    }
}

/// Decode the claims object of `token`.
///
/// An absent or empty token yields empty claims: having no credential is not
/// an error. A present token must have a payload segment that decodes to a
/// JSON object.
pub fn decode_claims(token: Option<&str>) -> Result<Claims> {
    let token = match token.map(str::trim) {
        None | Some("") => return Ok(Claims::default()),
        Some(t) => t,
    };

    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_), Some(payload)) if !payload.is_empty() => payload,
        _ => {
            return Err(Error::malformed_token(
                "expected at least two dot-separated segments",
            ))
        }
    };

    // Accept the standard alphabet as well as base64url
    let normalized: String = payload
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let padded = restore_padding(&normalized)?;
    let bytes = URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| Error::malformed_token(format!("payload is not base64url: {e}")))?;

    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::malformed_token(format!("payload is not JSON: {e}")))?;
    match value {
        serde_json::Value::Object(map) => Ok(Claims::new(map)),
        other => Err(Error::malformed_token(format!(
            "payload is JSON but not an object: {other}"
        ))),
    }
}

/// Whether `token` has expired at `now_ms` (milliseconds since the epoch).
///
/// Expired iff `now_ms >= exp * 1000`. Decode failures and a missing `exp`
/// are returned as errors; callers that want to fail open decide that
/// themselves.
pub fn is_expired_at(token: &str, now_ms: i64) -> Result<bool> {
    let exp = decode_claims(Some(token))?
        .exp()
        .ok_or_else(|| Error::missing_claim(EXPIRY_CLAIM))?;
    Ok(now_ms as f64 >= exp * 1000.0)
}

/// [`is_expired_at`] against the current time
pub fn is_expired(token: &str) -> Result<bool> {
    is_expired_at(token, now_ms())
}

/// Remaining lifetime at `now_ms`, `None` once expired
pub fn expires_in(token: &str, now_ms: i64) -> Result<Option<Duration>> {
    let exp = decode_claims(Some(token))?
        .exp()
        .ok_or_else(|| Error::missing_claim(EXPIRY_CLAIM))?;
    let remaining_ms = exp * 1000.0 - now_ms as f64;
    if remaining_ms <= 0.0 {
        Ok(None)
    } else {
        Ok(Some(Duration::from_millis(remaining_ms as u64)))
    }
}

/// Agent IRI claimed by `token`, using `default_claim` when no claim key ends in `/agent`
pub fn agent_iri_with_claim(token: &str, default_claim: &str) -> Option<String> {
    decode_claims(Some(token))
        .ok()?
        .agent_iri(default_claim)
        .map(str::to_string)
}

/// Agent IRI claimed by `token`
pub fn agent_iri_from_token(token: &str) -> Option<String> {
    agent_iri_with_claim(token, DEFAULT_AGENT_CLAIM)
}

/// Final path segment of an agent IRI
pub fn user_id_from_agent(agent: &str) -> Option<String> {
    agent
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// User id claimed by `token`: the final path segment of its agent IRI
pub fn user_id_from_token(token: &str) -> Option<String> {
    agent_iri_from_token(token).and_then(|agent| user_id_from_agent(&agent))
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
