//! Credential lifecycle: accepting the login redirect, authenticating from
//! storage, expiring and logging out

use crate::store::CredentialStore;
use crate::token::{self, Claims};
use std::sync::Arc;
use tpen_core::constants::{
    DEFAULT_AGENT_CLAIM, EVENT_AUTHENTICATED, EVENT_TOKEN_EXPIRATION, ID_TOKEN_QUERY_PARAM,
    USER_TOKEN_KEY,
};
use tpen_core::{Error, EventDetail, EventDispatcher, Result};
use tracing::{debug, info, warn};
use url::Url;

/// An authenticated credential and what it claims
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub agent: Option<String>,
    pub user_id: Option<String>,
    pub claims: Claims,
    /// Expiry in milliseconds since the epoch, when the credential states one
    pub expires_at_ms: Option<i64>,
}

/// Reads the stored credential and announces authentication state changes
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    dispatcher: Arc<EventDispatcher>,
    token_key: String,
    agent_claim: String,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            token_key: USER_TOKEN_KEY.to_string(),
            agent_claim: DEFAULT_AGENT_CLAIM.to_string(),
        }
    }

    /// Storage key the credential lives under
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Claim key used when no claim ends in `/agent`
    pub fn with_agent_claim(mut self, claim: impl Into<String>) -> Self {
        self.agent_claim = claim.into();
        self
    }

    pub fn agent_claim(&self) -> &str {
        &self.agent_claim
    }

    /// The stored credential, if any
    pub fn token(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(&self.token_key)?
            .filter(|t| !t.trim().is_empty()))
    }

    /// Store `token` after checking that its claims decode
    pub fn store_token(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::malformed_token("empty credential"));
        }
        token::decode_claims(Some(token))?;
        self.store.set(&self.token_key, token)?;
        info!(key = %self.token_key, "Credential stored");
        Ok(())
    }

    /// Accept the identity provider's redirect.
    ///
    /// When `redirect` carries an `idToken` query parameter it is stored as
    /// the credential and returned. A URL without one is left alone.
    pub fn accept_redirect(&self, redirect: &str) -> Result<Option<String>> {
        let url = Url::parse(redirect)
            .map_err(|e| Error::configuration(format!("invalid redirect URL '{redirect}': {e}")))?;
        let Some(token) = url
            .query_pairs()
            .find(|(name, _)| name == ID_TOKEN_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
        else {
            debug!("Redirect carries no credential");
            return Ok(None);
        };
        self.store_token(&token)?;
        Ok(Some(token))
    }

    /// [`Self::authenticate_at`] against the current time
    pub fn authenticate(&self) -> Result<Option<Session>> {
        self.authenticate_at(token::now_ms())
    }

    /// Authenticate from the stored credential.
    ///
    /// An expired credential is removed and `token-expiration` is dispatched.
    /// A credential whose expiry cannot be read is treated as unexpired.
    /// Otherwise `tpen-authenticated` is dispatched with the credential.
    pub fn authenticate_at(&self, now_ms: i64) -> Result<Option<Session>> {
        let Some(token) = self.token()? else {
            debug!("No stored credential");
            return Ok(None);
        };

        match token::is_expired_at(&token, now_ms) {
            Ok(true) => {
                info!("Stored credential has expired, removing it");
                self.store.remove(&self.token_key)?;
                self.dispatcher
                    .dispatch(EVENT_TOKEN_EXPIRATION, EventDetail::None);
                return Ok(None);
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Could not read credential expiry, treating it as valid"),
        }

        let claims = token::decode_claims(Some(&token)).unwrap_or_default();
        let agent = claims.agent_iri(&self.agent_claim).map(str::to_string);
        let user_id = agent.as_deref().and_then(token::user_id_from_agent);
        let expires_at_ms = claims.exp().map(|exp| (exp * 1000.0) as i64);

        self.dispatcher
            .dispatch(EVENT_AUTHENTICATED, EventDetail::Credential(token.clone()));
        info!(user_id = ?user_id, "Authenticated");

        Ok(Some(Session {
            token,
            agent,
            user_id,
            claims,
            expires_at_ms,
        }))
    }

    /// Authenticate or fail with [`Error::Unauthenticated`]
    pub fn require_session(&self) -> Result<Session> {
        self.authenticate()?
            .ok_or_else(|| Error::unauthenticated("no valid credential is stored; log in first"))
    }

    /// Remove the stored credential. Returns whether one was present.
    pub fn logout(&self) -> Result<bool> {
        let removed = self.store.remove(&self.token_key)?;
        info!(removed, "Logged out");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{token_expiring_at, unsigned_token};
    use parking_lot::Mutex;
    use serde_json::json;
    use tpen_core::events::handler;

    fn recorder(dispatcher: &Arc<EventDispatcher>, event: &'static str) -> Arc<Mutex<Vec<EventDetail>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        dispatcher.on(
            event,
            handler(move |e| {
                sink.lock().push(e.detail.clone());
                Ok(())
            }),
        );
        seen
    }

    fn authenticator() -> (Authenticator, Arc<MemoryStore>, Arc<EventDispatcher>) {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = EventDispatcher::new();
        let auth = Authenticator::new(store.clone(), Arc::clone(&dispatcher));
        (auth, store, dispatcher)
    }

    #[test]
    fn test_no_credential_is_not_an_error() {
        let (auth, _, dispatcher) = authenticator();
        let seen = recorder(&dispatcher, EVENT_AUTHENTICATED);
        assert!(auth.authenticate_at(0).unwrap().is_none());
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_valid_credential_dispatches_authenticated() {
        let (auth, _, dispatcher) = authenticator();
        let seen = recorder(&dispatcher, EVENT_AUTHENTICATED);
        let token = token_expiring_at(2_000, "u1");
        auth.store_token(&token).unwrap();

        let session = auth.authenticate_at(1_999_000).unwrap().unwrap();
        assert_eq!(session.user_id.as_deref(), Some("u1"));
        assert_eq!(session.expires_at_ms, Some(2_000_000));
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].as_credential(), Some(token.as_str()));
    }

    #[test]
    fn test_expired_credential_is_removed() {
        let (auth, store, dispatcher) = authenticator();
        let expired = recorder(&dispatcher, EVENT_TOKEN_EXPIRATION);
        let authenticated = recorder(&dispatcher, EVENT_AUTHENTICATED);
        auth.store_token(&token_expiring_at(2_000, "u1")).unwrap();

        assert!(auth.authenticate_at(2_000_000).unwrap().is_none());
        assert_eq!(store.get(USER_TOKEN_KEY).unwrap(), None);
        assert_eq!(expired.lock().len(), 1);
        assert!(authenticated.lock().is_empty());
    }

    #[test]
    fn test_unreadable_expiry_is_treated_as_valid() {
        let (auth, store, dispatcher) = authenticator();
        let seen = recorder(&dispatcher, EVENT_AUTHENTICATED);
        store
            .set(USER_TOKEN_KEY, &unsigned_token(&json!({ "sub": "no-exp" })))
            .unwrap();

        let session = auth.authenticate_at(i64::MAX).unwrap().unwrap();
        assert_eq!(session.expires_at_ms, None);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_accept_redirect_stores_id_token() {
        let (auth, store, _) = authenticator();
        let token = token_expiring_at(2_000, "u1");
        let redirect = format!("https://app.t-pen.org/project?projectID=abc&idToken={token}");

        assert_eq!(auth.accept_redirect(&redirect).unwrap().as_deref(), Some(token.as_str()));
        assert_eq!(store.get(USER_TOKEN_KEY).unwrap(), Some(token));
        assert_eq!(auth.accept_redirect("https://app.t-pen.org/").unwrap(), None);
    }

    #[test]
    fn test_store_rejects_malformed_token() {
        let (auth, store, _) = authenticator();
        assert!(auth.store_token("not-a-token").is_err());
        assert!(auth.store_token("  ").is_err());
        assert_eq!(store.get(USER_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_custom_token_key_and_logout() {
        let store = Arc::new(MemoryStore::new());
        let auth = Authenticator::new(store.clone(), EventDispatcher::new()).with_token_key("altToken");
        auth.store_token(&token_expiring_at(2_000, "u1")).unwrap();
        assert!(store.get("altToken").unwrap().is_some());
        assert!(auth.logout().unwrap());
        assert!(!auth.logout().unwrap());
        assert!(matches!(auth.require_session(), Err(Error::Unauthenticated { .. })));
    }
}
