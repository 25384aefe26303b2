//! The explicit application context
//!
//! One `TpenContext` owns the configuration, the dispatcher and every
//! service built on it. Components receive it (or the parts they need)
//! instead of reaching for process-wide state, so tests can build isolated
//! instances.

use crate::api::ApiClient;
use parking_lot::RwLock;
use std::sync::Arc;
use tpen_cache::Vault;
use tpen_config::Config;
use tpen_core::constants::{
    EVENT_PROJECT_LOADED, EVENT_TOAST, EVENT_TOKEN_EXPIRATION, EVENT_USER_LOADED,
};
use tpen_core::events::handler;
use tpen_core::{
    EventDispatcher, Project, Result, SubscriptionScope, ToastStatus, UserProfile,
};
use tpen_security::{Authenticator, CredentialStore, FileStore, PermissionEngine, Session};
use tracing::{error, info, warn};

pub struct TpenContext {
    config: Config,
    dispatcher: Arc<EventDispatcher>,
    authenticator: Authenticator,
    engine: PermissionEngine,
    vault: Vault,
    api: ApiClient,
    current_user: Arc<RwLock<Option<Arc<UserProfile>>>>,
    active_project: Arc<RwLock<Option<Arc<Project>>>>,
    _subscriptions: SubscriptionScope,
}

impl TpenContext {
    /// Context backed by the configured storage file and a fresh dispatcher
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(FileStore::new(config.storage_path.clone()));
        Self::with_parts(config, store, EventDispatcher::new())
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn CredentialStore>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Result<Self> {
        config.validate()?;

        let authenticator = Authenticator::new(store, Arc::clone(&dispatcher))
            .with_token_key(config.token_key.clone())
            .with_agent_claim(config.agent_claim.clone());
        let engine = PermissionEngine::new(config.agent_claim.clone());
        let vault = Vault::from_settings(&config.vault, Arc::clone(&dispatcher))?;
        let api = ApiClient::new(config.clone(), Arc::clone(&dispatcher))?;

        let current_user = Arc::new(RwLock::new(None));
        let active_project = Arc::new(RwLock::new(None));
        let subscriptions = track_state(&dispatcher, &current_user, &active_project);

        Ok(Self {
            config,
            dispatcher,
            authenticator,
            engine,
            vault,
            api,
            current_user,
            active_project,
            _subscriptions: subscriptions,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn engine(&self) -> &PermissionEngine {
        &self.engine
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn current_user(&self) -> Option<Arc<UserProfile>> {
        self.current_user.read().clone()
    }

    pub fn active_project(&self) -> Option<Arc<Project>> {
        self.active_project.read().clone()
    }

    /// Authenticate from storage; `None` when there is no usable credential
    pub fn session(&self) -> Result<Option<Session>> {
        self.authenticator.authenticate()
    }

    /// Load project `id` with the stored credential, if any
    pub async fn load_project(&self, id: &str) -> Result<Arc<Project>> {
        let session = self.session()?;
        self.api
            .load_project(id, session.as_ref().map(|s| s.token.as_str()))
            .await
    }

    /// Load the profile of the authenticated user
    pub async fn load_profile(&self) -> Result<Arc<UserProfile>> {
        let session = self.authenticator.require_session()?;
        self.api.load_profile(&session.token).await
    }
}

/// Keep the context's view of the user and project current, and surface
/// toasts through the log
fn track_state(
    dispatcher: &Arc<EventDispatcher>,
    current_user: &Arc<RwLock<Option<Arc<UserProfile>>>>,
    active_project: &Arc<RwLock<Option<Arc<Project>>>>,
) -> SubscriptionScope {
    let mut scope = SubscriptionScope::new();

    let project = Arc::clone(active_project);
    scope.add(dispatcher.subscribe(
        EVENT_PROJECT_LOADED,
        handler(move |event| {
            if let Some(loaded) = event.detail.as_project() {
                *project.write() = Some(Arc::clone(loaded));
            }
            Ok(())
        }),
    ));

    let user = Arc::clone(current_user);
    scope.add(dispatcher.subscribe(
        EVENT_USER_LOADED,
        handler(move |event| {
            if let Some(loaded) = event.detail.as_user() {
                *user.write() = Some(Arc::clone(loaded));
            }
            Ok(())
        }),
    ));

    let user = Arc::clone(current_user);
    scope.add(dispatcher.subscribe(
        EVENT_TOKEN_EXPIRATION,
        handler(move |_| {
            *user.write() = None;
            Ok(())
        }),
    ));

    scope.add(dispatcher.subscribe(
        EVENT_TOAST,
        handler(|event| {
            if let Some(toast) = event.detail.as_toast() {
                match toast.status {
                    ToastStatus::Error => error!("{}", toast.message),
                    ToastStatus::Warning => warn!("{}", toast.message),
                    ToastStatus::Info | ToastStatus::Success => info!("{}", toast.message),
                }
            }
            Ok(())
        }),
    ));

    scope
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpen_core::constants::EVENT_AUTHENTICATED;
    use tpen_core::{Collaborator, EventDetail};
    use tpen_security::testing::token_expiring_at;
    use tpen_security::MemoryStore;

    fn context() -> TpenContext {
        TpenContext::with_parts(
            Config::default(),
            Arc::new(MemoryStore::new()),
            EventDispatcher::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_context_tracks_loaded_project_and_user() {
        let ctx = context();
        assert!(ctx.active_project().is_none());

        let project = Project::new("p1").with_collaborator("u1", Collaborator::with_roles(["LEADER"]));
        ctx.dispatcher().dispatch(EVENT_PROJECT_LOADED, project);
        assert_eq!(ctx.active_project().unwrap().id.as_deref(), Some("p1"));

        let user = UserProfile {
            id: Some("u1".into()),
            ..UserProfile::default()
        };
        ctx.dispatcher().dispatch(EVENT_USER_LOADED, user);
        assert!(ctx.current_user().is_some());

        ctx.dispatcher().dispatch(EVENT_TOKEN_EXPIRATION, EventDetail::None);
        assert!(ctx.current_user().is_none());
    }

    #[test]
    fn test_contexts_are_isolated() {
        let a = context();
        let b = context();
        a.dispatcher().dispatch(EVENT_PROJECT_LOADED, Project::new("only-a"));
        assert!(b.active_project().is_none());
    }

    #[test]
    fn test_session_uses_configured_token_key() {
        let store = Arc::new(MemoryStore::new());
        let config = Config {
            token_key: "altToken".into(),
            ..Config::default()
        };
        let ctx = TpenContext::with_parts(config, store.clone(), EventDispatcher::new()).unwrap();
        store
            .set("altToken", &token_expiring_at(4_000_000_000, "u7"))
            .unwrap();

        let authenticated = Arc::new(parking_lot::Mutex::new(0));
        let count = Arc::clone(&authenticated);
        ctx.dispatcher().on(
            EVENT_AUTHENTICATED,
            handler(move |_| {
                *count.lock() += 1;
                Ok(())
            }),
        );

        let session = ctx.session().unwrap().unwrap();
        assert_eq!(session.user_id.as_deref(), Some("u7"));
        assert_eq!(*authenticated.lock(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config {
            api_base: "not a url".into(),
            ..Config::default()
        };
        let result = TpenContext::with_parts(config, Arc::new(MemoryStore::new()), EventDispatcher::new());
        assert!(result.is_err());
    }
}
