//! Client for the TPEN services API
//!
//! Only the two calls the core consumes: loading a project and loading the
//! authenticated user's profile. Results are announced on the dispatcher so
//! independently created components can react.

use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tpen_config::Config;
use tpen_core::constants::{EVENT_PROJECT_LOADED, EVENT_PROJECT_LOAD_FAILED, EVENT_USER_LOADED};
use tpen_core::events::LoadFailure;
use tpen_core::{Error, EventDispatcher, Project, Result, Toast, UserProfile};
use tracing::{debug, info, warn};

/// A failed call: the HTTP status when the service answered, and why
struct CallFailure {
    status: Option<StatusCode>,
    message: String,
}

impl CallFailure {
    fn new(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

pub struct ApiClient {
    client: reqwest::Client,
    config: Config,
    dispatcher: Arc<EventDispatcher>,
}

impl ApiClient {
    pub fn new(config: Config, dispatcher: Arc<EventDispatcher>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.vault.request_timeout_secs))
            .user_agent(concat!("tpen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::configuration(format!("HTTP client could not be built: {e}")))?;
        Ok(Self {
            client,
            config,
            dispatcher,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> std::result::Result<T, CallFailure> {
        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = request.send().await.map_err(|e| CallFailure::new(None, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                format!("{status}: {}", body.trim())
            };
            return Err(CallFailure::new(Some(status), message));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| CallFailure::new(Some(status), format!("unexpected response body: {e}")))
    }

    /// Load project `id` and dispatch `tpen-project-loaded`.
    ///
    /// On failure `tpen-project-load-failed` and an error toast are dispatched
    /// before the error is returned.
    pub async fn load_project(&self, id: &str, token: Option<&str>) -> Result<Arc<Project>> {
        let url = self.config.api_url(&format!("project/{id}"));
        debug!(url = %url, "Loading project");

        match self.get_json::<Project>(&url, token).await {
            Ok(mut project) => {
                if project.id.is_none() {
                    project.id = Some(id.to_string());
                }
                let project = Arc::new(project);
                info!(project = %project.display_label(), "Project loaded");
                self.dispatcher
                    .dispatch(EVENT_PROJECT_LOADED, Arc::clone(&project));
                Ok(project)
            }
            Err(CallFailure { status, message }) => {
                warn!(project_id = %id, status = ?status, error = %message, "Project load failed");
                self.dispatcher.dispatch(
                    EVENT_PROJECT_LOAD_FAILED,
                    LoadFailure {
                        project_id: Some(id.to_string()),
                        status: status.map(|s| s.as_u16()),
                        message: message.clone(),
                    },
                );
                self.dispatcher
                    .toast(Toast::error(format!("Project {id} could not be loaded: {message}")));
                Err(Error::network(url, message))
            }
        }
    }

    /// Load the authenticated user's profile and dispatch `tpen-user-loaded`
    pub async fn load_profile(&self, token: &str) -> Result<Arc<UserProfile>> {
        let url = self.config.api_url("my/profile");
        debug!(url = %url, "Loading profile");

        let profile: UserProfile = self
            .get_json(&url, Some(token))
            .await
            .map_err(|CallFailure { status, message }| match status {
                Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN) => {
                    Error::unauthenticated(message)
                }
                _ => Error::network(url.clone(), message),
            })?;
        let profile = Arc::new(profile);
        self.dispatcher
            .dispatch(EVENT_USER_LOADED, tpen_core::EventDetail::User(Arc::clone(&profile)));
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use tpen_core::constants::EVENT_TOAST;
    use tpen_core::events::handler;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, dispatcher: Arc<EventDispatcher>) -> ApiClient {
        let config = Config {
            api_base: server.uri(),
            ..Config::default()
        };
        ApiClient::new(config, dispatcher).unwrap()
    }

    fn record(dispatcher: &Arc<EventDispatcher>, names: &[&'static str]) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for name in names {
            let sink = Arc::clone(&seen);
            dispatcher.on(
                *name,
                handler(move |e| {
                    sink.lock().push(e.name.clone());
                    Ok(())
                }),
            );
        }
        seen
    }

    #[tokio::test]
    async fn test_load_project_dispatches_loaded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/p1"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "p1",
                "label": "Letters",
                "collaborators": { "u1": { "roles": ["LEADER"] } },
                "roles": { "LEADER": ["*_*_*"] }
            })))
            .mount(&server)
            .await;

        let dispatcher = EventDispatcher::new();
        let seen = record(&dispatcher, &[EVENT_PROJECT_LOADED, EVENT_PROJECT_LOAD_FAILED]);
        let project = client(&server, Arc::clone(&dispatcher))
            .load_project("p1", Some("tok"))
            .await
            .unwrap();

        assert_eq!(project.roles_of("u1"), ["LEADER".to_string()]);
        assert_eq!(*seen.lock(), vec![EVENT_PROJECT_LOADED.to_string()]);
    }

    #[tokio::test]
    async fn test_load_project_failure_dispatches_failed_and_toast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Project not found"))
            .mount(&server)
            .await;

        let dispatcher = EventDispatcher::new();
        let seen = record(&dispatcher, &[EVENT_PROJECT_LOADED, EVENT_PROJECT_LOAD_FAILED, EVENT_TOAST]);
        let result = client(&server, Arc::clone(&dispatcher))
            .load_project("missing", None)
            .await;

        assert!(matches!(result, Err(Error::Network { .. })));
        assert_eq!(
            *seen.lock(),
            vec![EVENT_PROJECT_LOAD_FAILED.to_string(), EVENT_TOAST.to_string()]
        );
    }

    #[tokio::test]
    async fn test_load_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/my/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "u1",
                "agent": "https://store.rerum.io/v1/id/u1",
                "profile": { "displayName": "Ada" }
            })))
            .mount(&server)
            .await;

        let dispatcher = EventDispatcher::new();
        let seen = record(&dispatcher, &[EVENT_USER_LOADED]);
        let profile = client(&server, Arc::clone(&dispatcher))
            .load_profile("tok")
            .await
            .unwrap();
        assert_eq!(profile.display_name(), Some("Ada"));
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_profile_is_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = client(&server, EventDispatcher::new()).load_profile("expired").await;
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));
    }
}
