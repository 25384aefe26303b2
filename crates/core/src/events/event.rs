//! Event values and their typed payloads

use crate::types::{Project, Toast, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::SystemTime;

/// Why a project could not be loaded (`tpen-project-load-failed`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub project_id: Option<String>,
    /// HTTP status when the service answered
    pub status: Option<u16>,
    pub message: String,
}

/// A resource the vault could not provide (`tpen-vault-error`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFailure {
    pub uri: String,
    pub kind: String,
    /// Tag supplied by the component that asked for the resource
    pub requester: Option<String>,
    pub reason: String,
}

/// Payload carried by an event, exposed to handlers as `Event::detail`
#[derive(Debug, Clone, Default)]
pub enum EventDetail {
    #[default]
    None,
    Project(Arc<Project>),
    User(Arc<UserProfile>),
    Credential(String),
    Toast(Toast),
    LoadFailure(LoadFailure),
    ResourceFailure(ResourceFailure),
    Json(Value),
}

impl EventDetail {
    pub fn is_none(&self) -> bool {
        matches!(self, EventDetail::None)
    }

    pub fn as_project(&self) -> Option<&Arc<Project>> {
        match self {
            EventDetail::Project(project) => Some(project),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&Arc<UserProfile>> {
        match self {
            EventDetail::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn as_credential(&self) -> Option<&str> {
        match self {
            EventDetail::Credential(token) => Some(token),
            _ => None,
        }
    }

    pub fn as_toast(&self) -> Option<&Toast> {
        match self {
            EventDetail::Toast(toast) => Some(toast),
            _ => None,
        }
    }

    pub fn as_load_failure(&self) -> Option<&LoadFailure> {
        match self {
            EventDetail::LoadFailure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn as_resource_failure(&self) -> Option<&ResourceFailure> {
        match self {
            EventDetail::ResourceFailure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            EventDetail::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Project> for EventDetail {
    fn from(project: Project) -> Self {
        EventDetail::Project(Arc::new(project))
    }
}

impl From<Arc<Project>> for EventDetail {
    fn from(project: Arc<Project>) -> Self {
        EventDetail::Project(project)
    }
}

impl From<UserProfile> for EventDetail {
    fn from(user: UserProfile) -> Self {
        EventDetail::User(Arc::new(user))
    }
}

impl From<Toast> for EventDetail {
    fn from(toast: Toast) -> Self {
        EventDetail::Toast(toast)
    }
}

impl From<LoadFailure> for EventDetail {
    fn from(failure: LoadFailure) -> Self {
        EventDetail::LoadFailure(failure)
    }
}

impl From<ResourceFailure> for EventDetail {
    fn from(failure: ResourceFailure) -> Self {
        EventDetail::ResourceFailure(failure)
    }
}

impl From<Value> for EventDetail {
    fn from(value: Value) -> Self {
        EventDetail::Json(value)
    }
}

/// A named signal delivered to every handler registered for `name`
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub detail: EventDetail,
    /// Timestamp when the event was dispatched
    pub timestamp: SystemTime,
}

impl Event {
    pub fn new(name: impl Into<String>, detail: impl Into<EventDetail>) -> Self {
        Self {
            name: name.into(),
            detail: detail.into(),
            timestamp: SystemTime::now(),
        }
    }
}
