//! Project records as consumed by permission evaluation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A user's membership in a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collaborator {
    /// Role names held by the user; each should be a key of `Project::roles`
    #[serde(default)]
    pub roles: Vec<String>,
    /// Display information, passed through untouched
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub profile: Map<String, Value>,
}

impl Collaborator {
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            profile: Map::new(),
        }
    }

    /// Display name from the profile, if any
    pub fn display_name(&self) -> Option<&str> {
        self.profile.get("displayName").and_then(Value::as_str)
    }
}

/// A transcription project, keyed by an opaque id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, rename = "_id", alias = "id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// User id -> membership
    #[serde(default)]
    pub collaborators: HashMap<String, Collaborator>,
    /// Role name -> permission strings
    #[serde(default)]
    pub roles: HashMap<String, Vec<String>>,
    /// Fields this crate does not interpret (layers, manifest, metadata, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Builder-style helper to add a role definition
    pub fn with_role<I, S>(mut self, role: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.insert(
            role.into(),
            permissions.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Builder-style helper to add a collaborator
    pub fn with_collaborator(mut self, user_id: impl Into<String>, member: Collaborator) -> Self {
        self.collaborators.insert(user_id.into(), member);
        self
    }

    pub fn collaborator(&self, user_id: &str) -> Option<&Collaborator> {
        self.collaborators.get(user_id)
    }

    /// Roles held by `user_id`; empty when the user is not a collaborator
    pub fn roles_of(&self, user_id: &str) -> &[String] {
        self.collaborators
            .get(user_id)
            .map(|c| c.roles.as_slice())
            .unwrap_or(&[])
    }

    /// Permission strings granted by `role`, if the role is defined
    pub fn permissions_of_role(&self, role: &str) -> Option<&[String]> {
        self.roles.get(role).map(Vec::as_slice)
    }

    /// Human-readable name for logs
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unnamed project>")
    }
}
