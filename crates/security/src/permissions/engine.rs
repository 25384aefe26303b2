//! Role-based permission evaluation against a loaded project

use super::matcher::{permission_matches, MatchMode};
use super::permission::Permission;
use crate::token;
use std::collections::HashSet;
use std::fmt;
use tpen_core::constants::DEFAULT_AGENT_CLAIM;
use tpen_core::Project;
use tpen_utils::tracing::permission_span;
use tracing::{debug, trace};

/// Result of one evaluation, with the rule that decided it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The requested permission is not one well-formed triple
    Malformed { reason: String },
    /// No project to evaluate against
    NoProject,
    /// The requested entity is outside the recognised set
    UnknownEntity { entity: String },
    /// The user holds no permissions in the project
    NoPermissions,
    /// A granted permission satisfied the request
    Granted { by: String },
    /// The user has permissions but none satisfies the request
    Denied,
}

impl Decision {
    /// Malformed input, a missing project and unknown entities all allow
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::NoPermissions | Decision::Denied)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Malformed { reason } => write!(f, "allowed: malformed permission ({reason})"),
            Decision::NoProject => f.write_str("allowed: no project loaded"),
            Decision::UnknownEntity { entity } => write!(f, "allowed: unrecognised entity '{entity}'"),
            Decision::NoPermissions => f.write_str("denied: user holds no permissions"),
            Decision::Granted { by } => write!(f, "allowed: granted by {by}"),
            Decision::Denied => f.write_str("denied: no granted permission matches"),
        }
    }
}

/// Decides whether a user's role permissions in a project satisfy a request
#[derive(Debug, Clone)]
pub struct PermissionEngine {
    agent_claim: String,
}

impl Default for PermissionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT_CLAIM)
    }
}

impl PermissionEngine {
    /// `agent_claim` is the fallback claim key used to find a token's user id
    pub fn new(agent_claim: impl Into<String>) -> Self {
        Self {
            agent_claim: agent_claim.into(),
        }
    }

    pub fn agent_claim(&self) -> &str {
        &self.agent_claim
    }

    /// Union of the permissions granted by every role `user_id` holds,
    /// duplicates removed, first occurrence kept. Unknown roles grant nothing.
    pub fn user_permissions(&self, project: &Project, user_id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut permissions = Vec::new();
        for role in project.roles_of(user_id) {
            let Some(granted) = project.permissions_of_role(role) else {
                trace!(role = %role, "Role not defined in project");
                continue;
            };
            for permission in granted {
                if seen.insert(permission.as_str()) {
                    permissions.push(permission.clone());
                }
            }
        }
        permissions
    }

    /// Evaluate `required` for `user_id` and report which rule decided
    pub fn evaluate(
        &self,
        required: &str,
        project: Option<&Project>,
        user_id: &str,
        mode: MatchMode,
    ) -> Decision {
        let _span = permission_span(required, Some(user_id)).entered();

        let requested = match Permission::parse(required) {
            Ok(permission) => permission,
            Err(e) => {
                debug!(error = %e, "Malformed permission, allowing");
                return Decision::Malformed {
                    reason: e.to_string(),
                };
            }
        };

        let Some(project) = project else {
            debug!("No project, allowing");
            return Decision::NoProject;
        };

        if requested.known_entity().is_none() {
            debug!(entity = %requested.entity, "Unrecognised entity, allowing");
            return Decision::UnknownEntity {
                entity: requested.entity.to_string(),
            };
        }

        let granted = self.user_permissions(project, user_id);
        if granted.is_empty() {
            debug!(project = %project.display_label(), "User holds no permissions");
            return Decision::NoPermissions;
        }

        for raw in &granted {
            let candidate = match Permission::parse(raw) {
                Ok(candidate) => candidate,
                Err(e) => {
                    trace!(granted = %raw, error = %e, "Skipping malformed granted permission");
                    continue;
                }
            };
            if permission_matches(&requested, &candidate, mode) {
                debug!(granted = %raw, "Permission granted");
                return Decision::Granted { by: raw.clone() };
            }
        }

        debug!(granted = granted.len(), "Permission denied");
        Decision::Denied
    }

    /// Query-mode check: a granted `ANY` matches any requested value
    pub fn permission_match(&self, required: &str, project: Option<&Project>, user_id: &str) -> bool {
        self.evaluate(required, project, user_id, MatchMode::Query)
            .is_allowed()
    }

    /// Minimum-permission check: only the requested side may use `ANY`
    pub fn min_permissions_check(
        &self,
        required: &str,
        project: Option<&Project>,
        user_id: &str,
    ) -> bool {
        self.evaluate(required, project, user_id, MatchMode::Minimum)
            .is_allowed()
    }

    /// Evaluate for the user a credential names. A missing or unreadable
    /// credential evaluates as a user with no permissions.
    pub fn evaluate_for_token(
        &self,
        required: &str,
        project: Option<&Project>,
        token: Option<&str>,
        mode: MatchMode,
    ) -> Decision {
        let user_id = token
            .and_then(|t| token::agent_iri_with_claim(t, &self.agent_claim))
            .and_then(|agent| token::user_id_from_agent(&agent))
            .unwrap_or_default();
        self.evaluate(required, project, &user_id, mode)
    }
}
