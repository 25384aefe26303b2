//! End-to-end flow: login redirect, authentication, permission evaluation

use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;
use tpen_core::constants::{EVENT_AUTHENTICATED, EVENT_PROJECT_LOADED, EVENT_TOKEN_EXPIRATION};
use tpen_core::events::handler;
use tpen_core::{Collaborator, EventDispatcher, Project};
use tpen_security::testing::token_expiring_at;
use tpen_security::{
    Authenticator, FileStore, GateOutcome, GatedElement, MatchMode, PermissionEngine,
    PermissionGate,
};

struct Button {
    name: String,
    view: &'static str,
    removed: Arc<Mutex<bool>>,
}

impl GatedElement for Button {
    fn name(&self) -> &str {
        &self.name
    }
    fn view_requirement(&self) -> Option<&str> {
        Some(self.view)
    }
    fn remove(&mut self) {
        *self.removed.lock() = true;
    }
    fn set_read_only(&mut self, _read_only: bool) {}
}

fn leader_project() -> Project {
    Project::new("6602f4a5")
        .with_role("LEADER", ["UPDATE_*_LINE"])
        .with_collaborator("u1", Collaborator::with_roles(["LEADER"]))
}

#[test]
fn redirect_then_authenticate_then_gate() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join("storage.json")));
    let dispatcher = EventDispatcher::new();
    let auth = Authenticator::new(store, Arc::clone(&dispatcher));

    let gate = PermissionGate::new(PermissionEngine::default());
    let delete_removed = Arc::new(Mutex::new(false));
    let update_removed = Arc::new(Mutex::new(false));
    gate.register(Box::new(Button {
        name: "delete-line".into(),
        view: "DELETE_*_LINE",
        removed: Arc::clone(&delete_removed),
    }));
    gate.register(Box::new(Button {
        name: "update-line".into(),
        view: "UPDATE_*_LINE",
        removed: Arc::clone(&update_removed),
    }));
    let _scope = gate.install(&dispatcher);

    let token = token_expiring_at(4_000_000_000, "u1");
    let redirect = format!("https://app.t-pen.org/?idToken={token}");
    auth.accept_redirect(&redirect).unwrap();

    let session = auth.authenticate_at(1_700_000_000_000).unwrap().unwrap();
    assert_eq!(session.user_id.as_deref(), Some("u1"));

    dispatcher.dispatch(EVENT_PROJECT_LOADED, leader_project());
    assert!(*delete_removed.lock());
    assert!(!*update_removed.lock());
    assert_eq!(gate.len(), 1);
}

#[test]
fn expired_session_announces_expiration_once() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join("storage.json")));
    let dispatcher = EventDispatcher::new();
    let auth = Authenticator::new(store, Arc::clone(&dispatcher));

    let events = Arc::new(Mutex::new(Vec::new()));
    for name in [EVENT_AUTHENTICATED, EVENT_TOKEN_EXPIRATION] {
        let sink = Arc::clone(&events);
        dispatcher.on(
            name,
            handler(move |e| {
                sink.lock().push(e.name.clone());
                Ok(())
            }),
        );
    }

    auth.store_token(&token_expiring_at(1_000, "u1")).unwrap();
    assert!(auth.authenticate_at(5_000_000).unwrap().is_none());
    assert!(auth.authenticate_at(5_000_000).unwrap().is_none());
    assert_eq!(*events.lock(), vec![EVENT_TOKEN_EXPIRATION.to_string()]);
}

#[test]
fn leader_scenario_by_token() {
    let engine = PermissionEngine::default();
    let project = leader_project();
    let token = token_expiring_at(4_000_000_000, "u1");

    let check = |permission: &str| {
        engine
            .evaluate_for_token(permission, Some(&project), Some(&token), MatchMode::Query)
            .is_allowed()
    };
    assert!(check("UPDATE_*_LINE"));
    assert!(!check("DELETE_*_LINE"));
    assert!(check("ANY_ANY_LINE"));
}

#[test]
fn gate_outcomes_are_reported_in_registration_order() {
    let gate = PermissionGate::new(PermissionEngine::default());
    gate.set_user(Some("u1".into()));
    for (name, view) in [("a", "UPDATE_*_LINE"), ("b", "DELETE_*_LINE")] {
        gate.register(Box::new(Button {
            name: name.into(),
            view,
            removed: Arc::new(Mutex::new(false)),
        }));
    }
    let outcomes: Vec<GateOutcome> = gate.apply(&leader_project()).into_iter().map(|(_, o)| o).collect();
    assert_eq!(outcomes, vec![GateOutcome::Visible, GateOutcome::Removed]);
}
