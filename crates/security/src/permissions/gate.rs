//! Permission gates for interface elements
//!
//! An element may carry a view requirement, an edit requirement, or both.
//! When a project loads, an element whose view requirement is not met is
//! removed; one whose edit requirement is not met is made read-only but kept.
//! Gates evaluate once per `tpen-project-loaded` event.

use super::engine::PermissionEngine;
use crate::token;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tpen_core::constants::{EVENT_AUTHENTICATED, EVENT_PROJECT_LOADED, EVENT_USER_LOADED};
use tpen_core::events::handler;
use tpen_core::{EventDispatcher, Project, SubscriptionScope};
use tracing::{debug, info};

/// An element whose presence or editability depends on a permission
pub trait GatedElement: Send {
    fn name(&self) -> &str;

    /// Permission needed to see the element at all
    fn view_requirement(&self) -> Option<&str> {
        None
    }

    /// Permission needed to modify the element
    fn edit_requirement(&self) -> Option<&str> {
        None
    }

    /// Take the element out of the interface
    fn remove(&mut self);

    fn set_read_only(&mut self, read_only: bool);
}

/// What a gate did to one element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No requirement applied, or only a satisfied view requirement
    Visible,
    Removed,
    ReadOnly,
    Editable,
}

/// Holds gated elements and applies permissions to them when a project loads
pub struct PermissionGate {
    engine: PermissionEngine,
    elements: Mutex<Vec<Box<dyn GatedElement>>>,
    user_id: RwLock<Option<String>>,
}

impl PermissionGate {
    pub fn new(engine: PermissionEngine) -> Arc<Self> {
        Arc::new(Self {
            engine,
            elements: Mutex::new(Vec::new()),
            user_id: RwLock::new(None),
        })
    }

    pub fn register(&self, element: Box<dyn GatedElement>) {
        self.elements.lock().push(element);
    }

    pub fn len(&self) -> usize {
        self.elements.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.lock().is_empty()
    }

    pub fn set_user(&self, user_id: Option<String>) {
        debug!(user_id = ?user_id, "Permission gate user changed");
        *self.user_id.write() = user_id;
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.read().clone()
    }

    /// Evaluate every element against `project` once.
    ///
    /// Removed elements are dropped from the gate and never evaluated again.
    pub fn apply(&self, project: &Project) -> Vec<(String, GateOutcome)> {
        let user_id = self.user_id().unwrap_or_default();
        let mut elements = self.elements.lock();
        let mut outcomes = Vec::with_capacity(elements.len());

        elements.retain_mut(|element| {
            let outcome = self.gate_one(element.as_mut(), project, &user_id);
            outcomes.push((element.name().to_string(), outcome));
            outcome != GateOutcome::Removed
        });

        info!(
            project = %project.display_label(),
            elements = outcomes.len(),
            removed = outcomes.iter().filter(|(_, o)| *o == GateOutcome::Removed).count(),
            "Permission gates applied"
        );
        outcomes
    }

    fn gate_one(&self, element: &mut dyn GatedElement, project: &Project, user_id: &str) -> GateOutcome {
        if let Some(required) = element.view_requirement() {
            if !self.engine.permission_match(required, Some(project), user_id) {
                debug!(element = %element.name(), permission = %required, "View denied, removing");
                element.remove();
                return GateOutcome::Removed;
            }
        }

        match element.edit_requirement() {
            Some(required) => {
                let editable = self.engine.permission_match(required, Some(project), user_id);
                element.set_read_only(!editable);
                if editable {
                    GateOutcome::Editable
                } else {
                    GateOutcome::ReadOnly
                }
            }
            None => GateOutcome::Visible,
        }
    }

    /// Track the current user and apply the gates on every project load.
    ///
    /// The returned scope owns the registrations; dropping it detaches the gate.
    pub fn install(self: &Arc<Self>, dispatcher: &Arc<EventDispatcher>) -> SubscriptionScope {
        let mut scope = SubscriptionScope::new();

        let gate = Arc::downgrade(self);
        scope.add(dispatcher.subscribe(
            EVENT_AUTHENTICATED,
            handler(move |event| {
                if let (Some(gate), Some(credential)) = (gate.upgrade(), event.detail.as_credential()) {
                    let user_id = token::agent_iri_with_claim(credential, gate.engine.agent_claim())
                        .and_then(|agent| token::user_id_from_agent(&agent));
                    gate.set_user(user_id);
                }
                Ok(())
            }),
        ));

        let gate = Arc::downgrade(self);
        scope.add(dispatcher.subscribe(
            EVENT_USER_LOADED,
            handler(move |event| {
                if let (Some(gate), Some(user)) = (gate.upgrade(), event.detail.as_user()) {
                    if let Some(id) = &user.id {
                        gate.set_user(Some(id.clone()));
                    }
                }
                Ok(())
            }),
        ));

        let gate: Weak<Self> = Arc::downgrade(self);
        scope.add(dispatcher.subscribe(
            EVENT_PROJECT_LOADED,
            handler(move |event| {
                let Some(gate) = gate.upgrade() else {
                    return Ok(());
                };
                match event.detail.as_project() {
                    Some(project) => {
                        gate.apply(project);
                        Ok(())
                    }
                    None => Err(format!("{EVENT_PROJECT_LOADED} carried no project").into()),
                }
            }),
        ));

        scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::token_expiring_at;
    use tpen_core::{Collaborator, EventDetail};

    #[derive(Default)]
    struct ElementState {
        removed: bool,
        read_only: Option<bool>,
    }

    struct TestElement {
        name: &'static str,
        view: Option<&'static str>,
        edit: Option<&'static str>,
        state: Arc<Mutex<ElementState>>,
    }

    impl TestElement {
        fn boxed(
            name: &'static str,
            view: Option<&'static str>,
            edit: Option<&'static str>,
        ) -> (Box<dyn GatedElement>, Arc<Mutex<ElementState>>) {
            let state = Arc::new(Mutex::new(ElementState::default()));
            let element = Box::new(TestElement {
                name,
                view,
                edit,
                state: Arc::clone(&state),
            });
            (element, state)
        }
    }

    impl GatedElement for TestElement {
        fn name(&self) -> &str {
            self.name
        }
        fn view_requirement(&self) -> Option<&str> {
            self.view
        }
        fn edit_requirement(&self) -> Option<&str> {
            self.edit
        }
        fn remove(&mut self) {
            self.state.lock().removed = true;
        }
        fn set_read_only(&mut self, read_only: bool) {
            self.state.lock().read_only = Some(read_only);
        }
    }

    fn project() -> Project {
        Project::new("p1")
            .with_role("VIEWER", ["READ_*_*"])
            .with_collaborator("u1", Collaborator::with_roles(["VIEWER"]))
    }

    #[test]
    fn test_apply_removes_and_marks_read_only() {
        let gate = PermissionGate::new(PermissionEngine::default());
        gate.set_user(Some("u1".into()));

        let (hidden, hidden_state) = TestElement::boxed("delete-button", Some("DELETE_*_PROJECT"), None);
        let (locked, locked_state) = TestElement::boxed("line-editor", Some("READ_*_LINE"), Some("UPDATE_*_LINE"));
        let (plain, _) = TestElement::boxed("label", None, None);
        gate.register(hidden);
        gate.register(locked);
        gate.register(plain);

        let outcomes = gate.apply(&project());
        assert_eq!(
            outcomes,
            vec![
                ("delete-button".to_string(), GateOutcome::Removed),
                ("line-editor".to_string(), GateOutcome::ReadOnly),
                ("label".to_string(), GateOutcome::Visible),
            ]
        );
        assert!(hidden_state.lock().removed);
        assert!(!locked_state.lock().removed);
        assert_eq!(locked_state.lock().read_only, Some(true));
        assert_eq!(gate.len(), 2);
    }

    #[test]
    fn test_installed_gate_applies_once_per_project_load() {
        let dispatcher = EventDispatcher::new();
        let gate = PermissionGate::new(PermissionEngine::default());
        let (editor, state) = TestElement::boxed("line-editor", None, Some("READ_*_LINE"));
        gate.register(editor);
        let _scope = gate.install(&dispatcher);

        let token = token_expiring_at(4_000_000_000, "u1");
        dispatcher.dispatch(EVENT_AUTHENTICATED, EventDetail::Credential(token));
        assert_eq!(gate.user_id().as_deref(), Some("u1"));
        assert_eq!(state.lock().read_only, None);

        dispatcher.dispatch(EVENT_PROJECT_LOADED, project());
        assert_eq!(state.lock().read_only, Some(false));
    }

    #[test]
    fn test_dropping_scope_detaches_gate() {
        let dispatcher = EventDispatcher::new();
        let gate = PermissionGate::new(PermissionEngine::default());
        let scope = gate.install(&dispatcher);
        assert_eq!(dispatcher.listener_count(EVENT_PROJECT_LOADED), 1);
        drop(scope);
        assert_eq!(dispatcher.listener_count(EVENT_PROJECT_LOADED), 0);
        assert_eq!(dispatcher.listener_count(EVENT_AUTHENTICATED), 0);
    }

    #[test]
    fn test_project_event_without_project_is_reported() {
        let dispatcher = EventDispatcher::new();
        let gate = PermissionGate::new(PermissionEngine::default());
        let _scope = gate.install(&dispatcher);
        let report = dispatcher.dispatch(EVENT_PROJECT_LOADED, EventDetail::None);
        assert_eq!(report.failed, 1);
    }
}
