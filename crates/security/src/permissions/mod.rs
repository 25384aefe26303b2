//! Permission Engine
//!
//! Parses `ACTION_SCOPE_ENTITY` permissions once, matches them segment by
//! segment, and aggregates a user's permissions from their project roles.
//! Malformed requests, a missing project and unrecognised entities all
//! evaluate as allowed; an empty permission set is the one case that denies
//! without looking at the request.

pub mod engine;
pub mod gate;
pub mod matcher;
pub mod permission;

pub use engine::{Decision, PermissionEngine};
pub use gate::{GateOutcome, GatedElement, PermissionGate};
pub use matcher::{permission_matches, segment_matches, MatchMode};
pub use permission::{Entity, Permission, PermissionError, Segment};
