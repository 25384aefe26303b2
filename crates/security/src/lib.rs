//! Credential and permission handling for tpen
//!
//! This crate provides:
//! - Token utilities that read an opaque bearer credential without verifying it
//! - Credential storage and the authenticator built on it
//! - The permission engine and the gates that apply it to interface elements

pub mod auth;
pub mod permissions;
pub mod store;
pub mod testing;
pub mod token;

pub use auth::{Authenticator, Session};
pub use permissions::{
    Decision, Entity, GateOutcome, GatedElement, MatchMode, Permission, PermissionEngine,
    PermissionError, PermissionGate, Segment,
};
pub use store::{CredentialStore, FileStore, MemoryStore};
pub use token::Claims;
