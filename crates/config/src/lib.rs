//! Configuration loading for tpen
//!
//! Produces the immutable [`Config`] shared by the credential store, the
//! resource cache and the API client.

pub mod config;
pub mod loader;

pub use config::{Config, VaultSettings};
pub use loader::ConfigLoader;
