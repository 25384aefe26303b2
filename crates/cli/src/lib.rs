//! Command-line front end for the tpen core
//!
//! The binary is thin: it parses arguments, loads configuration and hands a
//! [`TpenContext`] to the selected command.

pub mod api;
pub mod commands;
pub mod context;

pub use api::ApiClient;
pub use commands::Commands;
pub use context::TpenContext;
