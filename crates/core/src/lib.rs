//! Core domain types, errors, and events for the `tpen` workspace.
//!
//! ## Key Components
//!
//! - **`errors`**: the primary `Error` enum and `Result` alias shared by every
//!   crate in the workspace.
//! - **`events`**: the synchronous publish/subscribe dispatcher used to
//!   decouple independently created components.
//! - **`types`**: project, user and toast records exchanged through events.
//! - **`constants`**: storage keys, claim names, event names and environment
//!   variable names.

pub mod constants;
pub mod errors;
pub mod events;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result, ResultExt},
    events::{Event, EventDetail, EventDispatcher, Subscription, SubscriptionScope},
    types::*,
};
