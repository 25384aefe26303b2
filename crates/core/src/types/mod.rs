//! Domain types shared across tpen crates

pub mod project;
pub mod toast;
pub mod user;

pub use project::{Collaborator, Project};
pub use toast::{Toast, ToastStatus};
pub use user::UserProfile;
