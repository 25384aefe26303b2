//! Shared utilities for tpen
//!
//! Logging setup, XDG locations and atomic file writes used by the other
//! workspace crates.

pub mod atomic_file;
pub mod tracing;
pub mod xdg;

pub use atomic_file::*;
pub use xdg::*;
