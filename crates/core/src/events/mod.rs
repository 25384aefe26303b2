//! Event system for decoupled components
//!
//! Independently created components communicate by dispatching named events
//! (`tpen-project-loaded`, `tpen-authenticated`, `tpen-toast`, ...) instead of
//! holding references to each other. Dispatch is synchronous and
//! fire-and-forget: nothing is queued, and a listener registered after a
//! dispatch never sees it.

pub mod dispatcher;
pub mod event;
pub mod global;
pub mod subscription;

pub use dispatcher::{
    handler, DispatchReport, EventDispatcher, Handler, HandlerError, HandlerResult, ListenerId,
};
pub use event::{Event, EventDetail, LoadFailure, ResourceFailure};
pub use global::{dispatch_global, global_dispatcher};
pub use subscription::{Subscription, SubscriptionScope};
