//! # Actions
//!
//! Named, typed, invocable units and the registry that holds them.
//!
//! - `types`: action categories, metadata and descriptors
//! - `handle`: the invocable [`Action`] and its [`ActionKind`] variants
//! - `registry`: [`ActionRegistry`] with lookup, resolution and invocation

pub mod handle;
pub mod registry;
pub mod types;

pub use handle::{Action, ActionHandler, ActionKind};
pub use registry::ActionRegistry;
pub use types::{ActionDescriptor, ActionMetadata, ActionType};
