//! # Ouroboros Actions (ouroboros-actions)
//!
//! Action registry with dynamic action providers for agent tooling.
//!
//! ## Features
//!
//! - Typed action handles with async JSON handlers
//! - Registry lookup, resolution and invocation by category and name
//! - Dynamic action providers that fetch their actions lazily
//! - TTL caching with single-flight refresh and forced invalidation
//! - Prefix and wildcard metadata listings
//!
//! ## Resolving Through a Provider
//!
//! Actions fetched by a provider are published into the registry, and the
//! registry falls back to its providers when a direct lookup misses.
//!
//! ```no_run
//! use ouroboros_actions::{
//!     define_dynamic_action_provider, Action, ActionDescriptor, ActionRegistry, ActionType,
//!     DapValue,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = ActionRegistry::new();
//!
//!     define_dynamic_action_provider(&registry, "weather", || async {
//!         let forecast = Action::new(
//!             ActionDescriptor::new(ActionType::Tool, "forecast"),
//!             |_| async { Ok(json!("sunny")) },
//!         );
//!         Ok::<_, anyhow::Error>(
//!             DapValue::new().with_actions(ActionType::Tool, vec![Arc::new(forecast)]),
//!         )
//!     })
//!     .await?;
//!
//!     let output = registry
//!         .run_action(ActionType::Tool, "forecast", json!({}))
//!         .await?;
//!     println!("Forecast: {}", output);
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod error;
pub mod provider;

// Re-export main types for convenience
pub use action::{Action, ActionDescriptor, ActionHandler, ActionKind, ActionMetadata, ActionRegistry, ActionType};
pub use error::{ActionError, BoxError, Result};
pub use provider::{
    define_dynamic_action_provider, is_dynamic_action_provider, CacheStats, CacheStatus,
    DapCacheConfig, DapConfig, DapConfigBuilder, DapMetadata, DapValue, DynamicActionProvider,
    NamePattern, RefreshableCache, DEFAULT_TTL_MILLIS,
};
