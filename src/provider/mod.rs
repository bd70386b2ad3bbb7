//! # Dynamic Action Providers
//!
//! A dynamic action provider is a registry entry whose actions are fetched
//! lazily from an external source and cached for a time-to-live.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: the fetched set is reused until the TTL elapses
//!   (3 seconds by default, always stale when negative)
//! - **Single-Flight Refresh**: concurrent lookups on a stale cache share one fetch
//! - **All-or-Nothing Commit**: a failed fetch leaves the cache empty and is
//!   reported to every waiter
//! - **Registry Publishing**: fetched actions become resolvable through the registry
//!
//! ## Example
//!
//! ```rust
//! use ouroboros_actions::{
//!     define_dynamic_action_provider, Action, ActionDescriptor, ActionRegistry, ActionType,
//!     DapConfig, DapValue,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = ActionRegistry::new();
//!
//! let config = DapConfig::builder("remote-tools").ttl_millis(10_000).build();
//! let provider = define_dynamic_action_provider(&registry, config, || async {
//!     let echo = Action::new(ActionDescriptor::new(ActionType::Tool, "echo"), |input| async move {
//!         Ok(json!({ "echo": input }))
//!     });
//!     Ok::<_, anyhow::Error>(DapValue::new().with_actions(ActionType::Tool, vec![Arc::new(echo)]))
//! })
//! .await?;
//!
//! let tools = provider.list_action_metadata(ActionType::Tool, "*").await?;
//! assert_eq!(tools[0].name, "echo");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod dynamic;
pub mod pattern;
pub mod types;

pub use cache::RefreshableCache;
pub use config::{DapCacheConfig, DapConfig, DapConfigBuilder, DEFAULT_TTL_MILLIS};
pub use dynamic::{
    define_dynamic_action_provider, is_dynamic_action_provider, DynamicActionProvider,
    DYNAMIC_ACTION_PROVIDER_TYPE,
};
pub use pattern::NamePattern;
pub use types::{CacheStats, CacheStatus, DapMetadata, DapValue};
