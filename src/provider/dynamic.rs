//! Dynamic action provider facade
//!
//! Wraps a [`RefreshableCache`] with lookup, pattern listing and invalidation,
//! and registers itself in the [`ActionRegistry`] as an action of type
//! `dynamic-action-provider`.

use crate::action::{Action, ActionDescriptor, ActionKind, ActionMetadata, ActionRegistry, ActionType};
use crate::error::{BoxError, Result};
use crate::provider::cache::RefreshableCache;
use crate::provider::config::DapConfig;
use crate::provider::pattern::NamePattern;
use crate::provider::types::{CacheStats, CacheStatus, DapMetadata, DapValue};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Reserved value of the `type` metadata key on provider actions
pub const DYNAMIC_ACTION_PROVIDER_TYPE: &str = "dynamic-action-provider";

/// A registry entry serving a lazily fetched, TTL-cached set of actions
#[derive(Clone)]
pub struct DynamicActionProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    config: DapConfig,
    cache: RefreshableCache,
}

impl DynamicActionProvider {
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn config(&self) -> &DapConfig {
        &self.inner.config
    }

    /// First action of the category with the given name
    ///
    /// An absent category or name is `Ok(None)`, not an error.
    pub async fn get_action(&self, action_type: ActionType, name: &str) -> Result<Option<Arc<Action>>> {
        self.find_action(Some(action_type), name).await
    }

    /// Metadata of the category's actions matching `pattern`
    ///
    /// `*` lists everything, a trailing `*` matches by prefix and anything
    /// else matches the exact name. An absent category yields an empty list.
    pub async fn list_action_metadata(
        &self,
        action_type: ActionType,
        pattern: &str,
    ) -> Result<Vec<ActionMetadata>> {
        self.list_matching(Some(action_type), pattern).await
    }

    /// Like [`get_action`](Self::get_action), with the category as a string
    ///
    /// An unknown category string is treated as an absent category, after
    /// the fetch, so fetch failures still surface.
    pub async fn get_action_by_str(&self, action_type: &str, name: &str) -> Result<Option<Arc<Action>>> {
        self.find_action(self.parse_category(action_type), name).await
    }

    /// Like [`list_action_metadata`](Self::list_action_metadata), with the category as a string
    pub async fn list_action_metadata_by_str(
        &self,
        action_type: &str,
        pattern: &str,
    ) -> Result<Vec<ActionMetadata>> {
        self.list_matching(self.parse_category(action_type), pattern).await
    }

    fn parse_category(&self, action_type: &str) -> Option<ActionType> {
        let parsed = action_type.parse::<ActionType>().ok();
        if parsed.is_none() {
            debug!("Unknown action type '{}' requested from '{}'", action_type, self.name());
        }
        parsed
    }

    async fn find_action(&self, action_type: Option<ActionType>, name: &str) -> Result<Option<Arc<Action>>> {
        let value = self.inner.cache.get_or_fetch().await?;

        Ok(action_type
            .and_then(|action_type| value.get(action_type))
            .and_then(|actions| actions.iter().find(|a| a.name() == name))
            .cloned())
    }

    async fn list_matching(
        &self,
        action_type: Option<ActionType>,
        pattern: &str,
    ) -> Result<Vec<ActionMetadata>> {
        let value = self.inner.cache.get_or_fetch().await?;
        let pattern = NamePattern::parse(pattern);

        Ok(action_type
            .and_then(|action_type| value.get(action_type))
            .map(|actions| {
                actions
                    .iter()
                    .filter(|a| pattern.matches(a.name()))
                    .map(|a| a.metadata().clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Metadata of every cached action, grouped by category
    pub async fn list_all_metadata(&self) -> Result<DapMetadata> {
        Ok(self.inner.cache.get_or_fetch().await?.metadata())
    }

    /// Force the next lookup to refetch
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.inner.cache.status()
    }
}

impl fmt::Debug for DynamicActionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicActionProvider")
            .field("name", &self.inner.config.name)
            .field("cache", &self.inner.cache)
            .finish()
    }
}

/// Handler of the provider action: normalizes a DapValue projection
async fn project_metadata(input: Value) -> Result<Value> {
    let metadata: DapMetadata = serde_json::from_value(input)?;
    Ok(serde_json::to_value(metadata)?)
}

/// Whether an action is a dynamic action provider
pub fn is_dynamic_action_provider(action: &Action) -> bool {
    matches!(action.kind(), ActionKind::DynamicProvider(_))
}

/// Define a dynamic action provider and register it
///
/// `config` is either a plain name or a full [`DapConfig`]. The registered
/// action, when run with a JSON projection of a [`DapValue`], returns the
/// metadata-only mapping of it. Lookups go through the returned provider.
pub async fn define_dynamic_action_provider<F, Fut, E>(
    registry: &Arc<ActionRegistry>,
    config: impl Into<DapConfig>,
    fetch: F,
) -> Result<DynamicActionProvider>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<DapValue, E>> + Send + 'static,
    E: Into<BoxError>,
{
    let config: DapConfig = config.into();
    config.validate()?;

    let ttl_millis = config.effective_ttl_millis();
    let cache = RefreshableCache::new(config.name.clone(), Arc::downgrade(registry), ttl_millis, fetch);
    let provider = DynamicActionProvider {
        inner: Arc::new(ProviderInner {
            config: config.clone(),
            cache,
        }),
    };

    let mut descriptor = ActionDescriptor::new(ActionType::DynamicActionProvider, config.name.clone());
    descriptor.description = config.description.clone();
    descriptor.metadata = config.metadata.clone().unwrap_or_default();
    descriptor
        .metadata
        .insert("type".to_string(), Value::from(DYNAMIC_ACTION_PROVIDER_TYPE));

    let action = Action::new(descriptor, project_metadata)
        .with_kind(ActionKind::DynamicProvider(provider.clone()));

    registry.register_action(Arc::new(action)).await;
    info!(
        "Defined dynamic action provider '{}' (ttl: {}ms)",
        config.name, ttl_millis
    );

    Ok(provider)
}
