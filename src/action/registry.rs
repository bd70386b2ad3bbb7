//! Action registry
//!
//! Holds registered actions keyed by category and name. Dynamic action
//! providers register themselves here like any other action, and publish the
//! actions they fetch so those become directly resolvable too.

use crate::action::handle::Action;
use crate::action::types::{ActionDescriptor, ActionMetadata, ActionType};
use crate::error::{ActionError, Result};
use crate::provider::{is_dynamic_action_provider, DynamicActionProvider};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

type ActionKey = (ActionType, String);

/// Registry of invocable actions
///
/// This implementation provides:
/// - Thread-safe async access via RwLock
/// - Direct lookup by category and name
/// - Fallback resolution through registered dynamic action providers
#[derive(Default)]
pub struct ActionRegistry {
    actions: RwLock<BTreeMap<ActionKey, Arc<Action>>>,
}

impl ActionRegistry {
    /// Create an empty registry
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Define a standard action and register it
    pub async fn define_action<F, Fut>(
        &self,
        descriptor: ActionDescriptor,
        handler: F,
    ) -> Arc<Action>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let action = Arc::new(Action::new(descriptor, handler));
        self.register_action(action.clone()).await;
        action
    }

    /// Publish an action, replacing any action registered under the same key
    pub async fn register_action(&self, action: Arc<Action>) {
        let key = (action.action_type(), action.name().to_string());
        let mut actions = self.actions.write().await;

        if actions.insert(key, action.clone()).is_some() {
            debug!("Replaced registered action: {}", action.metadata().key());
        } else {
            debug!("Registered action: {}", action.metadata().key());
        }
    }

    /// Publish a batch of actions under a single write lock
    pub(crate) async fn register_actions<'a, I>(&self, batch: I) -> usize
    where
        I: IntoIterator<Item = &'a Arc<Action>>,
    {
        let mut actions = self.actions.write().await;
        let mut count = 0;

        for action in batch {
            let key = (action.action_type(), action.name().to_string());
            actions.insert(key, action.clone());
            count += 1;
        }

        count
    }

    /// Look up a directly registered action
    pub async fn lookup_action(&self, action_type: ActionType, name: &str) -> Option<Arc<Action>> {
        let actions = self.actions.read().await;
        actions.get(&(action_type, name.to_string())).cloned()
    }

    /// Resolve an action, falling back to the registered dynamic providers
    ///
    /// Providers are asked in key order; the first one that knows the action
    /// wins. A provider whose fetch fails aborts the resolution with that error.
    pub async fn resolve_action(
        &self,
        action_type: ActionType,
        name: &str,
    ) -> Result<Option<Arc<Action>>> {
        if let Some(action) = self.lookup_action(action_type, name).await {
            return Ok(Some(action));
        }

        for provider in self.dynamic_action_providers().await {
            if let Some(action) = provider.get_action(action_type, name).await? {
                debug!(
                    "Resolved /{}/{} through dynamic action provider '{}'",
                    action_type,
                    name,
                    provider.name()
                );
                return Ok(Some(action));
            }
        }

        Ok(None)
    }

    /// Resolve and invoke an action
    pub async fn run_action(&self, action_type: ActionType, name: &str, input: Value) -> Result<Value> {
        match self.resolve_action(action_type, name).await? {
            Some(action) => action.run(input).await,
            None => {
                warn!("Attempted to run unknown action /{}/{}", action_type, name);
                Err(ActionError::NotFound {
                    action_type,
                    name: name.to_string(),
                })
            }
        }
    }

    /// Metadata of every directly registered action, in key order
    pub async fn list_actions(&self) -> Vec<ActionMetadata> {
        let actions = self.actions.read().await;
        actions.values().map(|a| a.metadata().clone()).collect()
    }

    /// All registered dynamic action providers
    pub async fn dynamic_action_providers(&self) -> Vec<DynamicActionProvider> {
        let actions = self.actions.read().await;
        actions
            .values()
            .filter(|a| is_dynamic_action_provider(a))
            .filter_map(|a| a.as_dynamic_provider().cloned())
            .collect()
    }

    /// Remove an action from the registry
    pub async fn unregister_action(&self, action_type: ActionType, name: &str) -> Option<Arc<Action>> {
        let mut actions = self.actions.write().await;
        let removed = actions.remove(&(action_type, name.to_string()));
        if removed.is_some() {
            info!("Unregistered action /{}/{}", action_type, name);
        }
        removed
    }

    /// Number of directly registered actions
    pub async fn len(&self) -> usize {
        self.actions.read().await.len()
    }

    /// Check if the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.actions.read().await.is_empty()
    }
}
