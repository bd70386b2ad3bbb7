//! Core type definitions for dynamic action providers

use crate::action::{Action, ActionMetadata, ActionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Metadata-only projection of a provider's actions
pub type DapMetadata = BTreeMap<ActionType, Vec<ActionMetadata>>;

/// The collection produced by one fetch: category -> ordered action handles
///
/// Order within a category is the order the fetch function returned.
#[derive(Debug, Clone, Default)]
pub struct DapValue {
    actions: BTreeMap<ActionType, Vec<Arc<Action>>>,
}

impl DapValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, appending to the category
    pub fn with_actions(
        mut self,
        action_type: ActionType,
        actions: impl IntoIterator<Item = Arc<Action>>,
    ) -> Self {
        self.insert(action_type, actions);
        self
    }

    /// Append actions to a category
    pub fn insert(&mut self, action_type: ActionType, actions: impl IntoIterator<Item = Arc<Action>>) {
        self.actions.entry(action_type).or_default().extend(actions);
    }

    /// Actions of a category, `None` if the category is absent
    pub fn get(&self, action_type: ActionType) -> Option<&[Arc<Action>]> {
        self.actions.get(&action_type).map(Vec::as_slice)
    }

    pub fn categories(&self) -> impl Iterator<Item = ActionType> + '_ {
        self.actions.keys().copied()
    }

    /// Every action handle, category by category
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Action>> {
        self.actions.values().flatten()
    }

    /// Total number of actions across categories
    pub fn len(&self) -> usize {
        self.actions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Project the collection to metadata only
    pub fn metadata(&self) -> DapMetadata {
        self.actions
            .iter()
            .map(|(t, actions)| (*t, actions.iter().map(|a| a.metadata().clone()).collect()))
            .collect()
    }
}

impl FromIterator<(ActionType, Vec<Arc<Action>>)> for DapValue {
    fn from_iter<I: IntoIterator<Item = (ActionType, Vec<Arc<Action>>)>>(iter: I) -> Self {
        let mut value = DapValue::new();
        for (action_type, actions) in iter {
            value.insert(action_type, actions);
        }
        value
    }
}

/// Counters for a provider's cache
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the held value
    pub hits: u64,

    /// Lookups that found the cache stale
    pub misses: u64,

    /// Fetches started
    pub fetches: u64,

    /// Stale lookups that joined a fetch already in flight
    pub joined: u64,

    /// Fetches that failed
    pub fetch_failures: u64,

    /// Explicit invalidations
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, fetches: {}, joined: {}, failures: {}, invalidations: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.fetches,
            self.joined,
            self.fetch_failures,
            self.invalidations
        )
    }
}

/// Point-in-time view of a provider's cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheStatus {
    /// Whether a value is held
    pub has_value: bool,

    /// Whether the next lookup would trigger or join a fetch
    pub is_stale: bool,

    /// Whether a fetch is currently running
    pub fetch_in_flight: bool,

    /// Number of actions in the held value
    pub action_count: usize,

    /// Configured TTL in milliseconds
    pub ttl_millis: i64,

    /// When the held value was last fetched
    pub last_fetched_at: Option<DateTime<Utc>>,

    /// When the held value expires
    pub expires_at: Option<DateTime<Utc>>,
}
