//! Configuration for dynamic action providers

use crate::error::{ActionError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;

/// TTL applied when none (or zero) is configured
pub const DEFAULT_TTL_MILLIS: i64 = 3_000;

/// Environment variable read by [`DapCacheConfig::from_env`]
pub const TTL_ENV_VAR: &str = "OUROBOROS_DAP_TTL_MILLIS";

/// Cache settings of a provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DapCacheConfig {
    /// Time-to-live of the cached actions in milliseconds
    ///
    /// `None` or `0` selects [`DEFAULT_TTL_MILLIS`]. A negative value makes
    /// the cache always stale, so every lookup refetches.
    #[serde(default)]
    pub ttl_millis: Option<i64>,
}

impl DapCacheConfig {
    pub fn with_ttl_millis(ttl_millis: i64) -> Self {
        Self {
            ttl_millis: Some(ttl_millis),
        }
    }

    /// Read the TTL from `OUROBOROS_DAP_TTL_MILLIS`, ignoring unparsable values
    pub fn from_env() -> Self {
        Self {
            ttl_millis: env::var(TTL_ENV_VAR).ok().and_then(|v| v.trim().parse().ok()),
        }
    }

    /// TTL actually used by the cache
    pub fn effective_ttl_millis(&self) -> i64 {
        match self.ttl_millis {
            None | Some(0) => DEFAULT_TTL_MILLIS,
            Some(ttl) => ttl,
        }
    }
}

/// Configuration of a dynamic action provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DapConfig {
    /// Provider name, also the name of its registry action
    pub name: String,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Cache settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_config: Option<DapCacheConfig>,

    /// Extra metadata merged into the provider action's metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl DapConfig {
    /// Create a config with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a new builder for provider configuration
    pub fn builder(name: impl Into<String>) -> DapConfigBuilder {
        DapConfigBuilder {
            config: Self::new(name),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ActionError::ConfigError(
                "dynamic action provider name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// TTL actually used by the cache
    pub fn effective_ttl_millis(&self) -> i64 {
        self.cache_config
            .as_ref()
            .map(DapCacheConfig::effective_ttl_millis)
            .unwrap_or(DEFAULT_TTL_MILLIS)
    }
}

impl From<&str> for DapConfig {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DapConfig {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Builder for provider configuration
#[derive(Debug)]
pub struct DapConfigBuilder {
    config: DapConfig,
}

impl DapConfigBuilder {
    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.config.description = Some(description.into());
        self
    }

    /// Set the cache TTL in milliseconds
    pub fn ttl_millis(mut self, ttl_millis: i64) -> Self {
        self.config.cache_config = Some(DapCacheConfig::with_ttl_millis(ttl_millis));
        self
    }

    /// Set the whole cache configuration
    pub fn cache_config(mut self, cache_config: DapCacheConfig) -> Self {
        self.config.cache_config = Some(cache_config);
        self
    }

    /// Add a metadata entry
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config
            .metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Build the configuration
    pub fn build(self) -> DapConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_ttl() {
        assert_eq!(DapConfig::new("p").effective_ttl_millis(), 3_000);
        assert_eq!(DapCacheConfig::default().effective_ttl_millis(), 3_000);
        assert_eq!(DapCacheConfig::with_ttl_millis(0).effective_ttl_millis(), 3_000);
    }

    #[test]
    fn test_explicit_and_negative_ttl() {
        assert_eq!(DapCacheConfig::with_ttl_millis(100).effective_ttl_millis(), 100);
        assert_eq!(DapCacheConfig::with_ttl_millis(-1).effective_ttl_millis(), -1);
    }

    #[test]
    fn test_from_name() {
        let config: DapConfig = "mcp-tools".into();
        assert_eq!(config.name, "mcp-tools");
        assert!(config.description.is_none());
        assert!(config.cache_config.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = DapConfig::builder("remote")
            .description("Remote tools")
            .ttl_millis(250)
            .metadata("owner", json!("ops"))
            .build();

        assert_eq!(config.description.as_deref(), Some("Remote tools"));
        assert_eq!(config.effective_ttl_millis(), 250);
        assert_eq!(config.metadata.unwrap().get("owner"), Some(&json!("ops")));
    }

    #[test]
    fn test_config_validation() {
        assert!(DapConfig::new("ok").validate().is_ok());
        assert!(DapConfig::new("  ").validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: DapConfig =
            serde_json::from_value(json!({"name": "p", "cache_config": {}})).unwrap();
        assert_eq!(config.cache_config, Some(DapCacheConfig { ttl_millis: None }));
        assert_eq!(config.effective_ttl_millis(), DEFAULT_TTL_MILLIS);
    }

    #[test]
    fn test_from_env() {
        env::set_var(TTL_ENV_VAR, "750");
        assert_eq!(DapCacheConfig::from_env().effective_ttl_millis(), 750);

        env::set_var(TTL_ENV_VAR, "not-a-number");
        assert_eq!(DapCacheConfig::from_env().ttl_millis, None);

        env::remove_var(TTL_ENV_VAR);
    }
}
