//! Core type definitions for actions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Category of an action
///
/// A closed set of action kinds used to partition actions in the registry
/// and in a provider's cached collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    Custom,
    Embedder,
    Evaluator,
    ExecutablePrompt,
    Flow,
    Indexer,
    Model,
    BackgroundModel,
    Prompt,
    Reranker,
    Resource,
    Retriever,
    Tool,
    Util,
    DynamicActionProvider,
}

impl ActionType {
    /// All action types, in declaration order
    pub const ALL: [ActionType; 15] = [
        ActionType::Custom,
        ActionType::Embedder,
        ActionType::Evaluator,
        ActionType::ExecutablePrompt,
        ActionType::Flow,
        ActionType::Indexer,
        ActionType::Model,
        ActionType::BackgroundModel,
        ActionType::Prompt,
        ActionType::Reranker,
        ActionType::Resource,
        ActionType::Retriever,
        ActionType::Tool,
        ActionType::Util,
        ActionType::DynamicActionProvider,
    ];

    /// String form used in keys and serialized metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Custom => "custom",
            ActionType::Embedder => "embedder",
            ActionType::Evaluator => "evaluator",
            ActionType::ExecutablePrompt => "executable-prompt",
            ActionType::Flow => "flow",
            ActionType::Indexer => "indexer",
            ActionType::Model => "model",
            ActionType::BackgroundModel => "background-model",
            ActionType::Prompt => "prompt",
            ActionType::Reranker => "reranker",
            ActionType::Resource => "resource",
            ActionType::Retriever => "retriever",
            ActionType::Tool => "tool",
            ActionType::Util => "util",
            ActionType::DynamicActionProvider => "dynamic-action-provider",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown action type: {}", s))
    }
}

/// Descriptive metadata of an action
///
/// This is the projection returned by metadata listings; it carries no
/// handler and can be serialized freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMetadata {
    /// Category of the action
    pub action_type: ActionType,

    /// Action name, unique per category within a registry
    pub name: String,

    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Open metadata mapping
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    /// JSON schema of the input, carried as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,

    /// JSON schema of the output, carried as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl ActionMetadata {
    /// Registry key of this action, e.g. `/tool/search`
    pub fn key(&self) -> String {
        format!("/{}/{}", self.action_type, self.name)
    }
}

/// Everything needed to define an action except its handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub action_type: ActionType,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub input_schema: Option<Value>,
    #[serde(default)]
    pub output_schema: Option<Value>,
}

impl ActionDescriptor {
    /// Create a descriptor with only a category and a name
    pub fn new(action_type: ActionType, name: impl Into<String>) -> Self {
        Self {
            action_type,
            name: name.into(),
            description: None,
            metadata: Map::new(),
            input_schema: None,
            output_schema: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a single metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set the input schema
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Set the output schema
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

impl From<ActionDescriptor> for ActionMetadata {
    fn from(d: ActionDescriptor) -> Self {
        Self {
            action_type: d.action_type,
            name: d.name,
            description: d.description,
            metadata: d.metadata,
            input_schema: d.input_schema,
            output_schema: d.output_schema,
        }
    }
}
