//! Invocable action handles

use crate::action::types::{ActionDescriptor, ActionMetadata, ActionType};
use crate::error::Result;
use crate::provider::DynamicActionProvider;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, debug_span, Instrument};

/// Async handler invoked when an action runs
pub type ActionHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Variant of an action as seen by the registry
#[derive(Debug, Clone)]
pub enum ActionKind {
    /// A plain action: metadata plus handler
    Standard,

    /// An action that also serves a cached, refreshable set of actions
    DynamicProvider(DynamicActionProvider),
}

/// A named, typed, invocable unit registered with an [`ActionRegistry`]
///
/// [`ActionRegistry`]: crate::action::ActionRegistry
pub struct Action {
    metadata: ActionMetadata,
    handler: ActionHandler,
    kind: ActionKind,
}

impl Action {
    /// Create a standard action from a descriptor and an async handler
    pub fn new<F, Fut>(descriptor: ActionDescriptor, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            metadata: descriptor.into(),
            handler: Arc::new(move |input| handler(input).boxed()),
            kind: ActionKind::Standard,
        }
    }

    pub(crate) fn with_kind(mut self, kind: ActionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Metadata projection of this action
    pub fn metadata(&self) -> &ActionMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn action_type(&self) -> ActionType {
        self.metadata.action_type
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The provider capabilities, if this action is a dynamic action provider
    pub fn as_dynamic_provider(&self) -> Option<&DynamicActionProvider> {
        match &self.kind {
            ActionKind::DynamicProvider(provider) => Some(provider),
            ActionKind::Standard => None,
        }
    }

    /// Invoke the handler with the given input
    pub async fn run(&self, input: Value) -> Result<Value> {
        let span = debug_span!("action", key = %self.metadata.key());
        async {
            debug!("Running action");
            (self.handler)(input).await
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("metadata", &self.metadata)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
