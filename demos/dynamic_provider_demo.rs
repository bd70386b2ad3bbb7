//! Dynamic Action Provider Demo
//!
//! Demonstrates TTL caching, single-flight refresh, invalidation and
//! resolution through the registry.
//!
//! Usage:
//!   cargo run --example dynamic_provider_demo
//!
//! Environment variables:
//!   OUROBOROS_DAP_TTL_MILLIS - cache TTL in milliseconds (default: 3000)
//!   RUST_LOG                 - log filter (default: ouroboros_actions=info)

use ouroboros_actions::{
    define_dynamic_action_provider, Action, ActionDescriptor, ActionRegistry, ActionType,
    DapCacheConfig, DapConfig, DapValue,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Simulates listing tools from a remote server
async fn fetch_remote_tools(generation: usize) -> anyhow::Result<DapValue> {
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut tools = Vec::new();
    for name in ["search_web", "search_docs", "summarize"] {
        let descriptor = ActionDescriptor::new(ActionType::Tool, name)
            .with_description(format!("{} (generation {})", name, generation))
            .with_input_schema(json!({ "type": "object" }));
        tools.push(Arc::new(Action::new(descriptor, move |input| async move {
            Ok(json!({ "tool": name, "generation": generation, "input": input }))
        })));
    }

    Ok(DapValue::new().with_actions(ActionType::Tool, tools))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ouroboros_actions=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Dynamic Action Provider Demo ===");

    let registry = ActionRegistry::new();
    let generation = Arc::new(AtomicUsize::new(0));

    let config = DapConfig::builder("remote-tools")
        .description("Tools listed by a remote server")
        .cache_config(DapCacheConfig::from_env())
        .metadata("transport", json!("http"))
        .build();

    let counter = generation.clone();
    let provider = define_dynamic_action_provider(&registry, config, move || {
        let generation = counter.fetch_add(1, Ordering::SeqCst) + 1;
        fetch_remote_tools(generation)
    })
    .await?;

    info!("\n--- Concurrent lookups (one fetch) ---");
    let lookups = (0..5).map(|_| provider.list_action_metadata(ActionType::Tool, "search*"));
    for (i, result) in futures::future::join_all(lookups).await.into_iter().enumerate() {
        info!("Lookup {}: {} matching tools", i, result?.len());
    }
    info!("Fetches so far: {}", generation.load(Ordering::SeqCst));

    info!("\n--- Cached lookup ---");
    if let Some(action) = provider.get_action(ActionType::Tool, "summarize").await? {
        let output = action.run(json!({ "text": "hello" })).await?;
        info!("summarize -> {}", output);
    }
    info!("Cache stats: {}", provider.cache_stats());

    info!("\n--- Resolve a published tool through the registry ---");
    let output = registry
        .run_action(ActionType::Tool, "search_docs", json!({ "q": "ttl" }))
        .await?;
    info!("search_docs -> {}", output);

    info!("\n--- Invalidate and refetch ---");
    provider.invalidate_cache();
    if let Some(action) = provider.get_action(ActionType::Tool, "search_docs").await? {
        let output = action.run(json!({ "q": "ttl" })).await?;
        info!("search_docs -> {}", output);
    }

    let status = provider.cache_status();
    info!(
        "Status: has_value={}, stale={}, actions={}, expires_at={:?}",
        status.has_value, status.is_stale, status.action_count, status.expires_at
    );
    info!("Fetches total: {}", generation.load(Ordering::SeqCst));

    info!("\n--- Provider introspection ---");
    let projection = serde_json::to_value(provider.list_all_metadata().await?)?;
    let described = registry
        .run_action(ActionType::DynamicActionProvider, "remote-tools", projection)
        .await?;
    info!("{}", serde_json::to_string_pretty(&described)?);

    info!("\n=== Demo Complete ===");
    Ok(())
}
