use chrono::Utc;
use serde_json::Value;
use std::time::Instant;
use tracing::{info, warn};

use crate::backend::AgentBackend;
use crate::session::{Interaction, NoticeLevel, SessionContext};

/// Re-run OpenAPI discovery and the agent listing for a session.
pub async fn refresh_metadata(backend: &dyn AgentBackend, ctx: &mut SessionContext) {
    match backend.discover_api().await {
        Ok(api) => {
            ctx.api_discovery = api;
            ctx.discovery_error = None;
        }
        Err(e) => {
            warn!("OpenAPI discovery failed: {}", e);
            ctx.api_discovery = Value::Object(Default::default());
            ctx.discovery_error = Some(format!("Failed to load backend OpenAPI spec: {}", e));
        }
    }

    let agents = backend.fetch_agents(&ctx.api_discovery).await;
    ctx.set_agents(agents);
    ctx.bootstrapped = true;
}

/// Discovery and listing happen once, on a session's first page load.
pub async fn ensure_bootstrapped(backend: &dyn AgentBackend, ctx: &mut SessionContext) {
    if !ctx.bootstrapped {
        refresh_metadata(backend, ctx).await;
    }
}

pub async fn submit_query(backend: &dyn AgentBackend, ctx: &mut SessionContext, raw_query: &str) {
    ctx.draft_query = raw_query.to_string();
    let query = raw_query.trim();
    if query.is_empty() {
        ctx.push_notice(NoticeLevel::Error, "Please enter a query.");
        return;
    }

    let agent_id = ctx.selected_agent_id.clone();
    let start = Instant::now();
    let response = backend.submit_query(agent_id.as_deref(), query).await;
    let latency = start.elapsed();
    info!(
        "Query answered in {:.2}s (session {}, agent {:?})",
        latency.as_secs_f64(),
        ctx.session_id,
        agent_id
    );

    ctx.record_interaction(Interaction {
        agent_id,
        query: query.to_string(),
        response,
        timestamp: Utc::now(),
        latency,
    });
}

pub async fn load_history(backend: &dyn AgentBackend, ctx: &mut SessionContext) {
    let history = backend.fetch_history(ctx.selected_agent_id.as_deref()).await;
    info!("Loaded {} history entries for session {}", history.len(), ctx.session_id);
    ctx.backend_history = history;
}
