use async_trait::async_trait;
use serde_json::Value;

use crate::agent::Agent;
use crate::error::BackendResult;

/// Backend operations the console needs.
///
/// Every method except discovery degrades instead of failing: listing and
/// history yield empty sequences, submission yields an object with an
/// `error` key.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Base URL the backend is reached at, for display.
    fn base_url(&self) -> &str;

    /// Fetch the backend's OpenAPI document.
    async fn discover_api(&self) -> BackendResult<Value>;

    /// List agents, biasing probe order with the discovered OpenAPI document.
    async fn fetch_agents(&self, api: &Value) -> Vec<Agent>;

    /// Submit a prompt, optionally scoped to an agent.
    async fn submit_query(&self, agent_id: Option<&str>, query: &str) -> Value;

    /// Fetch stored interaction history, optionally scoped to an agent.
    async fn fetch_history(&self, agent_id: Option<&str>) -> Vec<Value>;
}
