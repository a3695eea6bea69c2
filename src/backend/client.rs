use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use super::interface::AgentBackend;
use super::probe::{self, Shape};
use crate::agent::Agent;
use crate::config::Timeouts;
use crate::error::{BackendError, BackendResult};

/// HTTP client for the agent backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    timeouts: Timeouts,
}

impl BackendClient {
    pub fn new(base_url: String, timeouts: Timeouts) -> Self {
        Self {
            client: Client::new(),
            base_url,
            timeouts,
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn get(&self, path: &str, timeout: Duration) -> BackendResult<Response> {
        let url = self.url_for(path);
        self.client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| BackendError::Transport { url, source })
    }

    pub async fn post(&self, path: &str, body: &Value, timeout: Duration) -> BackendResult<Response> {
        let url = self.url_for(path);
        self.client
            .post(&url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| BackendError::Transport { url, source })
    }
}

#[async_trait]
impl AgentBackend for BackendClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn discover_api(&self) -> BackendResult<Value> {
        let response = self.get("openapi.json", self.timeouts.discovery).await?;
        let url = response.url().to_string();
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status { url, status });
        }
        response
            .json()
            .await
            .map_err(|source| BackendError::Decode { url, source })
    }

    async fn fetch_agents(&self, api: &Value) -> Vec<Agent> {
        let candidates = probe::agent_list_candidates(api);
        let found = probe::first_success(
            self,
            &candidates,
            self.timeouts.listing,
            Shape::List { key: "agents" },
        )
        .await;
        let agents: Vec<Agent> = probe::into_list(found, "agent listing")
            .into_iter()
            .map(Agent::new)
            .collect();
        info!("Discovered {} agents", agents.len());
        agents
    }

    async fn submit_query(&self, agent_id: Option<&str>, query: &str) -> Value {
        let candidates = probe::query_candidates(agent_id, query);
        match probe::first_success(self, &candidates, self.timeouts.query, Shape::Any).await {
            Some(value) => value,
            None => {
                warn!("All query endpoints failed (agent: {:?})", agent_id);
                probe::submit_failure()
            }
        }
    }

    async fn fetch_history(&self, agent_id: Option<&str>) -> Vec<Value> {
        let candidates = probe::history_candidates(agent_id);
        let found = probe::first_success(
            self,
            &candidates,
            self.timeouts.history,
            Shape::List { key: "history" },
        )
        .await;
        probe::into_list(found, "history")
    }
}
