use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::client::BackendClient;
use crate::error::{BackendError, BackendResult};

/// Fixed fallbacks for the agent listing.
pub const AGENT_LIST_PATHS: [&str; 2] = ["/agents", "/api/agents"];

/// Payload returned when no submission candidate succeeds.
pub const SUBMIT_FAILURE: &str = "Unable to submit query to backend. Please verify API endpoints.";

/// One guess at where an endpoint lives. A body makes it a POST.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub path: String,
    pub body: Option<Value>,
}

impl Candidate {
    pub fn get(path: impl Into<String>) -> Self {
        Self { path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self { path: path.into(), body: Some(body) }
    }

    fn accepts(&self, status: StatusCode) -> bool {
        match self.body {
            None => status == StatusCode::OK,
            Some(_) => status == StatusCode::OK || status == StatusCode::CREATED,
        }
    }
}

/// Expected JSON shape of a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Any,
    /// A bare array, or an object holding an array under `key`.
    List { key: &'static str },
}

impl Shape {
    pub fn extract(&self, value: Value) -> Option<Value> {
        match self {
            Shape::Any => Some(value),
            Shape::List { key } => match value {
                Value::Array(_) => Some(value),
                Value::Object(mut map) => match map.remove(*key) {
                    Some(list @ Value::Array(_)) => Some(list),
                    _ => None,
                },
                _ => None,
            },
        }
    }
}

/// Try each candidate in order and return the first usable payload.
pub async fn first_success(
    client: &BackendClient,
    candidates: &[Candidate],
    timeout: Duration,
    shape: Shape,
) -> Option<Value> {
    for candidate in candidates {
        match attempt(client, candidate, timeout, shape).await {
            Ok(value) => {
                debug!("Candidate {} succeeded", candidate.path);
                return Some(value);
            }
            Err(e) => debug!("Candidate {} skipped: {}", candidate.path, e),
        }
    }
    None
}

async fn attempt(
    client: &BackendClient,
    candidate: &Candidate,
    timeout: Duration,
    shape: Shape,
) -> BackendResult<Value> {
    let response = match &candidate.body {
        None => client.get(&candidate.path, timeout).await?,
        Some(body) => client.post(&candidate.path, body, timeout).await?,
    };

    let url = response.url().to_string();
    let status = response.status();
    if !candidate.accepts(status) {
        return Err(BackendError::Status { url, status });
    }

    let value: Value = response
        .json()
        .await
        .map_err(|source| BackendError::Decode { url: url.clone(), source })?;
    shape.extract(value).ok_or(BackendError::Shape { url })
}

/// Agent-related GET paths declared in an OpenAPI document, in document order.
pub fn openapi_agent_paths(api: &Value) -> Vec<String> {
    let Some(paths) = api.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    paths
        .iter()
        .filter(|(path, item)| {
            path.to_lowercase().contains("agent")
                && item.as_object().map_or(false, |ops| ops.contains_key("get"))
        })
        .map(|(path, _)| path.clone())
        .collect()
}

/// Each declared agent path is prepended in turn, so the last one declared
/// is tried first. Paths already among the fixed fallbacks keep their place.
pub fn agent_list_candidates(api: &Value) -> Vec<Candidate> {
    let declared = openapi_agent_paths(api);
    if !declared.is_empty() {
        debug!("OpenAPI suggests agent paths: {:?}", declared);
    }
    declared
        .into_iter()
        .filter(|path| !AGENT_LIST_PATHS.contains(&path.as_str()))
        .rev()
        .chain(AGENT_LIST_PATHS.iter().map(|fixed| fixed.to_string()))
        .map(Candidate::get)
        .collect()
}

fn scoped(agent_id: &str, tail: &str) -> [String; 2] {
    let id = urlencoding::encode(agent_id);
    [
        format!("/agents/{}/{}", id, tail),
        format!("/api/agents/{}/{}", id, tail),
    ]
}

pub fn query_candidates(agent_id: Option<&str>, query: &str) -> Vec<Candidate> {
    let mut payload = json!({ "query": query });
    if let Some(id) = agent_id {
        payload["agent_id"] = json!(id);
    }

    let mut candidates = vec![
        Candidate::post("/query", payload.clone()),
        Candidate::post("/api/query", payload),
    ];
    if let Some(id) = agent_id {
        for path in scoped(id, "query") {
            candidates.push(Candidate::post(path, json!({ "query": query })));
        }
    }
    candidates
}

pub fn history_candidates(agent_id: Option<&str>) -> Vec<Candidate> {
    let mut candidates = vec![Candidate::get("/history"), Candidate::get("/api/history")];
    if let Some(id) = agent_id {
        candidates.extend(scoped(id, "history").into_iter().map(Candidate::get));
    }
    candidates
}

/// Collapse an exhausted list probe into an empty sequence.
pub fn into_list(result: Option<Value>, what: &str) -> Vec<Value> {
    match result {
        Some(Value::Array(items)) => items,
        _ => {
            warn!("No {} endpoint answered; using an empty list", what);
            Vec::new()
        }
    }
}

pub fn submit_failure() -> Value {
    json!({ "error": SUBMIT_FAILURE })
}
