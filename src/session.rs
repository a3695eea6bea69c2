use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::agent::Agent;

/// One submitted prompt and what came back.
#[derive(Debug, Clone, Serialize)]
pub struct Interaction {
    pub agent_id: Option<String>,
    pub query: String,
    pub response: Value,
    pub timestamp: DateTime<Utc>,
    #[serde(with = "latency_secs")]
    pub latency: Duration,
}

impl Interaction {
    /// The backend, or the prober, reported an error.
    pub fn error_message(&self) -> Option<String> {
        let error = self.response.as_object()?.get("error")?;
        Some(match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

mod latency_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(latency: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(latency.as_secs_f64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn css_class(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        }
    }
}

/// One-shot message shown on the next page render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// State owned by a single browser session.
#[derive(Debug)]
pub struct SessionContext {
    pub session_id: String,
    pub selected_agent_id: Option<String>,
    pub agents: Vec<Agent>,
    pub api_discovery: Value,
    pub discovery_error: Option<String>,
    /// Entries fetched from the backend history endpoints.
    pub backend_history: Vec<Value>,
    pub bootstrapped: bool,
    /// Prompt text as last submitted, kept in the form across redirects.
    pub draft_query: String,
    interactions: Vec<Interaction>,
    notices: Vec<Notice>,
    /// Index of the interaction whose outcome has not been shown yet.
    pending_outcome: Option<usize>,
    last_seen: Instant,
}

impl SessionContext {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            selected_agent_id: None,
            agents: Vec::new(),
            api_discovery: Value::Object(Default::default()),
            discovery_error: None,
            backend_history: Vec::new(),
            bootstrapped: false,
            draft_query: String::new(),
            interactions: Vec::new(),
            notices: Vec::new(),
            pending_outcome: None,
            last_seen: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }

    /// Select an agent by identity. Unknown identities clear the selection.
    pub fn select_agent(&mut self, agent_id: Option<&str>) {
        self.selected_agent_id = agent_id.and_then(|wanted| {
            self.agents
                .iter()
                .filter_map(Agent::id)
                .find(|id| id == wanted)
        });
    }

    /// Replace the agent list, dropping a selection that no longer exists.
    pub fn set_agents(&mut self, agents: Vec<Agent>) {
        self.agents = agents;
        let still_listed = self.selected_agent_id.as_deref().map_or(true, |selected| {
            self.agents
                .iter()
                .any(|agent| agent.id().as_deref() == Some(selected))
        });
        if !still_listed {
            self.selected_agent_id = None;
        }
    }

    pub fn record_interaction(&mut self, interaction: Interaction) {
        self.interactions.push(interaction);
        self.pending_outcome = Some(self.interactions.len() - 1);
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Up to `n` most recent interactions, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Interaction> {
        self.interactions.iter().rev().take(n)
    }

    /// Queries for the sidebar history list, oldest first: backend history
    /// followed by this session's interactions.
    pub fn history_queries(&self) -> Vec<String> {
        self.backend_history
            .iter()
            .map(|entry| match entry.get("query") {
                Some(Value::String(q)) => q.clone(),
                _ => entry.to_string(),
            })
            .chain(self.interactions.iter().map(|i| i.query.clone()))
            .collect()
    }

    pub fn push_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(Notice {
            level,
            text: text.into(),
        });
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn take_outcome(&mut self) -> Option<&Interaction> {
        let index = self.pending_outcome.take()?;
        self.interactions.get(index)
    }
}

pub type SharedSession = Arc<Mutex<SessionContext>>;

/// All live sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, SharedSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> (String, SharedSession) {
        let session_id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(SessionContext::new(session_id.clone())));
        self.sessions.insert(session_id.clone(), session.clone());
        info!("Started session {}", session_id);
        (session_id, session)
    }

    pub fn get(&self, session_id: &str) -> Option<SharedSession> {
        self.sessions.get(session_id).map(|e| e.value().clone())
    }

    pub fn end(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            info!("Ended session {}", session_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// End sessions idle longer than `ttl`. Sessions busy with a request are skipped.
    pub fn sweep_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|session_id, session| match session.try_lock() {
            Ok(ctx) if ctx.idle_for() > ttl => {
                debug!("Expiring idle session {}", session_id);
                false
            }
            _ => true,
        });
        before.saturating_sub(self.sessions.len())
    }
}
