use std::convert::Infallible;
use std::sync::Arc;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;

use crate::backend::{AgentBackend, BackendClient};
use crate::config::Config;
use crate::session::{SessionStore, SharedSession};

pub const SESSION_COOKIE: &str = "aqc_session";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn AgentBackend>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let backend = Arc::new(BackendClient::new(
            config.backend_config.base_url.clone(),
            config.backend_config.timeouts(),
        ));
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: Config, backend: Arc<dyn AgentBackend>) -> Self {
        Self {
            config,
            backend,
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

/// The caller's session, created on the spot when the cookie is missing or stale.
pub struct CurrentSession {
    pub session_id: String,
    pub context: SharedSession,
    pub is_new: bool,
}

impl CurrentSession {
    /// Attach the session cookie when the session was just created.
    pub fn finish(&self, mut response: Response) -> Response {
        if self.is_new {
            let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.session_id);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

pub fn expire_cookie(mut response: Response) -> Response {
    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

fn session_cookie(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// A session the caller already holds. Never creates one.
pub struct ExistingSession {
    pub session_id: String,
    pub context: SharedSession,
}

#[async_trait]
impl FromRequestParts<AppState> for ExistingSession {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session_id = session_cookie(parts).ok_or(StatusCode::UNAUTHORIZED)?;
        match state.sessions.get(&session_id) {
            Some(context) => Ok(Self { session_id, context }),
            None => {
                tracing::debug!("Unknown or expired session {}", session_id);
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Ok(ExistingSession { session_id, context }) =
            ExistingSession::from_request_parts(parts, state).await
        {
            return Ok(Self {
                session_id,
                context,
                is_new: false,
            });
        }

        let (session_id, context) = state.sessions.create();
        Ok(Self {
            session_id,
            context,
            is_new: true,
        })
    }
}
