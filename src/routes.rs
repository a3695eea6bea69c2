use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::handlers;
use crate::page;
use crate::state::{expire_cookie, AppState, CurrentSession, ExistingSession};
use crate::session::NoticeLevel;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Console page
        .route("/", get(index))

        // Form actions, each answered with a redirect back to the page
        .route("/refresh", post(refresh))
        .route("/agent", post(select_agent))
        .route("/query", post(submit_query))
        .route("/history", post(load_history))
        .route("/session/end", post(end_session))

        // JSON
        .route("/api/health", get(health_check))
        .route("/api/session", get(session_snapshot))
}

#[derive(Debug, Deserialize)]
pub struct AgentForm {
    #[serde(default)]
    pub agent_id: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    #[serde(default)]
    pub query: String,
}

fn back_to_page() -> Response {
    Redirect::to("/").into_response()
}

async fn index(State(state): State<AppState>, session: CurrentSession) -> Response {
    let html = {
        let mut ctx = session.context.lock().await;
        ctx.touch();
        handlers::ensure_bootstrapped(state.backend.as_ref(), &mut ctx).await;
        page::render_page(&mut ctx, state.backend.base_url())
    };
    session.finish(Html(html).into_response())
}

async fn refresh(State(state): State<AppState>, session: CurrentSession) -> Response {
    {
        let mut ctx = session.context.lock().await;
        ctx.touch();
        handlers::refresh_metadata(state.backend.as_ref(), &mut ctx).await;
        ctx.push_notice(NoticeLevel::Success, "Refreshed backend metadata");
    }
    session.finish(back_to_page())
}

async fn select_agent(session: CurrentSession, Form(form): Form<AgentForm>) -> Response {
    {
        let mut ctx = session.context.lock().await;
        ctx.touch();
        let wanted = form.agent_id.trim();
        ctx.select_agent((!wanted.is_empty()).then_some(wanted));
    }
    session.finish(back_to_page())
}

async fn submit_query(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(form): Form<QueryForm>,
) -> Response {
    {
        let mut ctx = session.context.lock().await;
        ctx.touch();
        handlers::submit_query(state.backend.as_ref(), &mut ctx, &form.query).await;
    }
    session.finish(back_to_page())
}

async fn load_history(State(state): State<AppState>, session: CurrentSession) -> Response {
    {
        let mut ctx = session.context.lock().await;
        ctx.touch();
        handlers::load_history(state.backend.as_ref(), &mut ctx).await;
    }
    session.finish(back_to_page())
}

async fn end_session(State(state): State<AppState>, session: Option<ExistingSession>) -> Response {
    if let Some(session) = session {
        state.sessions.end(&session.session_id);
    }
    expire_cookie(back_to_page())
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "backend": state.backend.base_url(),
        "sessions": state.sessions.len(),
        "session_idle_secs": state.config.server_config.session_idle_secs
    }))
}

async fn session_snapshot(session: Option<ExistingSession>) -> Response {
    let Some(session) = session else {
        return StatusCode::NO_CONTENT.into_response();
    };
    let ctx = session.context.lock().await;
    let body = json!({
        "session_id": ctx.session_id,
        "selected_agent_id": ctx.selected_agent_id,
        "agents": ctx.agents,
        "interactions": ctx.interactions(),
        "backend_history": ctx.backend_history,
    });
    Json(body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handlers::stub::StubBackend;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(backend: StubBackend) -> (Router, Arc<StubBackend>, AppState) {
        let backend = Arc::new(backend);
        let state = AppState::with_backend(Config::default(), backend.clone());
        let router = create_routes().with_state(state.clone());
        (router, backend, state)
    }

    fn cookie_of(response: &Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_page(cookie: &str) -> Request<Body> {
        Request::get("/").header(header::COOKIE, cookie).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, cookie: &str, form: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn first_visit_creates_session_and_bootstraps() {
        let (router, backend, state) = app(StubBackend {
            api: Some(json!({ "paths": {} })),
            agents: vec![json!({ "id": "a1", "name": "Alpha" })],
            ..Default::default()
        });

        let response = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = cookie_of(&response);
        assert!(cookie.starts_with("aqc_session="));
        let html = body_text(response).await;
        assert!(html.contains("Alpha"));
        assert_eq!(state.sessions.len(), 1);

        let response = router.oneshot(get_page(&cookie)).await.unwrap();
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(backend.calls(), vec!["discover", "agents"]);
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn query_flow_appends_and_renders() {
        let (router, backend, _) = app(StubBackend {
            agents: vec![json!({ "id": "a1" })],
            ..Default::default()
        });
        let response = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = cookie_of(&response);

        let response = router
            .clone()
            .oneshot(post_form("/agent", &cookie, "agent_id=a1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = router
            .clone()
            .oneshot(post_form("/query", &cookie, "query=What+is+Rust%3F"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let html = body_text(router.clone().oneshot(get_page(&cookie)).await.unwrap()).await;
        assert!(html.contains("Response received in"));
        assert!(html.contains("echo What is Rust?"));
        assert!(html.contains(">What is Rust?</textarea>"));
        assert!(backend.calls().contains(&"query:a1:What is Rust?".to_string()));

        let snapshot = body_text(
            router
                .oneshot(Request::get("/api/session").header(header::COOKIE, &cookie).body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;
        let snapshot: Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(snapshot["selected_agent_id"], "a1");
        assert_eq!(snapshot["interactions"][0]["query"], "What is Rust?");
    }

    #[tokio::test]
    async fn empty_query_shows_error() {
        let (router, backend, _) = app(StubBackend::default());
        let response = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = cookie_of(&response);

        router.clone().oneshot(post_form("/query", &cookie, "query=+++")).await.unwrap();
        let html = body_text(router.oneshot(get_page(&cookie)).await.unwrap()).await;
        assert!(html.contains("Please enter a query."));
        assert!(!backend.calls().iter().any(|c| c.starts_with("query:")));
    }

    #[tokio::test]
    async fn end_session_clears_state() {
        let (router, _, state) = app(StubBackend::default());
        let response = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = cookie_of(&response);
        assert_eq!(state.sessions.len(), 1);

        let response = router
            .clone()
            .oneshot(post_form("/session/end", &cookie, ""))
            .await
            .unwrap();
        assert!(response.headers()[header::SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));
        assert_eq!(state.sessions.len(), 0);

        let response = router.oneshot(get_page(&cookie)).await.unwrap();
        assert_ne!(cookie_of(&response), cookie);
    }

    #[tokio::test]
    async fn requests_without_a_session_do_not_create_one() {
        let (router, backend, state) = app(StubBackend::default());

        let response = router
            .clone()
            .oneshot(Request::get("/api/session").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let response = router
            .clone()
            .oneshot(
                Request::get("/api/session")
                    .header(header::COOKIE, "aqc_session=expired")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(Request::post("/session/end").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers()[header::SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

        assert_eq!(state.sessions.len(), 0);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn health_reports_backend() {
        let (router, _, _) = app(StubBackend::default());
        let response = router
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "http://stub");
    }
}
