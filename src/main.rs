mod agent;
mod backend;
mod config;
mod error;
mod handlers;
mod page;
mod render;
mod routes;
mod session;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Result;
use axum::Router;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agent_query_console=debug,tower_http=debug")),
        )
        .init();

    let (config, source) = Config::resolve()?;
    match source {
        Some(path) => info!("Loaded configuration from: {}", path),
        None => info!("No configuration file found, using defaults"),
    }
    info!("Backend base URL: {}", config.backend_config.base_url);

    // Initialize app state
    let app_state = AppState::new(config.clone());
    spawn_session_sweeper(&app_state, Duration::from_secs(config.server_config.session_idle_secs));

    // Build application
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state);

    // Start server
    let server = &config.server_config;
    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port)).await?;
    info!("Starting console on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

/// End sessions that have been idle longer than `ttl`.
fn spawn_session_sweeper(state: &AppState, ttl: Duration) {
    let sessions = state.sessions.clone();
    let period = (ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(300));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let expired = sessions.sweep_idle(ttl);
            if expired > 0 {
                info!("Expired {} idle sessions", expired);
            }
        }
    });
}
