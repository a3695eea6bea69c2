//! Helpers shared by unit tests.

use axum::Router;
use std::time::Duration;

use crate::config::Timeouts;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        discovery: Duration::from_secs(2),
        listing: Duration::from_secs(2),
        history: Duration::from_secs(2),
        query: Duration::from_secs(2),
    }
}
