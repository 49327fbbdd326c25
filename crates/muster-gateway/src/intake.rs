//! Event intake
//!
//! A relay holding the platform's gateway connection forwards events here:
//! - `POST /events` takes one JSON [`GatewayEvent`], answers `202 Accepted`
//!   and handles the event on its own task
//! - `GET /health` reports liveness
//!
//! When a shared secret is configured, `POST /events` requires it in the
//! `x-muster-secret` header.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use muster_core::{CommandRouter, GatewayEvent};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Header carrying the relay's shared secret
pub const SECRET_HEADER: &str = "x-muster-secret";

#[derive(Debug, Clone)]
struct IntakeState {
    router: CommandRouter,
    secret: Option<Arc<str>>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Build the intake router
pub fn routes(router: CommandRouter, secret: Option<String>) -> Router {
    let state = IntakeState {
        router,
        secret: secret.map(Arc::from),
    };
    Router::new()
        .route("/health", get(health))
        .route("/events", post(accept_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the intake until `shutdown` resolves
///
/// # Errors
/// Returns the server's I/O error.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn accept_event(
    State(state): State<IntakeState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(expected) = state.secret.as_deref() {
        let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            tracing::warn!("rejected event with missing or wrong secret");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let event: GatewayEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "malformed event");
            return StatusCode::BAD_REQUEST;
        }
    };

    let router = state.router.clone();
    tokio::spawn(async move {
        router.handle_event(event).await;
    });
    StatusCode::ACCEPTED
}
