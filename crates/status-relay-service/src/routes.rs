//! HTTP health endpoints.
//!
//! - `GET /health` - always 200 while the process is up
//! - `GET /ready` - 200 once the readiness gate passed, 503 otherwise

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::{ReadinessHandle, ReadinessState};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// `pending`, `ready` or `failed`.
    pub status: String,
    /// Failure reason, if the gate failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Create the router.
pub fn create_router(readiness: ReadinessHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(readiness)
}

/// Liveness handler.
pub async fn health() -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness handler.
pub async fn ready(State(readiness): State<ReadinessHandle>) -> impl IntoResponse {
    let state = readiness.current();
    let code = if state == ReadinessState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let reason = match &state {
        ReadinessState::Failed(reason) => Some(reason.clone()),
        _ => None,
    };

    (
        code,
        Json(ReadyResponse {
            status: state.to_string(),
            reason,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_returns_ok() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_follows_state() {
        let handle = ReadinessHandle::new();

        let response = ready(State(handle.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        handle.set_failed("topics missing");
        let response = ready(State(handle.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        handle.set_ready();
        let response = ready(State(handle)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
