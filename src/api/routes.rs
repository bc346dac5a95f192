//! API route definitions
//!
//! Organizes endpoints for the gateway:
//! - /api/v1/batches - batch submission
//! - /api/v1/status  - cycle fill and counters

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, GatewayState};

/// Create all API routes for the gateway
pub fn api_routes(state: GatewayState) -> Router {
    Router::new()
        .route("/batches", post(handlers::submit_batch))
        .route("/status", get(handlers::get_status))
        .with_state(state)
}

/// Legacy health endpoint at root level
pub fn legacy_routes(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DispatchError, PipelineRunner, RunOutput};
    use crate::pipeline::{AppState, CycleCoordinator};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    struct NoopRunner;

    #[async_trait]
    impl PipelineRunner for NoopRunner {
        async fn run(&self, _artifacts: &[PathBuf]) -> Result<RunOutput, DispatchError> {
            Ok(RunOutput::default())
        }
    }

    fn create_test_state(dir: &std::path::Path) -> GatewayState {
        let app_state = Arc::new(RwLock::new(AppState::default()));
        let coordinator = Arc::new(CycleCoordinator::new(
            Box::new(NoopRunner),
            dir.to_path_buf(),
            Arc::clone(&app_state),
        ));
        GatewayState {
            coordinator,
            app_state,
        }
    }

    #[tokio::test]
    async fn test_api_routes_status() {
        let dir = tempfile::tempdir().unwrap();
        let app = api_routes(create_test_state(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_legacy_routes_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = legacy_routes(create_test_state(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_batches_rejects_unknown_category() {
        let dir = tempfile::tempdir().unwrap();
        let app = api_routes(create_test_state(dir.path()));

        let body = serde_json::json!({
            "category": "foo",
            "filename": "feed.csv",
            "records": []
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/batches")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
