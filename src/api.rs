//! Read-only HTTP query surface over the run store.
//!
//! Two endpoints, both reads: list runs and fetch a single artifact. All
//! mutation stays on the CLI. The server binds to localhost only.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::errors::PipelineError;
use crate::models::RunMeta;
use crate::pipeline::Orchestrator;
use crate::registry::RunFilter;
use crate::state::RunStatus;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    #[serde(default)]
    pub status: Option<RunStatus>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Serve the query API until the process is stopped.
pub async fn serve(orchestrator: Orchestrator, port: u16) -> Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind 127.0.0.1:{port}"))?;
    let addr = listener.local_addr().context("failed to read bound address")?;
    tracing::info!(%addr, "query api listening");
    println!("Serving read-only query API on http://{addr}");

    let app = build_router(Arc::new(orchestrator));
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

pub fn build_router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/runs", get(list_runs_handler))
        .route("/runs/{run_id}/artifacts/{name}", get(artifact_handler))
        .with_state(orchestrator)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn list_runs_handler(
    State(orchestrator): State<Arc<Orchestrator>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RunMeta>>, (StatusCode, String)> {
    let filter = RunFilter {
        status: params.status,
        platform: None,
        limit: params.limit,
    };
    let runs = orchestrator.list_runs(&filter).map_err(to_http)?;
    Ok(Json(runs))
}

async fn artifact_handler(
    State(orchestrator): State<Arc<Orchestrator>>,
    Path((run_id, name)): Path<(String, String)>,
) -> Result<String, (StatusCode, String)> {
    let (_, content) = orchestrator.show_artifact(&run_id, &name).map_err(to_http)?;
    Ok(content)
}

fn to_http(error: PipelineError) -> (StatusCode, String) {
    let status = match &error {
        PipelineError::RunNotFound { .. }
        | PipelineError::ArtifactNotFound { .. }
        | PipelineError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
        PipelineError::Validation { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::RawBrief;
    use crate::resources::ResourceResolver;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_router() -> (TempDir, Router, Arc<Orchestrator>) {
        let dir = TempDir::new().unwrap();
        let orchestrator = Arc::new(Orchestrator::new(
            dir.path().join("runs"),
            ResourceResolver::default(),
        ));
        let router = build_router(orchestrator.clone());
        (dir, router, orchestrator)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let (_guard, app, _) = test_router();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn list_runs_returns_created_runs() {
        let (_guard, app, orchestrator) = test_router();
        orchestrator
            .create_run(RawBrief {
                topic: Some("Query api smoke".into()),
                ..Default::default()
            })
            .unwrap();

        let response = app
            .oneshot(Request::get("/runs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let runs: Vec<RunMeta> = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].topic, "Query api smoke");
    }

    #[tokio::test]
    async fn status_filter_is_applied() {
        let (_guard, app, orchestrator) = test_router();
        orchestrator
            .create_run(RawBrief {
                topic: Some("Filtered out".into()),
                ..Default::default()
            })
            .unwrap();

        let response = app
            .oneshot(
                Request::get("/runs?status=rendered")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let runs: Vec<RunMeta> = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(runs.is_empty());
    }

    #[tokio::test]
    async fn artifact_endpoint_serves_brief_and_404s_unknown() {
        let (_guard, app, orchestrator) = test_router();
        let meta = orchestrator
            .create_run(RawBrief {
                topic: Some("Artifact fetch".into()),
                ..Default::default()
            })
            .unwrap();

        let uri = format!("/runs/{}/artifacts/brief", meta.run_id);
        let response = app
            .clone()
            .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Artifact fetch"));

        let uri = format!("/runs/{}/artifacts/core", meta.run_id);
        let response = app
            .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_run_is_not_found() {
        let (_guard, app, _) = test_router();
        let response = app
            .oneshot(
                Request::get("/runs/20990101_000000_nope/artifacts/brief")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
