//! HTTP front end: a bundled single-page UI plus a JSON run endpoint.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use hlsf_store::StateStore;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::runner;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    store: Arc<Mutex<dyn StateStore>>,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<Mutex<dyn StateStore>>) -> Self {
        Self {
            settings: Arc::new(settings),
            store,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunPayload {
    prompt: String,
    use_llm: Option<bool>,
    passes: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/run", post(run))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(host: &str, port: u16, state: AppState) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutting down");
            }
        })
        .await
        .context("HTTP server failed")
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": state.settings.version }))
}

fn error(status: StatusCode, detail: String) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

async fn run(State(state): State<AppState>, Json(payload): Json<RunPayload>) -> Response {
    if payload.prompt.trim().is_empty() {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Prompt cannot be empty".to_string());
    }

    let mut settings = (*state.settings).clone();
    if let Some(use_llm) = payload.use_llm {
        settings.llm.enabled = use_llm;
    }
    if let Some(passes) = payload.passes {
        settings.llm.passes = passes.max(1);
    }

    match runner::execute(&payload.prompt, &settings, &state.store).await {
        Ok(outcome) => Json(json!({ "package": outcome.package, "answer": outcome.answer })).into_response(),
        Err(e) => {
            tracing::warn!("run failed: {e:#}");
            error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use hlsf_store::MemoryStore;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let mut settings = Settings::default();
        settings.glyph_count = 64;
        settings.llm.provider = "mock".into();
        router(AppState::new(settings, Arc::new(Mutex::new(MemoryStore::new()))))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_run(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/run")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_ui() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("/api/run"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], "0.0.0.0");
    }

    #[tokio::test]
    async fn test_blank_prompt_is_422() {
        let response = app().oneshot(post_run(json!({"prompt": "  "}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["detail"], "Prompt cannot be empty");
    }

    #[tokio::test]
    async fn test_run_offline() {
        let response = app()
            .oneshot(post_run(json!({"prompt": "Test the engine quickly.", "use_llm": false})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["package"]["stats"]["tokens"], 5);
        assert_eq!(body["package"]["stats"]["triangles"], 5);
        assert!(body["answer"].as_str().unwrap().contains("HLSF baseline"));
    }

    #[tokio::test]
    async fn test_run_with_mock_provider() {
        let response = app()
            .oneshot(post_run(json!({"prompt": "graph walk", "passes": 0})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "graph walk - concise answer (mock).");
        assert_eq!(
            body["package"]["trace_summary"],
            "LLM-enabled HLSF; safe-to-share trace only."
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let response = app().oneshot(post_run(json!({"text": "x"}))).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
