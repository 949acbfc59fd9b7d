//! llm-orchestrator HTTP Server
//!
//! Axum-based server running isolated agent runs per request. The tool
//! registry and settings are shared read-only; every run gets its own
//! provider, transcript and cancellation token.

mod handlers;
mod state;

use axum::{routing::{get, post}, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::CancellationToken;
use agent_runtime::{create_provider, Settings};

use crate::handlers::{health_check, list_tools, run_handler};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();
    
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
    
    let settings = Settings::from_env()?;
    settings.validate()?;
    
    // Verify the default provider
    let provider = create_provider(settings.provider, &settings.model, &settings)?;
    match provider.health_check().await {
        Ok(true) => tracing::info!(provider = %settings.provider, model = %settings.model, "Provider reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!(provider = %settings.provider, "Provider not reachable - runs will fail until it is");
        }
    }
    
    let tools = agent_tools::standard_registry(settings.search_api_key()?)?;
    tracing::info!("Registered {} tools: {:?}", tools.len(), tools.names());
    
    let addr = settings.bind_addr.clone();
    let state = AppState::new(settings, tools);
    let shutdown = state.shutdown.clone();
    
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    
    tracing::info!("llm-orchestrator server running on http://{}", addr);
    tracing::info!("  GET  /health     - Health check");
    tracing::info!("  GET  /api/tools  - List tools");
    tracing::info!("  POST /api/run    - Run the agent");
    
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    
    tracing::info!("Server stopped");
    Ok(())
}

/// Build the router
fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    
    Router::new()
        .route("/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/run", post(run_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve on Ctrl-C, cancelling every in-flight run first
async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    tracing::info!("Shutdown requested, cancelling in-flight runs");
    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use agent_tools::{registry_with_backend, tools::PythonConfig, StaticSearch};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let tools = registry_with_backend(Arc::new(StaticSearch::default()), PythonConfig::default()).unwrap();
        AppState::new(Settings::default(), tools)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_run(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/run")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_tools() {
        let request = Request::builder().uri("/api/tools").body(Body::empty()).unwrap();
        let (status, body) = send(app(test_state()), request).await;
        
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "internet_search");
        assert_eq!(body[1]["name"], "python_interpreter");
        assert_eq!(body[1]["parameters"]["required"], json!(["code"]));
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let (status, body) = send(app(test_state()), post_run(&json!({"input": "hi", "provider": "bard"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "UNSUPPORTED_PROVIDER");
    }

    #[tokio::test]
    async fn test_missing_key_rejected_before_run() {
        let (status, body) = send(app(test_state()), post_run(&json!({"input": "hi", "provider": "openai"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "CONFIGURATION_ERROR");
        assert!(body.get("transcript").is_none());
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let (status, body) = send(app(test_state()), post_run(&json!({"input": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_shutdown_cancels_runs() {
        let state = test_state();
        let child = state.shutdown.child_token();
        state.shutdown.cancel();
        assert!(child.is_cancelled());
    }
}
