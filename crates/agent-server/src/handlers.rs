//! HTTP Handlers

use std::str::FromStr;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use agent_core::{AgentBuilder, AgentError, ProviderKind, Transcript};
use agent_runtime::{create_provider, settings::default_model};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub model: String,
    pub provider_connected: bool,
    pub tools: usize,
}

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub input: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub answer: String,
    pub steps: usize,
    pub provider: String,
    pub model: String,
    pub transcript: Transcript,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Technical detail behind `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<usize>,
    /// Partial transcript of an aborted run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

impl ErrorResponse {
    fn from_agent_error(err: &AgentError) -> Self {
        Self {
            error: err.user_message(),
            code: err.code().into(),
            reason: Some(err.to_string()),
            steps: None,
            transcript: None,
        }
    }
}

/// HTTP status for a run-level error
pub const fn status_for(err: &AgentError) -> StatusCode {
    match err {
        AgentError::UnsupportedProvider(_) | AgentError::Config(_) => StatusCode::BAD_REQUEST,
        AgentError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        AgentError::ProviderUnavailable(_) | AgentError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        AgentError::Provider(_) | AgentError::Auth(_) => StatusCode::BAD_GATEWAY,
        AgentError::StepLimitExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: &AgentError) -> ApiError {
    (status_for(err), Json(ErrorResponse::from_agent_error(err)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let settings = &state.settings;
    
    let provider_connected = match create_provider(settings.provider, &settings.model, settings) {
        Ok(provider) => provider.health_check().await.unwrap_or(false),
        Err(e) => {
            tracing::warn!(error = %e, "Default provider cannot be built");
            false
        }
    };
    
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: settings.provider.to_string(),
        model: settings.model.clone(),
        provider_connected,
        tools: state.tools.len(),
    })
}

/// Registered tools with their argument schemas
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolInfo>> {
    let tools = state
        .tools
        .specs()
        .into_iter()
        .map(|spec| ToolInfo {
            parameters: spec.json_schema(),
            name: spec.name,
            description: spec.description,
        })
        .collect();
    
    Json(tools)
}

/// Run the reasoning loop for one query
pub async fn run_handler(
    State(state): State<AppState>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    if payload.input.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Input must not be empty".into(),
                code: "INVALID_REQUEST".into(),
                reason: None,
                steps: None,
                transcript: None,
            }),
        ));
    }
    
    let settings = &state.settings;
    let (kind, model) = match payload.provider.as_deref() {
        Some(name) => {
            let kind = ProviderKind::from_str(name).map_err(|e| api_error(&e))?;
            let model = payload.model.unwrap_or_else(|| default_model(kind).into());
            (kind, model)
        }
        None => (settings.provider, payload.model.unwrap_or_else(|| settings.model.clone())),
    };
    
    let provider = create_provider(kind, &model, settings).map_err(|e| api_error(&e))?;
    let agent = AgentBuilder::new()
        .provider(provider)
        .tools(state.tools.clone())
        .config(settings.agent.clone())
        .build()
        .map_err(|e| api_error(&e))?;
    
    tracing::info!(provider = %kind, model = %model, "Run started");
    let cancel = state.shutdown.child_token();
    
    match agent.run_with_cancel(&payload.input, &cancel).await {
        Ok(report) => Ok(Json(RunResponse {
            answer: report.answer,
            steps: report.steps,
            provider: kind.to_string(),
            model,
            transcript: report.transcript,
        })),
        Err(aborted) => {
            tracing::warn!(steps = aborted.steps, reason = %aborted.reason, "Run aborted");
            let mut body = ErrorResponse::from_agent_error(&aborted.reason);
            body.steps = Some(aborted.steps);
            body.transcript = Some(aborted.transcript);
            Err((status_for(&aborted.reason), Json(body)))
        }
    }
}
