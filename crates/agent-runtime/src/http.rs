//! Shared HTTP plumbing for the hosted providers.

use std::time::Duration;

use agent_core::AgentError;
use reqwest::StatusCode;

/// Build a client with the per-request timeout applied
pub(crate) fn client(timeout: Duration) -> Result<reqwest::Client, AgentError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| AgentError::Config(format!("cannot build HTTP client: {e}")))
}

/// Map a non-success HTTP status to the provider error taxonomy
pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> AgentError {
    let detail = format!("{provider} API error {status}: {}", body.trim());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            AgentError::ProviderUnavailable(detail)
        }
        _ => AgentError::Provider(detail),
    }
}

/// Map a transport failure to the provider error taxonomy
pub(crate) fn transport_error(provider: &str, err: &reqwest::Error) -> AgentError {
    if err.is_connect() {
        AgentError::ProviderUnavailable(format!("{provider}: {err}"))
    } else if err.is_timeout() {
        AgentError::Provider(format!("{provider}: request timed out"))
    } else {
        AgentError::Provider(format!("{provider}: {err}"))
    }
}

/// Tool-call arguments arrive as a JSON string; keep it raw if it does not parse
pub(crate) fn parse_arguments(raw: &str) -> serde_json::Value {
    if raw.trim().is_empty() {
        return serde_json::Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error("openai", StatusCode::UNAUTHORIZED, ""), AgentError::Auth(_)));
        assert!(matches!(status_error("openai", StatusCode::TOO_MANY_REQUESTS, ""), AgentError::RateLimited(_)));
        assert!(matches!(status_error("cohere", StatusCode::SERVICE_UNAVAILABLE, ""), AgentError::ProviderUnavailable(_)));
        
        let err = status_error("cohere", StatusCode::BAD_REQUEST, "bad model\n");
        assert_eq!(err.to_string(), "Provider error: cohere API error 400 Bad Request: bad model");
    }

    #[test]
    fn test_client_builds_with_timeout() {
        assert!(client(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(r#"{"query":"rust"}"#), serde_json::json!({"query": "rust"}));
        assert_eq!(parse_arguments(""), serde_json::json!({}));
        assert_eq!(parse_arguments("{not json"), serde_json::json!("{not json"));
    }
}
