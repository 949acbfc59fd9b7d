//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error (network failure, bad response, timeout)
    #[error("Provider error: {0}")]
    Provider(String),
    
    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
    
    /// Rate limited by the provider
    #[error("Rate limited: {0}")]
    RateLimited(String),
    
    /// Authentication with the provider failed
    #[error("Authentication failed: {0}")]
    Auth(String),
    
    /// Provider identifier not recognized
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
    
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    
    /// Adapter asked to complete an empty transcript
    #[error("Transcript is empty")]
    EmptyTranscript,
    
    /// Tool not found in registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    
    /// Tool arguments do not match the tool's schema
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
    
    /// Tool handler failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),
    
    /// A tool with the same name is already registered
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
    
    /// Step ceiling of the reasoning loop reached
    #[error("Step limit exceeded ({0} model calls)")]
    StepLimitExceeded(usize),
    
    /// Run cancelled by the caller
    #[error("Run cancelled")]
    Cancelled,
    
    /// Transcript grew past its entry ceiling
    #[error("Transcript overflow: limit is {limit} messages")]
    TranscriptOverflow { limit: usize },
    
    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    
    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Errors the model can react to; the loop feeds them back as tool results
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool(_) | Self::InvalidArguments { .. } | Self::ToolExecution(_)
        )
    }
    
    /// Errors raised by the model provider or its transport
    pub const fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::ProviderUnavailable(_) | Self::RateLimited(_) | Self::Auth(_)
        )
    }
    
    /// Check if retrying the whole run might succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_) | Self::Io(_)
        )
    }
    
    /// Short machine-readable code, used by the HTTP surface
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Auth(_) => "AUTH_FAILED",
            Self::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",
            Self::Config(_) => "CONFIGURATION_ERROR",
            Self::EmptyTranscript => "EMPTY_TRANSCRIPT",
            Self::UnknownTool(_) => "UNKNOWN_TOOL",
            Self::InvalidArguments { .. } => "INVALID_ARGUMENTS",
            Self::ToolExecution(_) => "TOOL_EXECUTION_ERROR",
            Self::DuplicateTool(_) => "DUPLICATE_TOOL",
            Self::StepLimitExceeded(_) => "STEP_LIMIT_EXCEEDED",
            Self::Cancelled => "CANCELLED",
            Self::TranscriptOverflow { .. } => "TRANSCRIPT_OVERFLOW",
            Self::Io(_) | Self::Json(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }
    
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            Self::RateLimited(_) => "The AI service is rate limiting requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication with the AI service failed. Please check your credentials.".into(),
            Self::UnsupportedProvider(name) => format!("The provider '{name}' is not supported."),
            Self::UnknownTool(name) => format!("The tool '{name}' is not available."),
            Self::InvalidArguments { tool, reason } => format!("Invalid input for '{tool}': {reason}"),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::StepLimitExceeded(_) => "The request took too many steps to process. Please try a simpler query.".into(),
            Self::Cancelled => "The request was cancelled.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(AgentError::UnknownTool("x".into()).is_recoverable());
        assert!(AgentError::ToolExecution("boom".into()).is_recoverable());
        assert!(!AgentError::Provider("down".into()).is_recoverable());
        assert!(AgentError::RateLimited("429".into()).is_provider_error());
        assert!(AgentError::RateLimited("429".into()).is_retryable());
        assert!(!AgentError::StepLimitExceeded(15).is_provider_error());
    }

    #[test]
    fn test_invalid_arguments_display() {
        let err = AgentError::InvalidArguments {
            tool: "internet_search".into(),
            reason: "missing required parameter 'query'".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid arguments for tool 'internet_search': missing required parameter 'query'"
        );
        assert_eq!(err.code(), "INVALID_ARGUMENTS");
    }
}
