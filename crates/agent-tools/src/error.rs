//! Error Types for Agent Tools

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolsError>;

#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("Search backend error: {0}")]
    Search(String),
    
    #[error("Could not start interpreter '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    
    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),
    
    #[error("Configuration error: {0}")]
    Config(String),
    
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ToolsError> for agent_core::AgentError {
    fn from(err: ToolsError) -> Self {
        match err {
            ToolsError::Config(msg) => Self::Config(msg),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::AgentError;

    #[test]
    fn test_converts_to_recoverable_tool_error() {
        let err: AgentError = ToolsError::Timeout(Duration::from_secs(3)).into();
        assert!(matches!(err, AgentError::ToolExecution(ref msg) if msg.contains("3s")));
        assert!(err.is_recoverable());
        
        let err: AgentError = ToolsError::Config("TAVILY_API_KEY is empty".into()).into();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
