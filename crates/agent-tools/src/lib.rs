//! # agent-tools
//!
//! The tools an orchestrated agent can call:
//!
//! - `internet_search` - document snippets for a query, from a pluggable
//!   [`SearchBackend`] (Tavily by default)
//! - `python_interpreter` - runs Python in an isolated, time-boxed
//!   `python3 -I` subprocess
//!
//! ```rust,ignore
//! let registry = agent_tools::standard_registry(settings.search_api_key()?)?;
//! let agent = AgentBuilder::new()
//!     .provider(provider)
//!     .tools(Arc::new(registry))
//!     .build()?;
//! ```

pub mod error;
pub mod search;
pub mod svckit;

use std::sync::Arc;

use agent_core::ToolRegistry;

use svckit::PythonConfig;

pub use error::{Result, ToolsError};
pub use search::{SearchBackend, SearchHit, StaticSearch, TavilySearch};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{PythonConfig, PythonInterpreterTool, Sandbox, WebSearchTool};
}

/// Registry with internet search (Tavily) and the Python interpreter
pub fn standard_registry(tavily_api_key: &str) -> agent_core::Result<ToolRegistry> {
    let backend: Arc<dyn SearchBackend> = Arc::new(TavilySearch::new(tavily_api_key)?);
    registry_with_backend(backend, PythonConfig::default())
}

/// Same tool set over an arbitrary search backend
pub fn registry_with_backend(
    backend: Arc<dyn SearchBackend>,
    python: PythonConfig,
) -> agent_core::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(svckit::WebSearchTool::new(backend))?;
    registry.register(svckit::PythonInterpreterTool::new(python))?;
    tracing::info!(tools = ?registry.names(), "Tool registry ready");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contents() {
        let registry = registry_with_backend(Arc::new(StaticSearch::default()), PythonConfig::default()).unwrap();
        assert_eq!(registry.names(), vec!["internet_search", "python_interpreter"]);
        
        let schema = registry.get("python_interpreter").unwrap().spec().json_schema();
        assert_eq!(schema["required"], serde_json::json!(["code"]));
    }

    #[test]
    fn test_standard_registry_needs_key() {
        let err = standard_registry("").err().unwrap();
        assert!(matches!(err, agent_core::AgentError::Config(_)));
    }
}
