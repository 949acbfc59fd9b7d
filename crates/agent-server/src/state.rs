//! Application State

use std::sync::Arc;

use agent_core::{CancellationToken, ToolRegistry};
use agent_runtime::Settings;

/// Shared application state
///
/// Everything here is read-only once the server starts; each request builds
/// its own provider and agent and owns its own transcript.
#[derive(Clone)]
pub struct AppState {
    /// Startup configuration (credentials, defaults, loop limits)
    pub settings: Arc<Settings>,
    
    /// Tool registry with all available tools
    pub tools: Arc<ToolRegistry>,
    
    /// Cancelled on shutdown; runs hold child tokens
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(settings: Settings, tools: ToolRegistry) -> Self {
        Self {
            settings: Arc::new(settings),
            tools: Arc::new(tools),
            shutdown: CancellationToken::new(),
        }
    }
}
