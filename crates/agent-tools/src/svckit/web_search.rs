//! Internet Search Tool
//!
//! Returns document snippets for a textual query from a search backend.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{
    tool::ParameterSchema,
    ParamType, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSpec,
};

use crate::search::{SearchBackend, SearchHit, DEFAULT_MAX_RESULTS};

pub const WEB_SEARCH_TOOL: &str = "internet_search";

/// Tool for searching the internet
pub struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
    
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }
}

/// Numbered list of title, url and snippet
pub fn format_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".into();
    }
    
    let mut output = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let _ = writeln!(output, "{}. {}\n   {}\n   {}", i + 1, hit.title, hit.url, hit.content.trim());
    }
    output.trim_end().to_string()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: WEB_SEARCH_TOOL.into(),
            description: "Returns a list of relevant document snippets for a textual query retrieved from the internet.".into(),
            parameters: vec![
                ParameterSchema::required("query", ParamType::String, "Query to search the internet with"),
            ],
        }
    }
    
    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call.str_arg("query").unwrap_or_default().trim();
        if query.is_empty() {
            return Ok(ToolResult::failure(WEB_SEARCH_TOOL, "Query must not be empty"));
        }
        
        tracing::debug!(backend = self.backend.name(), query, "Searching");
        let hits = self.backend.search(query, self.max_results).await?;
        
        let data = serde_json::to_value(&hits)?;
        Ok(ToolResult::success(WEB_SEARCH_TOOL, format_results(&hits)).with_data(data))
    }
}
