//! Service Kit - Agent Tools
//!
//! Tools that implement `agent_core::Tool` for the orchestrator.

mod python_interpreter;
mod web_search;

pub use python_interpreter::{PythonConfig, PythonInterpreterTool, Sandbox, PYTHON_TOOL};
pub use web_search::{format_results, WebSearchTool, WEB_SEARCH_TOOL};
