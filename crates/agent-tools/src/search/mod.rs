//! Search Integration
//!
//! Abstractions and implementations for web search APIs.

mod mock;
mod tavily;

pub use mock::StaticSearch;
pub use tavily::TavilySearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default number of hits requested per query
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// A single search result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    
    /// Relevant snippet of the page
    pub content: String,
}

/// Search backend trait (Strategy pattern)
///
/// Implement this for each search API: Tavily, Bing, SearxNG, etc.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a query and return up to `max_results` hits, best first
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
    
    /// Backend name
    fn name(&self) -> &str;
}
