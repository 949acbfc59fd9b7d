//! Static Search Backend
//!
//! For testing and offline demos. Returns canned hits for every query.

use async_trait::async_trait;

use super::{SearchBackend, SearchHit};
use crate::error::Result;

/// Search backend with a fixed result set
#[derive(Clone, Debug, Default)]
pub struct StaticSearch {
    hits: Vec<SearchHit>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }
    
    /// Add a hit
    pub fn with_hit(mut self, title: &str, url: &str, content: &str) -> Self {
        self.hits.push(SearchHit {
            title: title.into(),
            url: url.into(),
            content: content.into(),
        });
        self
    }
}

#[async_trait]
impl SearchBackend for StaticSearch {
    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }
    
    fn name(&self) -> &str {
        "static"
    }
}
