//! Tavily search API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SearchBackend, SearchHit};
use crate::error::{Result, ToolsError};

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

/// Tavily search backend
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ToolsError::Config("Tavily API key is empty".into()));
        }
        
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        
        Ok(Self {
            client,
            api_key,
            endpoint: TAVILY_ENDPOINT.into(),
        })
    }
    
    /// Override the API endpoint (proxies, test servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
    
    fn convert_response(response: SearchResponse, max_results: usize) -> Vec<SearchHit> {
        response
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect()
    }
}

#[async_trait]
impl SearchBackend for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            query,
            max_results,
            search_depth: "basic",
        };
        
        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolsError::Search(format!("tavily returned {status}: {}", body.trim())));
        }
        
        let body: SearchResponse = response.json().await?;
        Ok(Self::convert_response(body, max_results))
    }
    
    fn name(&self) -> &str {
        "tavily"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(TavilySearch::new("  "), Err(ToolsError::Config(_))));
    }

    #[test]
    fn test_response_conversion() {
        let body: SearchResponse = serde_json::from_value(json!({
            "query": "rust",
            "results": [
                {"title": "Rust", "url": "https://www.rust-lang.org", "content": "A language", "score": 0.98},
                {"title": "Crates", "url": "https://crates.io", "content": "Registry", "score": 0.91},
                {"url": "https://docs.rs", "score": 0.5}
            ]
        }))
        .unwrap();
        
        let hits = TavilySearch::convert_response(body, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://www.rust-lang.org");
        assert_eq!(hits[1].title, "Crates");
    }

    #[test]
    fn test_request_body() {
        let request = SearchRequest { query: "weather in Paris", max_results: 5, search_depth: "basic" };
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({"query": "weather in Paris", "max_results": 5, "search_depth": "basic"})
        );
    }
}
