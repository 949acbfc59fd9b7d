//! Cohere Provider
//!
//! `LlmProvider` over the Cohere v2 chat API with native tool calling.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{ensure_non_empty, GenerationOptions, LlmProvider, ModelResponse, ProviderInfo, ToolCallingMode},
    tool::{ToolCall, ToolSpec},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::http;

const PROVIDER: &str = "cohere";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<CohereMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<CohereTool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum CohereMessage {
    User { content: String },
    Assistant {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<CohereToolCall>,
    },
    Tool { tool_call_id: String, content: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct CohereToolCall {
    id: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    function: CohereFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct CohereFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct CohereTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: CohereToolDefinition,
}

#[derive(Debug, Serialize)]
struct CohereToolDefinition {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    tool_calls: Vec<CohereToolCall>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Cohere chat provider
pub struct CohereProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    options: GenerationOptions,
}

impl CohereProvider {
    pub fn new(api_key: impl Into<String>, options: GenerationOptions) -> Result<Self> {
        Ok(Self {
            client: http::client(Duration::from_secs(120))?,
            api_key: api_key.into(),
            base_url: crate::settings::DEFAULT_COHERE_BASE_URL.into(),
            options,
        })
    }
    
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
    
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http::client(timeout)?;
        Ok(self)
    }
    
    fn convert_messages(messages: &[Message]) -> Vec<CohereMessage> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::User => CohereMessage::User { content: m.text().into_owned() },
                Role::Assistant => match &m.tool_call {
                    Some(call) => CohereMessage::Assistant {
                        content: None,
                        tool_calls: vec![CohereToolCall {
                            id: call.id.clone(),
                            kind: Some("function".into()),
                            function: CohereFunction {
                                name: call.name.clone(),
                                arguments: call.arguments.to_string(),
                            },
                        }],
                    },
                    None => CohereMessage::Assistant {
                        content: Some(m.text().into_owned()),
                        tool_calls: Vec::new(),
                    },
                },
                Role::Tool => CohereMessage::Tool {
                    tool_call_id: m.tool_result.as_ref().map(|r| r.call_id.clone()).unwrap_or_default(),
                    content: m.text().into_owned(),
                },
            })
            .collect()
    }
    
    fn build_request(&self, messages: &[Message], tools: &[ToolSpec]) -> ChatRequest {
        ChatRequest {
            model: self.options.model.clone(),
            messages: Self::convert_messages(messages),
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
            tools: tools
                .iter()
                .map(|t| CohereTool {
                    kind: "function",
                    function: CohereToolDefinition {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.json_schema(),
                    },
                })
                .collect(),
        }
    }
    
    fn convert_response(response: ChatResponse) -> Result<ModelResponse> {
        let message = response.message;
        if !message.tool_calls.is_empty() {
            let calls = message
                .tool_calls
                .into_iter()
                .map(|c| ToolCall::new(c.function.name, http::parse_arguments(&c.function.arguments)).with_id(c.id))
                .collect();
            return Ok(ModelResponse::ToolCalls(calls));
        }
        
        let text: String = message
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");
        
        if text.trim().is_empty() {
            return Err(AgentError::Provider("cohere: empty response".into()));
        }
        Ok(ModelResponse::FinalAnswer(text))
    }
}

#[async_trait]
impl LlmProvider for CohereProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER.into(),
            model: self.options.model.clone(),
            tool_calling: ToolCallingMode::Native,
        }
    }
    
    async fn health_check(&self) -> Result<bool> {
        match self.client
            .get(format!("{}/v1/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(r) => Ok(r.status().is_success()),
            Err(e) => {
                tracing::warn!("Cohere health check failed: {}", e);
                Ok(false)
            }
        }
    }
    
    async fn complete(&self, transcript: &[Message], tools: &[ToolSpec]) -> Result<ModelResponse> {
        ensure_non_empty(transcript)?;
        let request = self.build_request(transcript, tools);
        
        let response = self.client
            .post(format!("{}/v2/chat", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error(PROVIDER, &e))?;
        
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(http::status_error(PROVIDER, status, &body));
        }
        
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("cohere: malformed response: {e}")))?;
        
        Self::convert_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::ToolResult;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> Result<ModelResponse> {
        CohereProvider::convert_response(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn test_request_shape() {
        let provider = CohereProvider::new("co-key", GenerationOptions::for_model("command-r-plus")).unwrap();
        let call = ToolCall::new("internet_search", json!({"query": "rust"})).with_id("tc_1");
        let result = ToolResult::failure("internet_search", "timeout").with_id("tc_1");
        let transcript = vec![
            Message::user("Search rust"),
            Message::tool_request(call),
            Message::tool(&result),
        ];
        
        let request = serde_json::to_value(provider.build_request(&transcript, &[])).unwrap();
        
        assert_eq!(request["model"], "command-r-plus");
        assert!(request.get("tools").is_none());
        assert_eq!(request["messages"][0], json!({"role": "user", "content": "Search rust"}));
        assert_eq!(request["messages"][1]["role"], "assistant");
        assert_eq!(request["messages"][1]["tool_calls"][0]["id"], "tc_1");
        assert_eq!(request["messages"][2]["role"], "tool");
        assert_eq!(request["messages"][2]["tool_call_id"], "tc_1");
    }

    #[test]
    fn test_text_response_joins_blocks() {
        let response = parse(json!({
            "id": "abc",
            "finish_reason": "COMPLETE",
            "message": {
                "role": "assistant",
                "content": [{"type": "text", "text": "Paris"}, {"type": "text", "text": "is the capital."}]
            }
        }))
        .unwrap();
        assert_eq!(response, ModelResponse::FinalAnswer("Paris\nis the capital.".into()));
    }

    #[test]
    fn test_tool_call_response() {
        let response = parse(json!({
            "message": {
                "role": "assistant",
                "tool_plan": "I will search.",
                "tool_calls": [{
                    "id": "internet_search_abc",
                    "type": "function",
                    "function": {"name": "internet_search", "arguments": "{\"query\":\"capital of France\"}"}
                }]
            }
        }))
        .unwrap();
        
        let expected = ToolCall::new("internet_search", json!({"query": "capital of France"}))
            .with_id("internet_search_abc");
        assert_eq!(response, ModelResponse::tool_call(expected));
    }

    #[test]
    fn test_empty_response_is_provider_error() {
        let err = parse(json!({"message": {"role": "assistant", "content": []}})).unwrap_err();
        assert!(matches!(err, AgentError::Provider(_)));
    }
}
