//! OpenAI Provider
//!
//! `LlmProvider` over the chat completions API, using native function
//! calling for tools.

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

const PROVIDER: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<FunctionTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parallel_tool_calls: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct FunctionTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDefinition,
}

#[derive(Debug, Serialize)]
struct FunctionDefinition {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

fn function_type() -> String {
    "function".into()
}

/// OpenAI chat completions provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    options: GenerationOptions,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, options: GenerationOptions) -> Result<Self> {
        Ok(Self {
            client: http::client(Duration::from_secs(120))?,
            api_key: api_key.into(),
            base_url: crate::settings::DEFAULT_OPENAI_BASE_URL.into(),
            options,
        })
    }
    
    /// Point at an OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
    
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http::client(timeout)?;
        Ok(self)
    }
    
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::User => ChatMessage {
                    role: "user",
                    content: Some(m.text().into_owned()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Role::Assistant => match &m.tool_call {
                    Some(call) => ChatMessage {
                        role: "assistant",
                        content: None,
                        tool_calls: Some(vec![WireToolCall {
                            id: call.id.clone(),
                            kind: function_type(),
                            function: WireFunction {
                                name: call.name.clone(),
                                arguments: call.arguments.to_string(),
                            },
                        }]),
                        tool_call_id: None,
                    },
                    None => ChatMessage {
                        role: "assistant",
                        content: Some(m.text().into_owned()),
                        tool_calls: None,
                        tool_call_id: None,
                    },
                },
                Role::Tool => ChatMessage {
                    role: "tool",
                    content: Some(m.text().into_owned()),
                    tool_calls: None,
                    tool_call_id: m.tool_result.as_ref().map(|r| r.call_id.clone()),
                },
            })
            .collect()
    }
    
    fn convert_tools(tools: &[ToolSpec]) -> Vec<FunctionTool> {
        tools
            .iter()
            .map(|t| FunctionTool {
                kind: "function",
                function: FunctionDefinition {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.json_schema(),
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
            tools: Self::convert_tools(tools),
            // One call per response keeps the loop's ordering deterministic
            parallel_tool_calls: (!tools.is_empty()).then_some(false),
        }
    }
    
    /// Normalize a chat completion into the next step
    fn convert_response(response: ChatResponse) -> Result<ModelResponse> {
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("openai: no choices in response".into()))?
            .message;
        
        let calls: Vec<ToolCall> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|c| ToolCall::new(c.function.name, http::parse_arguments(&c.function.arguments)).with_id(c.id))
            .collect();
        if !calls.is_empty() {
            return Ok(ModelResponse::ToolCalls(calls));
        }
        
        match message.content {
            Some(text) if !text.trim().is_empty() => Ok(ModelResponse::FinalAnswer(text)),
            _ => Err(AgentError::Provider(
                "openai: empty response, no content or tool calls".into(),
            )),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER.into(),
            model: self.options.model.clone(),
            tool_calling: ToolCallingMode::Native,
        }
    }
    
    async fn health_check(&self) -> Result<bool> {
        let response = self.client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await;
        
        match response {
            Ok(r) => Ok(r.status().is_success()),
            Err(e) => {
                tracing::warn!("OpenAI health check failed: {}", e);
                Ok(false)
            }
        }
    }
    
    async fn complete(&self, transcript: &[Message], tools: &[ToolSpec]) -> Result<ModelResponse> {
        ensure_non_empty(transcript)?;
        let request = self.build_request(transcript, tools);
        
        let response = self.client
            .post(format!("{}/chat/completions", self.base_url))
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
            .map_err(|e| AgentError::Provider(format!("openai: malformed response: {e}")))?;
        
        Self::convert_response(body)
    }
}
