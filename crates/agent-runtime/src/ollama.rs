//! Ollama LLM Provider
//!
//! `LlmProvider` for local Ollama inference. Local models have no reliable
//! native tool calling, so the transcript is rendered through the ReAct text
//! grammar and replies are parsed back into tool calls or a final answer.

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{ensure_non_empty, GenerationOptions, LlmProvider, ModelResponse, ProviderInfo, ToolCallingMode},
    react::{self, TextRole},
    tool::ToolSpec,
};
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    models::ModelOptions,
    Ollama,
};

use crate::settings::OllamaEndpoint;

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    pub endpoint: OllamaEndpoint,
    
    /// Sampling and model selection
    pub options: GenerationOptions,
}

impl OllamaConfig {
    pub fn new(endpoint: OllamaEndpoint, options: GenerationOptions) -> Self {
        Self { endpoint, options }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: OllamaEndpoint::default(),
            options: GenerationOptions::for_model(crate::settings::default_model(agent_core::ProviderKind::Ollama)),
        }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(config.endpoint.host.clone(), config.endpoint.port),
            config,
        }
    }
    
    /// Local Ollama on the default port
    pub fn localhost(model: impl Into<String>) -> Self {
        Self::from_config(OllamaConfig {
            options: GenerationOptions::for_model(model),
            ..Default::default()
        })
    }
    
    /// Render the transcript as plain chat turns
    fn convert_messages(messages: &[Message], tools: &[ToolSpec]) -> Vec<ChatMessage> {
        react::render_transcript(messages, tools)
            .into_iter()
            .map(|(role, text)| match role {
                TextRole::System => ChatMessage::system(text),
                TextRole::User => ChatMessage::user(text),
                TextRole::Assistant => ChatMessage::assistant(text),
            })
            .collect()
    }
    
    fn build_options(opts: &GenerationOptions) -> ModelOptions {
        ModelOptions::default()
            .temperature(opts.temperature)
            .num_predict(i32::try_from(opts.max_tokens).unwrap_or(i32::MAX))
    }
    
    fn convert_reply(content: &str) -> Result<ModelResponse> {
        if content.trim().is_empty() {
            return Err(AgentError::Provider("ollama: empty response".into()));
        }
        Ok(react::parse_reply(content))
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "ollama".into(),
            model: self.config.options.model.clone(),
            tool_calling: ToolCallingMode::ReactText,
        }
    }
    
    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }
    
    async fn complete(&self, transcript: &[Message], tools: &[ToolSpec]) -> Result<ModelResponse> {
        ensure_non_empty(transcript)?;
        
        let request = ChatMessageRequest::new(
            self.config.options.model.clone(),
            Self::convert_messages(transcript, tools),
        ).options(Self::build_options(&self.config.options));
        
        let response = self.client
            .send_chat_messages(request)
            .await
            .map_err(|e| AgentError::Provider(format!("ollama: {e}")))?;
        
        tracing::debug!(chars = response.message.content.len(), "Ollama reply received");
        Self::convert_reply(&response.message.content)
    }
}
