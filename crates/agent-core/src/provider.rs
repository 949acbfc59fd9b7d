//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for all chat-model providers (OpenAI, Cohere,
//! local Ollama, ...) so the reasoning loop never branches on which backend
//! it is talking to.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::LlmProvider;
//!
//! let provider = OpenAiProvider::new(api_key, GenerationOptions::for_model("gpt-4o-mini"))?;
//! let response = provider.complete(transcript.messages(), &registry.specs()).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::tool::{ToolCall, ToolSpec};

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gpt-4o-mini", "command-r-plus", "llama3.2")
    pub model: String,
    
    /// Temperature for sampling (0.0 = deterministic)
    #[serde(default)]
    pub temperature: f32,
    
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_max_tokens() -> u32 { 2048 }

impl GenerationOptions {
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}

/// What the model wants to do next
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ModelResponse {
    /// Plain text answer, ends the run
    FinalAnswer(String),
    
    /// One or more tool requests, dispatched in order
    ToolCalls(Vec<ToolCall>),
}

impl ModelResponse {
    pub fn tool_call(call: ToolCall) -> Self {
        Self::ToolCalls(vec![call])
    }
    
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::FinalAnswer(_))
    }
}

/// How a provider expresses tool calls
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallingMode {
    /// The provider API has structured tool calling
    Native,
    
    /// Tool calls are prompted for and parsed out of plain text
    ReactText,
}

/// Supported provider identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Cohere,
    Ollama,
}

impl ProviderKind {
    pub const ALL: [Self; 3] = [Self::OpenAi, Self::Cohere, Self::Ollama];
    
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Cohere => "cohere",
            Self::Ollama => "ollama",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = AgentError;
    
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "cohere" => Ok(Self::Cohere),
            "ollama" | "local" => Ok(Self::Ollama),
            _ => Err(AgentError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "openai", "ollama")
    pub name: String,
    
    /// Model the adapter was built for
    pub model: String,
    
    /// How tool calls are expressed
    pub tool_calling: ToolCallingMode,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends. Adapters are
/// stateless between calls: everything they need comes in with the
/// transcript and the tool list.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get provider information and capabilities
    fn info(&self) -> ProviderInfo;
    
    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;
    
    /// Ask the model for its next step
    async fn complete(&self, transcript: &[Message], tools: &[ToolSpec]) -> Result<ModelResponse>;
}

/// Reject empty transcripts before anything goes on the wire
pub fn ensure_non_empty(transcript: &[Message]) -> Result<()> {
    if transcript.is_empty() {
        Err(AgentError::EmptyTranscript)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.temperature, 0.0);
        assert_eq!(opts.max_tokens, 2048);
        assert_eq!(GenerationOptions::for_model("llama3.2").model, "llama3.2");
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("Cohere".parse::<ProviderKind>().unwrap(), ProviderKind::Cohere);
        assert_eq!("local".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert_eq!(" ollama ".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        
        let err = "huggingface".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, AgentError::UnsupportedProvider(ref name) if name == "huggingface"));
    }

    #[test]
    fn test_empty_transcript_rejected() {
        assert!(matches!(ensure_non_empty(&[]), Err(AgentError::EmptyTranscript)));
        assert!(ensure_non_empty(&[Message::user("hi")]).is_ok());
    }
}
