//! # agent-runtime
//!
//! Provider adapters and startup configuration for the agent core.
//!
//! ## Providers
//!
//! - **OpenAI**: chat completions with native function calling
//! - **Cohere**: v2 chat API with native tool calling
//! - **Ollama** (default feature): local models driven through the ReAct
//!   text grammar
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{create_provider, Settings};
//!
//! let settings = Settings::from_env()?;
//! let provider = create_provider(settings.provider, &settings.model, &settings)?;
//! let agent = AgentBuilder::new()
//!     .provider(provider)
//!     .tools(registry)
//!     .build()?;
//! ```

mod http;

pub mod cohere;
pub mod factory;
pub mod openai;
pub mod settings;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use cohere::CohereProvider;
pub use factory::{create_provider, create_provider_by_name};
pub use openai::OpenAiProvider;
pub use settings::Settings;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, ProviderKind, Result, Role, Tool, ToolRegistry,
};
