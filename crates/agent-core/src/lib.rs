//! # agent-core
//!
//! Agent execution core: provider-agnostic chat-model abstraction, a
//! schema-validated tool registry, and a bounded ReAct reasoning loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Reasoning  │  │    Tool     │  │   LlmProvider       │  │
//! │  │    Loop     │──│   Registry  │  │   (Strategy)        │  │
//! │  └──────┬──────┘  └─────────────┘  └──────────▲──────────┘  │
//! │         └─────────────────────────────────────┘             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between OpenAI, Cohere, a local
//! Ollama model, or any other provider without changing agent logic.

pub mod error;
pub mod message;
pub mod provider;
pub mod react;
pub mod reasoning;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Content, Message, Role, Transcript};
pub use provider::{GenerationOptions, LlmProvider, ModelResponse, ProviderInfo, ProviderKind, ToolCallingMode};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, RunAborted, RunReport, StepResult};
pub use tool::{ParamType, ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSpec};

pub use tokio_util::sync::CancellationToken;
