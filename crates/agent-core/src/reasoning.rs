//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern: the model is asked for its
//! next step, requested tools are run through the registry, their results are
//! fed back, and the loop repeats until the model answers, something fatal
//! happens, or the step ceiling is hit.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{AgentError, Result};
use crate::message::{Message, Transcript};
use crate::provider::{LlmProvider, ModelResponse};
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSpec};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Maximum model calls per run
    pub max_steps: usize,
    
    /// Tool calls kept from a single model response; extras are dropped
    pub max_tool_calls_per_step: usize,
    
    /// Budget for one model call
    pub model_timeout: Duration,
    
    /// Budget for one tool invocation
    pub tool_timeout: Duration,
}

pub const DEFAULT_MAX_STEPS: usize = 15;

/// Upper bound accepted for `max_steps`
pub const MAX_STEPS_CEILING: usize = 1_000;

/// Upper bound accepted for `max_tool_calls_per_step`
pub const MAX_TOOL_CALLS_CEILING: usize = 64;

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_tool_calls_per_step: 4,
            model_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(60),
        }
    }
}

impl AgentConfig {
    /// Most messages a run can append: the user input plus a request and a
    /// result for every tool call of every step.
    pub const fn transcript_limit(&self) -> usize {
        self.max_steps
            .saturating_mul(2)
            .saturating_mul(self.calls_per_step())
            .saturating_add(1)
    }
    
    /// Reject limits outside `1..=MAX_STEPS_CEILING` and `0..=MAX_TOOL_CALLS_CEILING`
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 || self.max_steps > MAX_STEPS_CEILING {
            return Err(AgentError::Config(format!(
                "max_steps must be between 1 and {MAX_STEPS_CEILING}, got {}",
                self.max_steps
            )));
        }
        if self.max_tool_calls_per_step > MAX_TOOL_CALLS_CEILING {
            return Err(AgentError::Config(format!(
                "max_tool_calls_per_step must be at most {MAX_TOOL_CALLS_CEILING}, got {}",
                self.max_tool_calls_per_step
            )));
        }
        Ok(())
    }
    
    const fn calls_per_step(&self) -> usize {
        if self.max_tool_calls_per_step == 0 { 1 } else { self.max_tool_calls_per_step }
    }
}

/// Outcome of one loop iteration
#[derive(Debug)]
pub enum StepResult {
    FinalAnswer(String),
    ToolInvocation(ToolCall),
    Failure(AgentError),
}

/// Reasoning loop state machine
#[derive(Debug)]
enum RunState {
    Started,
    AwaitingModel,
    AwaitingTool(ToolCall),
    Finished(String),
    Aborted(AgentError),
}

/// A completed run
#[derive(Debug)]
pub struct RunReport {
    pub answer: String,
    pub transcript: Transcript,
    /// Model calls made
    pub steps: usize,
}

/// A run that ended without an answer
#[derive(Debug, thiserror::Error)]
#[error("Run aborted after {steps} step(s): {reason}")]
pub struct RunAborted {
    #[source]
    pub reason: AgentError,
    /// Everything appended before the abort, for diagnostics
    pub transcript: Transcript,
    pub steps: usize,
}

/// The main Agent struct
///
/// Holds only read-only configuration; every run owns its own transcript, so
/// one agent can serve several runs concurrently.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }
    
    /// Create with default configuration
    pub fn with_defaults(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }
    
    /// Run the agent on a user query
    pub async fn run(&self, query: &str) -> std::result::Result<RunReport, RunAborted> {
        self.run_with_cancel(query, &CancellationToken::new()).await
    }
    
    /// Run the agent, stopping early once `cancel` fires
    pub async fn run_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<RunReport, RunAborted> {
        let info = self.provider.info();
        let tools = self.tools.specs();
        let mut transcript = Transcript::with_limit(self.config.transcript_limit());
        let mut pending: VecDeque<ToolCall> = VecDeque::new();
        let mut steps = 0;
        let mut state = RunState::Started;
        
        tracing::info!(provider = %info.name, model = %info.model, "Starting run");
        
        loop {
            state = match state {
                RunState::Started => match transcript.push(Message::user(query)) {
                    Ok(()) => RunState::AwaitingModel,
                    Err(e) => RunState::Aborted(e),
                },
                
                RunState::AwaitingModel => {
                    if cancel.is_cancelled() {
                        RunState::Aborted(AgentError::Cancelled)
                    } else if steps >= self.config.max_steps {
                        RunState::Aborted(AgentError::StepLimitExceeded(self.config.max_steps))
                    } else {
                        steps += 1;
                        tracing::debug!(step = steps, "Requesting next step from model");
                        let step = self.next_step(&transcript, &tools, &mut pending, cancel).await;
                        Self::apply_step(step, &mut transcript)
                    }
                }
                
                RunState::AwaitingTool(call) => {
                    if cancel.is_cancelled() {
                        RunState::Aborted(AgentError::Cancelled)
                    } else {
                        match self.run_tool(call, &mut transcript, cancel).await {
                            Ok(()) => pending
                                .pop_front()
                                .map_or(RunState::AwaitingModel, RunState::AwaitingTool),
                            Err(e) => RunState::Aborted(e),
                        }
                    }
                }
                
                RunState::Finished(answer) => {
                    tracing::info!(steps, messages = transcript.len(), "Run finished");
                    return Ok(RunReport {
                        answer,
                        transcript,
                        steps,
                    });
                }
                
                RunState::Aborted(reason) => {
                    tracing::warn!(steps, error = %reason, "Run aborted");
                    return Err(RunAborted {
                        reason,
                        transcript,
                        steps,
                    });
                }
            };
        }
    }
    
    /// Run with a simple string input, returning only the answer
    pub async fn ask(&self, question: &str) -> Result<String> {
        self.run(question)
            .await
            .map(|report| report.answer)
            .map_err(|aborted| aborted.reason)
    }
    
    /// Ask the model for its next step and normalize the reply
    async fn next_step(
        &self,
        transcript: &Transcript,
        tools: &[ToolSpec],
        pending: &mut VecDeque<ToolCall>,
        cancel: &CancellationToken,
    ) -> StepResult {
        let timeout = self.config.model_timeout;
        let completion = self.provider.complete(transcript.messages(), tools);
        
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AgentError::Cancelled),
            outcome = tokio::time::timeout(timeout, completion) => outcome.unwrap_or_else(|_| {
                Err(AgentError::Provider(format!(
                    "model call timed out after {}s",
                    timeout.as_secs_f32()
                )))
            }),
        };
        
        match response {
            Ok(ModelResponse::FinalAnswer(answer)) => StepResult::FinalAnswer(answer),
            Ok(ModelResponse::ToolCalls(mut calls)) => {
                let cap = self.config.calls_per_step();
                if calls.len() > cap {
                    tracing::warn!(
                        requested = calls.len(),
                        kept = cap,
                        "Model requested more tool calls than allowed per step"
                    );
                    calls.truncate(cap);
                }
                let mut calls = VecDeque::from(calls);
                match calls.pop_front() {
                    Some(first) => {
                        pending.extend(calls);
                        StepResult::ToolInvocation(first)
                    }
                    None => StepResult::Failure(AgentError::Provider(
                        "model returned an empty tool call list".into(),
                    )),
                }
            }
            Err(e) => StepResult::Failure(e),
        }
    }
    
    fn apply_step(step: StepResult, transcript: &mut Transcript) -> RunState {
        match step {
            StepResult::FinalAnswer(answer) => {
                match transcript.push(Message::assistant(answer.clone())) {
                    Ok(()) => RunState::Finished(answer),
                    Err(e) => RunState::Aborted(e),
                }
            }
            StepResult::ToolInvocation(call) => RunState::AwaitingTool(call),
            StepResult::Failure(e) => RunState::Aborted(e),
        }
    }
    
    /// Record the request, dispatch it and append the result
    ///
    /// Errors the model can react to become tool-result messages; only
    /// cancellation and transcript failures escape.
    async fn run_tool(
        &self,
        call: ToolCall,
        transcript: &mut Transcript,
        cancel: &CancellationToken,
    ) -> Result<()> {
        transcript.push(Message::tool_request(call.clone()))?;
        tracing::debug!(tool = %call.name, id = %call.id, "Executing tool");
        
        let timeout = self.config.tool_timeout;
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AgentError::Cancelled),
            outcome = tokio::time::timeout(timeout, self.tools.invoke(&call)) => {
                outcome.unwrap_or_else(|_| {
                    Err(AgentError::ToolExecution(format!(
                        "tool '{}' timed out after {}s",
                        call.name,
                        timeout.as_secs_f32()
                    )))
                })
            }
        };
        
        let result = match outcome {
            Ok(result) => result,
            Err(e) if e.is_recoverable() => {
                tracing::debug!(tool = %call.name, error = %e, "Feeding tool error back to model");
                ToolResult::from_error(&call.name, &e).with_id(call.id.clone())
            }
            Err(e) => return Err(e),
        };
        
        transcript.push(Message::tool(&result))
    }
    
    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
    
    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    shared_tools: Option<Arc<ToolRegistry>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            shared_tools: None,
            config: AgentConfig::default(),
        }
    }
    
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }
    
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Result<Self> {
        self.tools.register(tool)?;
        Ok(self)
    }
    
    /// Use an already-populated, shared registry
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.shared_tools = Some(tools);
        self
    }
    
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }
    
    pub fn max_steps(mut self, max: usize) -> Self {
        self.config.max_steps = max;
        self
    }
    
    pub fn model_timeout(mut self, timeout: Duration) -> Self {
        self.config.model_timeout = timeout;
        self
    }
    
    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.config.tool_timeout = timeout;
        self
    }
    
    pub fn build(self) -> Result<Agent> {
        let provider = self.provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        self.config.validate()?;
        
        let tools = match self.shared_tools {
            Some(shared) if self.tools.is_empty() => shared,
            Some(_) => {
                return Err(AgentError::Config(
                    "use either a shared registry or individual tools, not both".into(),
                ));
            }
            None => Arc::new(self.tools),
        };
        
        Ok(Agent::new(provider, tools, self.config))
    }
}
