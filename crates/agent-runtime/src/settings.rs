//! Runtime Settings
//!
//! Everything a process needs to build providers, tools and agents, read
//! once from the environment at startup and passed around by reference.

use std::str::FromStr;
use std::time::Duration;

use agent_core::{AgentConfig, AgentError, ProviderKind, Result};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COHERE_BASE_URL: &str = "https://api.cohere.com";

/// Ollama endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OllamaEndpoint {
    /// Ollama host URL
    pub host: String,
    
    /// Ollama port
    pub port: u16,
}

impl Default for OllamaEndpoint {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
        }
    }
}

/// Process-wide configuration
#[derive(Clone, Debug)]
pub struct Settings {
    /// Default provider for runs
    pub provider: ProviderKind,
    
    /// Default model identifier
    pub model: String,
    
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub cohere_api_key: Option<String>,
    pub cohere_base_url: String,
    pub ollama: OllamaEndpoint,
    
    /// API key for the internet search tool
    pub tavily_api_key: Option<String>,
    
    /// HTTP timeout for provider requests
    pub request_timeout: Duration,
    
    /// Reasoning loop limits
    pub agent: AgentConfig,
    
    /// Listen address for the HTTP server
    pub bind_addr: String,
}

/// Default model per provider
pub const fn default_model(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => "gpt-3.5-turbo",
        ProviderKind::Cohere => "command-r-plus",
        ProviderKind::Ollama => "llama3.2",
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: default_model(ProviderKind::OpenAi).into(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.into(),
            cohere_api_key: None,
            cohere_base_url: DEFAULT_COHERE_BASE_URL.into(),
            ollama: OllamaEndpoint::default(),
            tavily_api_key: None,
            request_timeout: Duration::from_secs(120),
            agent: AgentConfig::default(),
            bind_addr: "0.0.0.0:3000".into(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
    
    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();
        
        let provider = match var("LLM_PROVIDER") {
            Some(name) => ProviderKind::from_str(&name)?,
            None => defaults.provider,
        };
        let model = var("LLM_MODEL").unwrap_or_else(|| default_model(provider).into());
        
        let ollama = OllamaEndpoint {
            host: var("OLLAMA_HOST").unwrap_or(defaults.ollama.host),
            port: parse_var(&var, "OLLAMA_PORT")?.unwrap_or(defaults.ollama.port),
        };
        
        let agent = AgentConfig {
            max_steps: parse_var(&var, "AGENT_MAX_STEPS")?.unwrap_or(defaults.agent.max_steps),
            max_tool_calls_per_step: parse_var(&var, "AGENT_MAX_TOOL_CALLS_PER_STEP")?
                .unwrap_or(defaults.agent.max_tool_calls_per_step),
            model_timeout: parse_var(&var, "AGENT_MODEL_TIMEOUT_SECS")?
                .map_or(defaults.agent.model_timeout, Duration::from_secs),
            tool_timeout: parse_var(&var, "AGENT_TOOL_TIMEOUT_SECS")?
                .map_or(defaults.agent.tool_timeout, Duration::from_secs),
        };
        agent.validate()?;
        
        Ok(Self {
            provider,
            model,
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            cohere_api_key: var("COHERE_API_KEY").or_else(|| var("CO_API_KEY")),
            cohere_base_url: var("COHERE_BASE_URL").unwrap_or(defaults.cohere_base_url),
            ollama,
            tavily_api_key: var("TAVILY_API_KEY"),
            request_timeout: parse_var(&var, "LLM_REQUEST_TIMEOUT_SECS")?
                .map_or(defaults.request_timeout, Duration::from_secs),
            agent,
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
    
    /// Override the default provider and model (e.g. from CLI flags)
    pub fn with_provider(mut self, provider: ProviderKind, model: Option<String>) -> Self {
        self.model = model.unwrap_or_else(|| default_model(provider).into());
        self.provider = provider;
        self
    }
    
    /// API key for a hosted provider
    pub fn api_key(&self, kind: ProviderKind) -> Result<&str> {
        let (key, var) = match kind {
            ProviderKind::OpenAi => (&self.openai_api_key, "OPENAI_API_KEY"),
            ProviderKind::Cohere => (&self.cohere_api_key, "COHERE_API_KEY"),
            ProviderKind::Ollama => return Ok(""),
        };
        key.as_deref()
            .ok_or_else(|| AgentError::Config(format!("{var} is not set")))
    }
    
    /// API key for the internet search tool
    pub fn search_api_key(&self) -> Result<&str> {
        self.tavily_api_key
            .as_deref()
            .ok_or_else(|| AgentError::Config("TAVILY_API_KEY is not set".into()))
    }
    
    /// Fail fast when a secret needed by the default provider or the tools is missing
    pub fn validate(&self) -> Result<()> {
        self.api_key(self.provider)?;
        self.search_api_key()?;
        Ok(())
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| AgentError::Config(format!("{key} has an invalid value: {raw}")))
        })
        .transpose()
}
