//! Provider Factory
//!
//! Maps a provider identifier and model name to a configured adapter.

use std::str::FromStr;
use std::sync::Arc;

use agent_core::{AgentError, GenerationOptions, LlmProvider, ProviderKind, Result};

use crate::cohere::CohereProvider;
use crate::openai::OpenAiProvider;
use crate::settings::Settings;

/// Build an adapter for `kind` serving `model`
///
/// Hosted providers fail with `AgentError::Config` when their API key is
/// missing, before any network traffic.
pub fn create_provider(kind: ProviderKind, model: &str, settings: &Settings) -> Result<Arc<dyn LlmProvider>> {
    let options = GenerationOptions::for_model(model);
    
    let provider: Arc<dyn LlmProvider> = match kind {
        ProviderKind::OpenAi => Arc::new(
            OpenAiProvider::new(settings.api_key(kind)?, options)?
                .with_base_url(&settings.openai_base_url)
                .with_timeout(settings.request_timeout)?,
        ),
        ProviderKind::Cohere => Arc::new(
            CohereProvider::new(settings.api_key(kind)?, options)?
                .with_base_url(&settings.cohere_base_url)
                .with_timeout(settings.request_timeout)?,
        ),
        #[cfg(feature = "ollama")]
        ProviderKind::Ollama => Arc::new(crate::ollama::OllamaProvider::from_config(
            crate::ollama::OllamaConfig::new(settings.ollama.clone(), options),
        )),
        #[cfg(not(feature = "ollama"))]
        ProviderKind::Ollama => {
            return Err(AgentError::UnsupportedProvider(
                "ollama (built without the `ollama` feature)".into(),
            ));
        }
    };
    
    tracing::info!(provider = %kind, model, "Provider created");
    Ok(provider)
}

/// Same as [`create_provider`], from a textual identifier such as `"local"`
pub fn create_provider_by_name(name: &str, model: Option<&str>, settings: &Settings) -> Result<Arc<dyn LlmProvider>> {
    let kind = ProviderKind::from_str(name).map_err(|_| {
        AgentError::UnsupportedProvider(format!(
            "{name}. Available: {}",
            ProviderKind::ALL.map(ProviderKind::as_str).join(", ")
        ))
    })?;
    let model = model.unwrap_or_else(|| crate::settings::default_model(kind));
    create_provider(kind, model, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::ToolCallingMode;

    fn settings() -> Settings {
        Settings {
            openai_api_key: Some("sk-test".into()),
            cohere_api_key: Some("co-test".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_creates_each_provider() {
        let settings = settings();
        
        let openai = create_provider(ProviderKind::OpenAi, "gpt-4o-mini", &settings).unwrap();
        assert_eq!(openai.info().name, "openai");
        assert_eq!(openai.info().model, "gpt-4o-mini");
        
        let cohere = create_provider_by_name("Cohere", None, &settings).unwrap();
        assert_eq!(cohere.info().model, "command-r-plus");
        assert_eq!(cohere.info().tool_calling, ToolCallingMode::Native);
    }

    #[cfg(feature = "ollama")]
    #[test]
    fn test_local_alias() {
        let provider = create_provider_by_name("local", Some("llama3.2"), &settings()).unwrap();
        assert_eq!(provider.info().name, "ollama");
        assert_eq!(provider.info().tool_calling, ToolCallingMode::ReactText);
    }

    #[test]
    fn test_unknown_identifier() {
        let err = create_provider_by_name("bard", None, &settings()).err().unwrap();
        assert!(matches!(err, AgentError::UnsupportedProvider(ref msg) if msg.contains("openai, cohere, ollama")));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = create_provider(ProviderKind::OpenAi, "gpt-4o", &Settings::default()).err().unwrap();
        assert!(matches!(err, AgentError::Config(ref msg) if msg.contains("OPENAI_API_KEY")));
    }
}
