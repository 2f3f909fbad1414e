use std::sync::Arc;
use tracing::info;

use crate::agent::stateless_llm::azure_openai_llm::AzureOpenAILLM;
use crate::agent::stateless_llm::openai_compatible_llm::OpenAICompatibleLLM;
use crate::agent::stateless_llm::StatelessLLMInterface;
use crate::config_manager::{LlmProfileConfig, LlmProvider};

/// Factory for creating stateless LLM instances
pub struct StatelessLLMFactory;

impl StatelessLLMFactory {
    /// Create an LLM client for a validated profile.
    pub fn create_llm(profile: &LlmProfileConfig) -> Arc<dyn StatelessLLMInterface> {
        info!(
            "Initializing {} LLM: {:?}",
            profile.kind.name(),
            profile.provider
        );

        match profile.provider {
            LlmProvider::AzureOpenAI => Arc::new(AzureOpenAILLM::new(
                profile.endpoint.clone(),
                profile.api_key.clone(),
                profile.deployment.clone(),
                profile.api_version.clone(),
                profile.model.clone(),
            )),
            LlmProvider::OpenAICompatible => Arc::new(OpenAICompatibleLLM::new(
                profile.endpoint.clone(),
                profile.api_key.clone(),
                profile.model.clone(),
            )),
        }
    }
}
