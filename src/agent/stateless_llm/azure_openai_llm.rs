use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::openai_compatible_llm::{send_chat_request, ChatCompletionBody};
use super::stateless_llm_interface::StatelessLLMInterface;
use crate::agent::input_types::CompletionRequest;
use crate::error::CompletionError;

/// Azure OpenAI deployment reached through the `api-key` header
pub struct AzureOpenAILLM {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    model: String,
}

impl AzureOpenAILLM {
    pub fn new(
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
        model: String,
    ) -> Self {
        info!(
            "Initialized AzureOpenAILLM: deployment={}, model={}, endpoint={}",
            deployment, model, endpoint
        );
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            deployment,
            api_version,
            model,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[async_trait]
impl StatelessLLMInterface for AzureOpenAILLM {
    async fn chat_completion(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatCompletionBody {
            messages: &request.messages,
            max_tokens: request.max_tokens,
            model: Some(&self.model),
            temperature: request.temperature,
        };

        let builder = self.client.post(self.url()).header("api-key", &self.api_key);
        send_chat_request(builder, &request, &body).await
    }
}
