use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::stateless_llm_interface::StatelessLLMInterface;
use crate::agent::input_types::{CompletionRequest, Message};
use crate::error::CompletionError;

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionBody<'a> {
    pub messages: &'a [Message],
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Send a prepared chat-completions request and pull `choices[0].message.content` out of the reply.
pub(crate) async fn send_chat_request(
    builder: reqwest::RequestBuilder,
    request: &CompletionRequest,
    body: &ChatCompletionBody<'_>,
) -> Result<String, CompletionError> {
    let response = builder.timeout(request.timeout).json(body).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CompletionError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let payload: ChatCompletionResponse = response.json().await.map_err(|e| {
        if e.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::MalformedResponse(e.to_string())
        }
    })?;

    let content = payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::MalformedResponse("missing choices[0].message.content".to_string()))?;

    debug!("Completion received: {}", preview(&content));
    Ok(content)
}

/// First 100 characters of a payload, for logs
pub(crate) fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(100).collect();
    if text.chars().count() > 100 {
        out.push_str("...");
    }
    out
}

/// OpenAI compatible LLM implementation
/// Talks to any `/chat/completions` endpoint that accepts bearer auth
pub struct OpenAICompatibleLLM {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAICompatibleLLM {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        info!(
            "Initialized OpenAICompatibleLLM: model={}, base_url={}",
            model, base_url
        );
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl StatelessLLMInterface for OpenAICompatibleLLM {
    async fn chat_completion(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionBody {
            messages: &request.messages,
            max_tokens: request.max_tokens,
            model: Some(&self.model),
            temperature: request.temperature,
        };

        let builder = self.client.post(&url).bearer_auth(&self.api_key);
        send_chat_request(builder, &request, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_bearer_auth_and_reply_extraction() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Paris"}}]
            })))
            .mount(&mock_server)
            .await;

        let llm = OpenAICompatibleLLM::new(
            format!("{}/v1/", mock_server.uri()),
            "sk-test".to_string(),
            "gpt-test".to_string(),
        );
        let request = CompletionRequest::new(vec![Message::user("capital?")], 16, Duration::from_secs(5));
        assert_eq!(llm.chat_completion(request).await.unwrap(), "Paris");
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&mock_server)
            .await;

        let llm = OpenAICompatibleLLM::new(mock_server.uri(), "k".to_string(), "m".to_string());
        let request = CompletionRequest::new(vec![Message::user("hi")], 16, Duration::from_secs(5));
        let err = llm.chat_completion(request).await.unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "x".repeat(150);
        assert_eq!(preview(&long).len(), 103);
        assert_eq!(preview("short"), "short");
    }
}
