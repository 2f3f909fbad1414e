use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::agent::input_types::{CompletionRequest, Message};
use crate::agent::output_types::Classification;
use crate::agent::stateless_llm::StatelessLLMInterface;

pub const CLASSIFIER_SYSTEM_PROMPT: &str = "You are an expert assistant. \
    If the user's query is about Premier League players or teams, especially for the 2025/2026 season, \
    reply ONLY with 'sql_required'. If not, reply ONLY with 'general'. Do not explain your answer.";

const SQL_REQUIRED_TOKEN: &str = "sql_required";

/// Decides with one completion call whether a turn needs the database.
pub struct QueryClassifier {
    llm: Arc<dyn StatelessLLMInterface>,
    max_tokens: u32,
    timeout: Duration,
}

impl QueryClassifier {
    pub fn new(llm: Arc<dyn StatelessLLMInterface>, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            llm,
            max_tokens,
            timeout,
        }
    }

    /// Never fails: an unreadable or failed reply counts as `General`.
    pub async fn classify(&self, user_text: &str) -> Classification {
        debug!("Classifying input: {}", user_text);
        let request = CompletionRequest::new(
            vec![
                Message::system(CLASSIFIER_SYSTEM_PROMPT),
                Message::user(user_text),
            ],
            self.max_tokens,
            self.timeout,
        );

        match self.llm.chat_completion(request).await {
            Ok(reply) => {
                let reply = reply.trim().to_lowercase();
                let classification = if reply.contains(SQL_REQUIRED_TOKEN) {
                    Classification::SqlRequired
                } else {
                    Classification::General
                };
                info!("Query classified as: {} (reply: {})", classification.as_str(), reply);
                classification
            }
            Err(e) => {
                warn!("Classification failed, falling back to general: {}", e);
                Classification::General
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompletionError;
    use async_trait::async_trait;

    /// Answers like a classifier model scoped to Premier League questions would
    struct KeywordLlm;

    #[async_trait]
    impl StatelessLLMInterface for KeywordLlm {
        async fn chat_completion(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            assert_eq!(request.messages[0].content, CLASSIFIER_SYSTEM_PROMPT);
            let question = request.messages[1].content.to_lowercase();
            let football = ["arsenal", "forward", "premier league", "striker"]
                .iter()
                .any(|k| question.contains(k));
            Ok(if football { "  SQL_Required\n" } else { "general" }.to_string())
        }
    }

    struct FailingLlm(CompletionError);

    #[async_trait]
    impl StatelessLLMInterface for FailingLlm {
        async fn chat_completion(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
            Err(self.0.clone())
        }
    }

    struct FixedLlm(&'static str);

    #[async_trait]
    impl StatelessLLMInterface for FixedLlm {
        async fn chat_completion(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
            Ok(self.0.to_string())
        }
    }

    fn classifier(llm: impl StatelessLLMInterface + 'static) -> QueryClassifier {
        QueryClassifier::new(Arc::new(llm), 128, Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_football_question_needs_sql() {
        let result = classifier(KeywordLlm).classify("Show me all Arsenal forwards").await;
        assert_eq!(result, Classification::SqlRequired);
    }

    #[tokio::test]
    async fn test_weather_question_is_general() {
        let result = classifier(KeywordLlm).classify("What's the weather today?").await;
        assert_eq!(result, Classification::General);
    }

    #[tokio::test]
    async fn test_every_failure_falls_back_to_general() {
        let failures = vec![
            CompletionError::Timeout,
            CompletionError::Transport("connection reset".to_string()),
            CompletionError::Http {
                status: 500,
                body: "oops".to_string(),
            },
            CompletionError::MalformedResponse("no choices".to_string()),
        ];
        for failure in failures {
            let result = classifier(FailingLlm(failure)).classify("Show me all Arsenal forwards").await;
            assert_eq!(result, Classification::General);
        }
    }

    #[tokio::test]
    async fn test_ambiguous_reply_is_general() {
        let result = classifier(FixedLlm("I am not sure")).classify("Hmm?").await;
        assert_eq!(result, Classification::General);
    }
}
