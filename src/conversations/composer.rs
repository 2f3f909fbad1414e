use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::table::render_table;
use crate::agent::input_types::{CompletionRequest, Message};
use crate::agent::output_types::{AgentOutcome, Classification, ResponseValue, StructuredValue};
use crate::agent::stateless_llm::openai_compatible_llm::preview;
use crate::agent::stateless_llm::StatelessLLMInterface;
use crate::chat_history::HistoryEntry;
use crate::error::CompletionError;

/// Key used when the agent answers with a bare array instead of an object
pub const BARE_LIST_KEY: &str = "results";

/// Turns a classification and agent outcome into the value shown to the user.
///
/// Reads history but never writes it; the orchestrator appends the result.
pub struct ResponseComposer {
    llm: Arc<dyn StatelessLLMInterface>,
    max_tokens: u32,
    timeout: Duration,
    row_threshold: usize,
}

impl ResponseComposer {
    pub fn new(
        llm: Arc<dyn StatelessLLMInterface>,
        max_tokens: u32,
        timeout: Duration,
        row_threshold: usize,
    ) -> Self {
        Self {
            llm,
            max_tokens,
            timeout,
            row_threshold,
        }
    }

    pub async fn compose(
        &self,
        user_query: &str,
        classification: Classification,
        agent_outcome: Option<AgentOutcome>,
        history: &[&HistoryEntry],
    ) -> ResponseValue {
        match (classification, agent_outcome) {
            (Classification::SqlRequired, Some(outcome)) => {
                self.compose_sql(user_query, outcome, history).await
            }
            (Classification::SqlRequired, None) => {
                warn!("SQL route without an agent outcome; answering as general");
                self.general(user_query, history).await
            }
            (Classification::General, _) => self.general(user_query, history).await,
        }
    }

    /// Answer directly with the completion service, using history as dialogue context.
    pub async fn general(&self, user_query: &str, history: &[&HistoryEntry]) -> ResponseValue {
        info!("Processing general query");
        match self.complete(user_query, None, history).await {
            Ok(text) => ResponseValue::text(text),
            Err(e) => {
                warn!("General completion failed: {}", e);
                ResponseValue::error(format!("Completion error: {}", e))
            }
        }
    }

    async fn compose_sql(
        &self,
        user_query: &str,
        outcome: AgentOutcome,
        history: &[&HistoryEntry],
    ) -> ResponseValue {
        match outcome {
            AgentOutcome::AdapterError { message } => ResponseValue::error(message),
            AgentOutcome::RawText(text) => ResponseValue::text(text),
            AgentOutcome::ParsedStructured(value) => match value {
                Value::Object(data) => self.maybe_summarize(user_query, data, history).await,
                Value::Array(items) => {
                    let mut data = Map::new();
                    data.insert(BARE_LIST_KEY.to_string(), Value::Array(items));
                    self.maybe_summarize(user_query, data, history).await
                }
                Value::String(text) => ResponseValue::text(text),
                other => ResponseValue::text(other.to_string()),
            },
        }
    }

    /// Summarize when some list holds more rows than the threshold; otherwise, or when the
    /// summary call fails, return the data untouched.
    async fn maybe_summarize(
        &self,
        user_query: &str,
        data: Map<String, Value>,
        history: &[&HistoryEntry],
    ) -> ResponseValue {
        let Some((key, rows)) = self.first_large_list(&data) else {
            debug!("No list above {} rows; returning data as-is", self.row_threshold);
            return ResponseValue::Structured(StructuredValue::new(data));
        };

        info!("Summarizing {} rows from '{}'", rows.len(), key);
        let context = format!(
            "User question: {}\n\
             Here is the data returned from the database as a table:\n{}\n\
             If the data is self-explanatory, you may simply say so. \
             Otherwise, provide a brief summary or insight for the user.",
            user_query,
            render_table(rows)
        );

        match self.complete(user_query, Some(context), history).await {
            Ok(summary) if !summary.trim().is_empty() => {
                ResponseValue::Structured(StructuredValue::with_summary(data, summary))
            }
            Ok(_) => {
                warn!("Summarization returned empty text; returning data as-is");
                ResponseValue::Structured(StructuredValue::new(data))
            }
            Err(e) => {
                warn!("Summarization failed, returning data as-is: {}", e);
                ResponseValue::Structured(StructuredValue::new(data))
            }
        }
    }

    fn first_large_list<'a>(&self, data: &'a Map<String, Value>) -> Option<(&'a str, &'a [Value])> {
        data.iter().find_map(|(key, value)| match value {
            Value::Array(items) if items.len() > self.row_threshold => Some((key.as_str(), items.as_slice())),
            _ => None,
        })
    }

    async fn complete(
        &self,
        user_query: &str,
        context: Option<String>,
        history: &[&HistoryEntry],
    ) -> Result<String, CompletionError> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 2);
        for entry in history {
            messages.push(Message::user(entry.user_query.clone()));
            messages.push(Message::assistant(entry.response.to_prompt_text()));
        }
        if let Some(context) = context {
            messages.push(Message::system(context));
        }
        messages.push(Message::user(user_query));

        debug!("Sending {} messages to LLM", messages.len());
        let request = CompletionRequest::new(messages, self.max_tokens, self.timeout);
        let response = self.llm.chat_completion(request).await?;
        debug!("Response received: {}", preview(&response));
        Ok(response)
    }
}
