use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info};

use super::agent_interface::DatabaseAgent;
use crate::agent::output_types::AgentOutcome;
use crate::agent::stateless_llm::openai_compatible_llm::preview;
use crate::chat_history::HistoryEntry;
use crate::conversations::prompt_builder::build_sql_prompt;
use crate::error::AgentError;
use crate::schema::SchemaContext;

/// Per-session adapter around a database agent.
///
/// Owns the schema snapshot taken at construction, builds the agent prompt, and turns
/// whatever the agent replies into an `AgentOutcome`. It never fails: invocation errors
/// become `AdapterError` and unparseable replies become `RawText`.
pub struct SqlAgentAdapter {
    agent: Arc<dyn DatabaseAgent>,
    schema: SchemaContext,
    timeout: Duration,
}

impl SqlAgentAdapter {
    pub fn new(agent: Arc<dyn DatabaseAgent>, schema: SchemaContext, timeout: Duration) -> Self {
        info!(
            "SqlAgentAdapter initialized for table {} ({} valid values)",
            schema.table(),
            schema.valid_values().len()
        );
        Self {
            agent,
            schema,
            timeout,
        }
    }

    /// Build the prompt for `user_query` with the given history and execute it.
    pub async fn run(&self, user_query: &str, history: &[&HistoryEntry]) -> AgentOutcome {
        let prompt = build_sql_prompt(user_query, &self.schema, history);
        self.execute(&prompt).await
    }

    pub async fn execute(&self, prompt: &str) -> AgentOutcome {
        debug!("Running SQL agent (prompt: {} chars)", prompt.len());
        match tokio::time::timeout(self.timeout, self.agent.invoke(prompt)).await {
            Ok(Ok(raw)) => {
                let outcome = normalize_agent_reply(raw);
                debug!("SQL agent result received: {:?}", outcome_preview(&outcome));
                outcome
            }
            Ok(Err(e)) => {
                error!("SQL agent invocation failed: {}", e);
                AgentOutcome::AdapterError {
                    message: format!("SQL Agent Error: {}", e),
                }
            }
            Err(_) => {
                let e = AgentError::Timeout(self.timeout);
                error!("SQL agent invocation failed: {}", e);
                AgentOutcome::AdapterError {
                    message: format!("SQL Agent Error: {}", e),
                }
            }
        }
    }
}

/// Unwrap an `output` container and parse text replies as JSON, keeping the text when it
/// does not parse.
pub fn normalize_agent_reply(raw: Value) -> AgentOutcome {
    let unwrapped = match raw {
        Value::Object(mut obj) if obj.contains_key("output") => obj.remove("output").unwrap_or(Value::Null),
        other => other,
    };

    match unwrapped {
        Value::String(text) => match parse_json_text(&text) {
            Some(parsed) => AgentOutcome::ParsedStructured(parsed),
            None => AgentOutcome::RawText(text),
        },
        other => AgentOutcome::ParsedStructured(other),
    }
}

fn parse_json_text(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    // Agents occasionally fence their JSON despite being told not to
    let inner = trimmed.strip_prefix("```")?;
    let inner = match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    serde_json::from_str(inner.trim()).ok()
}

fn outcome_preview(outcome: &AgentOutcome) -> String {
    match outcome {
        AgentOutcome::ParsedStructured(value) => preview(&value.to_string()),
        AgentOutcome::RawText(text) => preview(text),
        AgentOutcome::AdapterError { message } => preview(message),
    }
}
