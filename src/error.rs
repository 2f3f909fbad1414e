use std::time::Duration;

use thiserror::Error;

/// Failure of a single call to the completion service.
///
/// Non-success HTTP status and transport failures are both recoverable per call;
/// callers decide how to surface them.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("completion service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("completion request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Transport(err.to_string())
        }
    }
}

/// Failure raised by a database agent invocation.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0}")]
    Invocation(String),

    #[error("agent timed out after {0:?}")]
    Timeout(Duration),

    #[error("query rejected or failed: {0}")]
    Query(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl From<rusqlite::Error> for AgentError {
    fn from(err: rusqlite::Error) -> Self {
        AgentError::Query(err.to_string())
    }
}

/// Startup-time configuration failure. The only error class allowed to abort the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {profile} LLM environment variables: {}", .variables.join(", "))]
    MissingVariables {
        profile: String,
        variables: Vec<String>,
    },

    #[error("Unsupported LLM provider for {profile} profile: {provider}")]
    UnsupportedProvider { profile: String, provider: String },

    #[error("schema introspection failed: {0}")]
    Schema(String),

    #[error("configuration file error: {0}")]
    File(String),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Schema(err.to_string())
    }
}
