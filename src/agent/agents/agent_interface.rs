use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;

/// Boundary to an external tool-using agent that can plan and run queries against the table.
///
/// Implementations reply with either a container holding an `output` field, a bare
/// string, or a structured value. Anything that goes wrong is an `AgentError`.
#[async_trait]
pub trait DatabaseAgent: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<Value, AgentError>;
}
