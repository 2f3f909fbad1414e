use async_trait::async_trait;

use crate::agent::input_types::{CompletionRequest, Message};
use crate::error::CompletionError;
use std::time::Duration;

/// Interface for a stateless language model
/// Stateless means the client keeps no conversation; every call carries its full context
#[async_trait]
pub trait StatelessLLMInterface: Send + Sync {
    /// Send the ordered messages and return the generated text
    async fn chat_completion(&self, request: CompletionRequest) -> Result<String, CompletionError>;

    /// Cheap liveness check against the completion endpoint
    async fn probe(&self) -> Result<String, CompletionError> {
        let request = CompletionRequest::new(
            vec![Message::user("What is the capital of France?")],
            32,
            Duration::from_secs(10),
        );
        self.chat_completion(request).await
    }
}
