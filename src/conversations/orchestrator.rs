use tracing::info;

use super::classifier::QueryClassifier;
use super::composer::ResponseComposer;
use crate::agent::agents::SqlAgentAdapter;
use crate::agent::output_types::{Classification, ResponseValue};
use crate::chat_history::{HistoryEntry, HistoryWindow};

/// One user's conversation: routes each turn and remembers it.
///
/// The orchestrator is the only writer of its history window. Turns are processed
/// one at a time through `&mut self`.
pub struct Orchestrator {
    classifier: QueryClassifier,
    composer: ResponseComposer,
    sql_agent: SqlAgentAdapter,
    history: HistoryWindow,
    context_turns: usize,
}

impl Orchestrator {
    pub fn new(
        classifier: QueryClassifier,
        composer: ResponseComposer,
        sql_agent: SqlAgentAdapter,
        history_capacity: usize,
        context_turns: usize,
    ) -> Self {
        Self {
            classifier,
            composer,
            sql_agent,
            history: HistoryWindow::new(history_capacity),
            context_turns,
        }
    }

    /// Classify, route, compose and record one turn. Every branch ends in the history.
    pub async fn process(&mut self, user_input: &str) -> ResponseValue {
        info!("Starting to process query: {}", user_input);
        let classification = self.classifier.classify(user_input).await;

        let response = {
            let context = self.history.recent(self.context_turns);
            info!("Using {} recent conversation turns", context.len());

            let outcome = match classification {
                Classification::SqlRequired => Some(self.sql_agent.run(user_input, &context).await),
                Classification::General => None,
            };
            self.composer
                .compose(user_input, classification, outcome, &context)
                .await
        };

        self.history.append(HistoryEntry::new(user_input, response.clone()));
        info!("Response added to conversation history ({} entries)", self.history.len());
        response
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }
}
