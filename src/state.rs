use std::sync::Arc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::agent::agent_factory::AgentFactory;
use crate::agent::agents::DatabaseAgent;
use crate::agent::output_types::ResponseValue;
use crate::agent::stateless_llm::StatelessLLMInterface;
use crate::chat_history::{HistoryEntry, HistoryWindow};
use crate::config::Config;
use crate::conversations::{Orchestrator, QueryClassifier, ResponseComposer};
use crate::error::ConfigError;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub main_llm: Arc<dyn StatelessLLMInterface>,
    pub sql_llm: Arc<dyn StatelessLLMInterface>,
    pub database_agent: Arc<dyn DatabaseAgent>,
    pub sessions: Arc<DashMap<String, Arc<Mutex<Session>>>>,
}

/// Everything one end user owns. Never shared between sessions.
pub struct Session {
    pub orchestrator: Orchestrator,
    /// Longer display log for the presentation layer
    pub transcript: HistoryWindow,
}

impl Session {
    pub async fn handle_turn(&mut self, query: &str) -> ResponseValue {
        let response = self.orchestrator.process(query).await;
        self.transcript.append(HistoryEntry::new(query, response.clone()));
        response
    }
}

impl AppState {
    pub fn new(
        config: Config,
        main_llm: Arc<dyn StatelessLLMInterface>,
        sql_llm: Arc<dyn StatelessLLMInterface>,
        database_agent: Arc<dyn DatabaseAgent>,
    ) -> Self {
        Self {
            config,
            main_llm,
            sql_llm,
            database_agent,
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn generate_session_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Build a session with its own history and agent adapter (fresh schema snapshot).
    pub async fn create_session(&self) -> Result<String, ConfigError> {
        let session = self.build_session().await?;
        let session_id = self.generate_session_id();
        self.sessions
            .insert(session_id.clone(), Arc::new(Mutex::new(session)));
        info!("Created session {} ({} active)", session_id, self.sessions.len());
        Ok(session_id)
    }

    pub fn get_session(&self, session_id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(session_id).map(|e| e.value().clone())
    }

    pub fn remove_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            info!("Removed session {}", session_id);
        }
        removed
    }

    async fn build_session(&self) -> Result<Session, ConfigError> {
        let agent = self.database_agent.clone();
        let system = self.config.system_config.clone();
        let routing = self.config.routing_config.clone();
        let adapter = tokio::task::spawn_blocking(move || {
            AgentFactory::create_sql_adapter(agent, &system, &routing)
        })
        .await
        .map_err(|e| ConfigError::Schema(format!("schema task failed: {}", e)))??;

        let routing = &self.config.routing_config;
        let orchestrator = Orchestrator::new(
            QueryClassifier::new(
                self.main_llm.clone(),
                routing.classify_max_tokens,
                routing.classify_timeout(),
            ),
            ResponseComposer::new(
                self.main_llm.clone(),
                routing.general_max_tokens,
                routing.general_timeout(),
                routing.summary_row_threshold,
            ),
            adapter,
            routing.history_capacity,
            routing.context_turns,
        );

        Ok(Session {
            orchestrator,
            transcript: HistoryWindow::new(routing.transcript_capacity),
        })
    }
}
