use std::sync::Arc;
use tracing::info;

use crate::agent::agents::{DatabaseAgent, SqlAgentAdapter, SqlToolAgent};
use crate::agent::stateless_llm::StatelessLLMInterface;
use crate::config::{RoutingConfig, SystemConfig};
use crate::error::ConfigError;
use crate::schema::SchemaContext;

/// Factory for the database agent and its per-session adapters
pub struct AgentFactory;

impl AgentFactory {
    /// The shared tool-using agent. It holds no per-session state.
    pub fn create_database_agent(
        sql_llm: Arc<dyn StatelessLLMInterface>,
        system: &SystemConfig,
        routing: &RoutingConfig,
    ) -> Arc<dyn DatabaseAgent> {
        Arc::new(SqlToolAgent::new(
            sql_llm,
            &system.database_path,
            routing.agent_max_tokens,
            routing.agent_timeout(),
        ))
    }

    /// Build a fresh adapter, taking a new schema snapshot. Blocks on SQLite; call from
    /// `spawn_blocking` inside async code.
    pub fn create_sql_adapter(
        agent: Arc<dyn DatabaseAgent>,
        system: &SystemConfig,
        routing: &RoutingConfig,
    ) -> Result<SqlAgentAdapter, ConfigError> {
        info!("Initializing SQL agent adapter for {}", system.database_path);
        let schema = SchemaContext::load(&system.database_path, &system.table_name, &system.group_column)?;
        Ok(SqlAgentAdapter::new(agent, schema, routing.agent_timeout()))
    }
}
