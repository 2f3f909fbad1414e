use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pitchside_backend::agent::{AgentFactory, StatelessLLMFactory};
use pitchside_backend::config::{Config, LlmProfiles};
use pitchside_backend::routes;
use pitchside_backend::schema::SchemaContext;
use pitchside_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pitchside_backend=debug,tower_http=debug")),
        )
        .init();

    let config = Config::discover()?;
    let system_config = &config.system_config;

    // Missing credentials or a missing table are the only failures allowed to stop startup
    let profiles = LlmProfiles::from_env()?;
    let schema = SchemaContext::load(
        &system_config.database_path,
        &system_config.table_name,
        &system_config.group_column,
    )?;
    info!(
        "Database {} ready: table {} with {} teams",
        system_config.database_path,
        schema.table(),
        schema.valid_values().len()
    );

    let main_llm = StatelessLLMFactory::create_llm(&profiles.main);
    let sql_llm = StatelessLLMFactory::create_llm(&profiles.sql);
    let database_agent =
        AgentFactory::create_database_agent(sql_llm.clone(), system_config, &config.routing_config);

    let app_state = AppState::new(config.clone(), main_llm, sql_llm, database_agent);

    // Build application
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.system_config.host, config.system_config.port).parse()?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
