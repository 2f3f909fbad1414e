pub mod agent;
pub mod chat_history;
pub mod config;
pub mod config_manager;
pub mod conversations;
pub mod error;
pub mod routes;
pub mod schema;
pub mod state;
