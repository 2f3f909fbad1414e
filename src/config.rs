use serde::{Deserialize, Serialize};
use std::time::Duration;
use anyhow::Result;
use tracing::{debug, info};

use crate::config_manager::utils::{parse_config_value, read_config_text};
use crate::config_manager::{LlmProfileConfig, ProfileKind};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub routing_config: RoutingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// Column whose distinct values are the canonical team/club names
    #[serde(default = "default_group_column")]
    pub group_column: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

fn default_database_path() -> String {
    "premier_league_players_master.db".to_string()
}

fn default_table_name() -> String {
    "all_players_with_details".to_string()
}

fn default_group_column() -> String {
    "Team Name".to_string()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            table_name: default_table_name(),
            group_column: default_group_column(),
        }
    }
}

/// Budgets, timeouts and window sizes for the routing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub history_capacity: usize,
    pub transcript_capacity: usize,
    pub context_turns: usize,
    pub summary_row_threshold: usize,
    pub classify_max_tokens: u32,
    pub classify_timeout_secs: u64,
    pub general_max_tokens: u32,
    pub general_timeout_secs: u64,
    pub agent_max_tokens: u32,
    pub agent_timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            transcript_capacity: 50,
            context_turns: 3,
            summary_row_threshold: 2,
            classify_max_tokens: 128,
            classify_timeout_secs: 10,
            general_max_tokens: 512,
            general_timeout_secs: 20,
            agent_max_tokens: 10420,
            agent_timeout_secs: 120,
        }
    }
}

impl RoutingConfig {
    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }

    pub fn general_timeout(&self) -> Duration {
        Duration::from_secs(self.general_timeout_secs)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = read_config_text(path)?;
        let value = parse_config_value(path, &content)?;
        let config: Config = serde_json::from_value(value)?;
        Ok(config)
    }

    /// Load the first config file that parses, falling back to defaults when none exists.
    /// `PITCHSIDE_DB_PATH` overrides the database path either way.
    pub fn discover() -> Result<Self> {
        let candidates: Vec<String> = vec![
            std::env::var("CONFIG_PATH").ok(),
            Some("conf.jsonld".to_string()),
            Some("conf.yaml".to_string()),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut config = None;
        for path in &candidates {
            if !std::path::Path::new(path).exists() {
                continue;
            }
            // A file that exists but fails to parse is a startup error
            config = Some(Self::load(path)?);
            info!("Loaded configuration from: {}", path);
            break;
        }

        let mut config = config.unwrap_or_else(|| {
            debug!("No config file found in {:?}; using defaults", candidates);
            Config::default()
        });

        if let Ok(db_path) = std::env::var("PITCHSIDE_DB_PATH") {
            if !db_path.trim().is_empty() {
                config.system_config.database_path = db_path;
            }
        }

        Ok(config)
    }
}

/// Both completion-service profiles, validated together at startup
#[derive(Debug, Clone)]
pub struct LlmProfiles {
    pub main: LlmProfileConfig,
    pub sql: LlmProfileConfig,
}

impl LlmProfiles {
    pub fn from_env() -> Result<Self> {
        let main = LlmProfileConfig::from_env(ProfileKind::Main);
        let sql = LlmProfileConfig::from_env(ProfileKind::Sql);
        match (main, sql) {
            (Ok(main), Ok(sql)) => Ok(Self { main, sql }),
            (Err(a), Err(b)) => Err(anyhow::anyhow!("{}; {}", a, b)),
            (Err(e), _) | (_, Err(e)) => Err(e.into()),
        }
    }
}
