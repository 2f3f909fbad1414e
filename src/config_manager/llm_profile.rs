use std::fmt;

use crate::error::ConfigError;

/// Which completion-service profile a component talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    /// General-purpose chat, classification and summarization
    Main,
    /// The database agent's model
    Sql,
}

impl ProfileKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProfileKind::Main => "main",
            ProfileKind::Sql => "sql",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            ProfileKind::Main => "MAIN",
            ProfileKind::Sql => "SQL",
        }
    }

    fn var(&self, field: &str) -> String {
        format!("AZURE_OPENAI_{}_{}", self.suffix(), field)
    }

    fn model_var(&self) -> String {
        format!("OPENAI_MODEL_{}", self.suffix())
    }

    fn provider_var(&self) -> String {
        format!("LLM_PROVIDER_{}", self.suffix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    AzureOpenAI,
    OpenAICompatible,
}

impl LlmProvider {
    fn parse(profile: ProfileKind, raw: Option<String>) -> Result<Self, ConfigError> {
        match raw.as_deref() {
            None | Some("azure_openai") => Ok(LlmProvider::AzureOpenAI),
            Some("openai_compatible") => Ok(LlmProvider::OpenAICompatible),
            Some(other) => Err(ConfigError::UnsupportedProvider {
                profile: profile.name().to_string(),
                provider: other.to_string(),
            }),
        }
    }
}

/// Validated endpoint and credentials for one completion-service profile
#[derive(Clone)]
pub struct LlmProfileConfig {
    pub kind: ProfileKind,
    pub provider: LlmProvider,
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub model: String,
}

impl fmt::Debug for LlmProfileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmProfileConfig")
            .field("kind", &self.kind)
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .finish()
    }
}

impl LlmProfileConfig {
    /// Read a profile from the process environment.
    pub fn from_env(kind: ProfileKind) -> Result<Self, ConfigError> {
        Self::from_lookup(kind, |name| std::env::var(name).ok())
    }

    /// Read a profile through `lookup`, reporting every missing variable at once.
    /// Empty values count as missing.
    pub fn from_lookup<F>(kind: ProfileKind, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let provider = LlmProvider::parse(kind, get(&kind.provider_var()))?;

        let mut required = vec![kind.var("ENDPOINT"), kind.var("KEY")];
        if provider == LlmProvider::AzureOpenAI {
            required.push(kind.var("DEPLOYMENT"));
            required.push(kind.var("API_VERSION"));
        }
        required.push(kind.model_var());

        let missing: Vec<String> = required
            .iter()
            .filter(|name| get(name).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables {
                profile: kind.name().to_string(),
                variables: missing,
            });
        }

        Ok(Self {
            kind,
            provider,
            endpoint: get(&kind.var("ENDPOINT")).unwrap_or_default(),
            api_key: get(&kind.var("KEY")).unwrap_or_default(),
            deployment: get(&kind.var("DEPLOYMENT")).unwrap_or_default(),
            api_version: get(&kind.var("API_VERSION")).unwrap_or_default(),
            model: get(&kind.model_var()).unwrap_or_default(),
        })
    }
}
