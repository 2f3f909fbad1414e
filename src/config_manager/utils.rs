use std::fs;
use std::path::Path;

use anyhow::Result;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use crate::error::ConfigError;

/// Read a configuration file and substitute `${VAR_NAME}` placeholders from the environment.
/// Unknown variables are left in place.
pub fn read_config_text(config_path: &str) -> Result<String> {
    if !Path::new(config_path).exists() {
        return Err(ConfigError::File(format!("not found: {}", config_path)).into());
    }

    let content = load_text_file(config_path)
        .map_err(|e| ConfigError::File(format!("cannot read {}: {}", config_path, e)))?;
    if content.trim().is_empty() {
        return Err(ConfigError::File(format!("empty: {}", config_path)).into());
    }

    Ok(substitute_env_vars(&content, |name| std::env::var(name).ok()))
}

pub fn substitute_env_vars<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("static regex");
    pattern
        .replace_all(content, |caps: &Captures| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Parse configuration text as JSON(-LD) or YAML depending on the file extension.
/// The JSON-LD `@context` key is dropped.
pub fn parse_config_value(config_path: &str, content: &str) -> Result<Value> {
    let lower = config_path.to_lowercase();
    let mut value: Value = if lower.ends_with(".jsonld") || lower.ends_with(".json") {
        serde_json::from_str(content)?
    } else {
        serde_yaml::from_str(content)?
    };

    if let Value::Object(ref mut obj) = value {
        obj.remove("@context");
    }
    debug!("Parsed configuration from {}", config_path);
    Ok(value)
}

/// Load a text file, tolerating a UTF-8 or UTF-16 byte-order mark.
pub fn load_text_file(file_path: &str) -> Result<String> {
    let bytes = fs::read(file_path)?;
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        debug!("{} contained invalid UTF-8; replaced undecodable bytes", file_path);
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_substitutes_known_vars_only() {
        let text = "path: ${DB}\nkey: ${UNSET}";
        let out = substitute_env_vars(text, |name| (name == "DB").then(|| "league.db".to_string()));
        assert_eq!(out, "path: league.db\nkey: ${UNSET}");
    }

    #[test]
    fn test_jsonld_context_is_dropped() {
        let value = parse_config_value(
            "conf.jsonld",
            r#"{"@context": {"@vocab": "x"}, "system_config": {"port": 9000}}"#,
        )
        .unwrap();
        assert!(value.get("@context").is_none());
        assert_eq!(value.pointer("/system_config/port"), Some(&serde_json::json!(9000)));
    }

    #[test]
    fn test_missing_and_empty_files_are_file_errors() {
        let missing = read_config_text("/nonexistent/conf.yaml").unwrap_err();
        assert!(matches!(missing.downcast_ref::<ConfigError>(), Some(ConfigError::File(_))));

        let empty = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = read_config_text(empty.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::File(m)) if m.starts_with("empty")));
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(&[0xEF, 0xBB, 0xBF]).unwrap();
        file.write_all(b"system_config:\n  port: 9000\n").unwrap();

        let text = load_text_file(file.path().to_str().unwrap()).unwrap();
        assert!(text.starts_with("system_config"));
    }
}
