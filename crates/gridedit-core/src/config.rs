use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

pub const ENV_HISTORY_LIMIT: &str = "GRIDEDIT_HISTORY_LIMIT";
pub const ENV_HEADER_ROW_INDEX: &str = "GRIDEDIT_HEADER_ROW_INDEX";
pub const ENV_SHOW_ONLY_ERRORS: &str = "GRIDEDIT_SHOW_ONLY_ERRORS";

/// Errors loading an [`EditorConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidVar { key: &'static str, value: String },

    #[error("invalid config JSON: {0}")]
    InvalidJson(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::InvalidVar { .. } => "INVALID_CONFIG_VAR",
            ConfigError::InvalidJson(_) => "INVALID_CONFIG_JSON",
        }
    }
}

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo entries kept before the oldest is evicted
    pub history_limit: usize,
    /// Zero-based file row holding the headers
    pub header_row_index: usize,
    /// Start with the row filter on
    pub show_only_errors: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            header_row_index: 0,
            show_only_errors: false,
        }
    }
}

impl EditorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source; unset keys keep
    /// their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_HISTORY_LIMIT) {
            config.history_limit = parse_var(ENV_HISTORY_LIMIT, &value)?;
        }
        if let Some(value) = lookup(ENV_HEADER_ROW_INDEX) {
            config.header_row_index = parse_var(ENV_HEADER_ROW_INDEX, &value)?;
        }
        if let Some(value) = lookup(ENV_SHOW_ONLY_ERRORS) {
            config.show_only_errors = parse_flag(ENV_SHOW_ONLY_ERRORS, &value)?;
        }

        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidJson(e.to_string()))
    }
}

fn parse_var(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        key,
        value: value.to_string(),
    })
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EditorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_from_lookup() {
        let config = EditorConfig::from_lookup(lookup(&[
            (ENV_HISTORY_LIMIT, "10"),
            (ENV_HEADER_ROW_INDEX, " 3 "),
            (ENV_SHOW_ONLY_ERRORS, "TRUE"),
        ]))
        .unwrap();

        assert_eq!(config.history_limit, 10);
        assert_eq!(config.header_row_index, 3);
        assert!(config.show_only_errors);
    }

    #[test]
    fn test_invalid_var() {
        let err = EditorConfig::from_lookup(lookup(&[(ENV_HISTORY_LIMIT, "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidVar {
                key: ENV_HISTORY_LIMIT,
                value: "lots".to_string()
            }
        );
        assert_eq!(err.code(), "INVALID_CONFIG_VAR");

        assert!(EditorConfig::from_lookup(lookup(&[(ENV_SHOW_ONLY_ERRORS, "maybe")])).is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = EditorConfig::from_json(r#"{"headerRowIndex":2}"#).unwrap();
        assert_eq!(config.header_row_index, 2);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);

        assert!(matches!(
            EditorConfig::from_json("{"),
            Err(ConfigError::InvalidJson(_))
        ));
    }
}
