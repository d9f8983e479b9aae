pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt;

use self::validation::validate_config;
use crate::fc::schema::{compile, SchemaNode, UnsupportedSchemaError};

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// How the CLI drives the parsers over its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Feed every chunk to the streaming parser and report per chunk.
    #[default]
    Stream,
    /// Collect all chunks and run the final parse once.
    Final,
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMode::Stream => write!(f, "stream"),
            ParseMode::Final => write!(f, "final"),
        }
    }
}

/// Output parser options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub mode: ParseMode,
    /// Only keep tool calls with this name in the final parse.
    #[serde(default)]
    pub key_name: Option<String>,
    /// Return only the first matching tool call.
    #[serde(default)]
    pub return_single: bool,
    /// Include tool-call ids in final parse results.
    #[serde(default)]
    pub return_id: bool,
    /// Map returned ids onto the nine-character vendor grammar.
    #[serde(default = "default_true")]
    pub normalize_ids: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            mode: ParseMode::default(),
            key_name: None,
            return_single: false,
            return_id: false,
            normalize_ids: true,
        }
    }
}

/// Feature flags and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_correction_retry: bool,
    #[serde(default = "default_retry_max")]
    pub correction_retry_max_attempts: u32,
    #[serde(default)]
    pub correction_prompt_template: Option<String>,
}

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_retry_max() -> u32 {
    3
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            enable_correction_retry: false,
            correction_retry_max_attempts: default_retry_max(),
            correction_prompt_template: None,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    /// Tool parameter schema descriptor used to validate arguments.
    #[serde(default)]
    pub schema: Option<serde_json::Value>,
}

impl AppConfig {
    /// Compile the configured schema, if one is set.
    ///
    /// Loading does not compile the schema; this is the one place it happens.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedSchemaError`] when the descriptor cannot be compiled.
    pub fn compiled_schema(&self) -> Result<Option<SchemaNode>, UnsupportedSchemaError> {
        self.schema.as_ref().map(compile).transpose()
    }
}

/// Load configuration from a YAML file and validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when reading the file fails, [`ConfigError::Yaml`]
/// when parsing fails, or [`ConfigError::Validation`] when semantic validation fails.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::Yaml`] when parsing fails or
/// [`ConfigError::Validation`] when semantic validation fails.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_yaml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_example_config() {
        // The example config should load and validate successfully
        let config = load_config("config.example.yaml");
        assert!(
            config.is_ok(),
            "Failed to load example config: {:?}",
            config.err()
        );
        let config = config.unwrap();
        assert_eq!(config.features.log_level, "INFO");
        assert_eq!(config.parser.mode, ParseMode::Stream);
        assert!(config.parser.normalize_ids);
        let schema = config.compiled_schema().unwrap().expect("schema");
        assert!(schema.field("city").is_some_and(|f| f.required));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.parser, ParserConfig::default());
        assert!(!config.features.enable_correction_retry);
        assert_eq!(config.features.correction_retry_max_attempts, 3);
        assert!(config.compiled_schema().unwrap().is_none());
    }

    #[test]
    fn test_parse_mode_serde() {
        let json = serde_json::to_string(&ParseMode::Final).unwrap();
        assert_eq!(json, "\"final\"");
        let mode: ParseMode = serde_json::from_str("\"stream\"").unwrap();
        assert_eq!(mode, ParseMode::Stream);
        assert_eq!(ParseMode::Final.to_string(), "final");
    }

    #[test]
    fn test_yaml_schema_is_read_as_json() {
        let config = parse_config(
            "parser:\n  mode: final\n  key_name: search\n  return_id: true\nschema:\n  type: object\n  properties:\n    limit:\n      type: integer\n      maximum: 50\n",
        )
        .unwrap();
        assert_eq!(config.parser.mode, ParseMode::Final);
        assert_eq!(config.parser.key_name.as_deref(), Some("search"));
        let schema = config.compiled_schema().unwrap().unwrap();
        assert_eq!(
            schema.field("limit").unwrap().schema,
            SchemaNode::Number {
                minimum: None,
                maximum: Some(50.0)
            }
        );
    }

    #[test]
    fn test_unsupported_schema_surfaces_at_compile() {
        let config = parse_config("schema:\n  type: string\n").unwrap();
        let err = config.compiled_schema().unwrap_err();
        assert_eq!(err, UnsupportedSchemaError::RootNotObject);
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            parse_config("parser: [unterminated"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
