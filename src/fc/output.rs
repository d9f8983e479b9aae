use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::{AppConfig, ParserConfig};
use crate::error::ToolCheckError;
use crate::fc::schema::SchemaNode;
use crate::fc::tool_id::normalize;
use crate::fc::validator::validate;
use crate::protocol::canonical::{GenerationChunk, ToolCallEntry};

/// A tool call returned by the final parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedToolCall {
    #[serde(rename = "type")]
    pub name: String,
    /// Present only when ids were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub args: Value,
}

/// Tool-call output parser bound to one tool parameter schema.
///
/// The schema is compiled once and shared. The parser holds no per-stream
/// state; each stream gets its own `StreamingToolCallParser`.
#[derive(Debug, Clone)]
pub struct ToolsOutputParser {
    options: ParserConfig,
    schema: Option<Arc<SchemaNode>>,
}

impl ToolsOutputParser {
    #[must_use]
    pub fn new(options: ParserConfig, schema: Option<Arc<SchemaNode>>) -> Self {
        Self { options, schema }
    }

    /// Build a parser from the `parser` and `schema` config sections.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCheckError::UnsupportedSchema`] when the configured
    /// schema cannot be compiled.
    pub fn from_config(config: &AppConfig) -> Result<Self, ToolCheckError> {
        let schema = config.compiled_schema()?;
        Ok(Self::new(config.parser.clone(), schema.map(Arc::new)))
    }

    #[must_use]
    pub fn options(&self) -> &ParserConfig {
        &self.options
    }

    #[must_use]
    pub fn schema(&self) -> Option<&SchemaNode> {
        self.schema.as_deref()
    }

    /// Parse every tool call of a completed generation set.
    ///
    /// Calls are collected across all chunks in order, filtered by
    /// `key_name` when set, and cut to the first one when `return_single` is
    /// set. Each call's arguments go through [`Self::validate_result`].
    ///
    /// # Errors
    ///
    /// Returns [`ToolCheckError::InvalidJson`] or
    /// [`ToolCheckError::SchemaViolation`] for the first call whose arguments
    /// fail decoding or validation.
    pub fn parse_result(
        &self,
        chunks: &[GenerationChunk],
    ) -> Result<Vec<ParsedToolCall>, ToolCheckError> {
        let key_name = self.options.key_name.as_deref();
        let matching = chunks
            .iter()
            .flat_map(GenerationChunk::tool_calls)
            .filter(|entry| key_name.is_none_or(|key| entry.name == key));

        let limit = if self.options.return_single {
            1
        } else {
            usize::MAX
        };

        matching
            .take(limit)
            .map(|entry| self.parse_entry(entry))
            .collect()
    }

    fn parse_entry(&self, entry: &ToolCallEntry) -> Result<ParsedToolCall, ToolCheckError> {
        let args = self.validate_result(&entry.arguments)?;
        let id = if self.options.return_id {
            entry.id.as_deref().map(|raw| {
                if self.options.normalize_ids {
                    normalize(raw).into_string()
                } else {
                    raw.to_string()
                }
            })
        } else {
            None
        };
        Ok(ParsedToolCall {
            name: entry.name.clone(),
            id,
            args,
        })
    }

    /// Decode and validate one arguments value.
    ///
    /// A JSON string is decoded first, so wire payloads that carry arguments
    /// as text are accepted. Without a schema the decoded value is returned
    /// as is.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCheckError::InvalidJson`] when a string is not valid
    /// JSON, or [`ToolCheckError::SchemaViolation`] when the value fails the
    /// schema.
    pub fn validate_result(&self, value: &Value) -> Result<Value, ToolCheckError> {
        let decoded = match value {
            Value::String(text) => {
                serde_json::from_str(text).map_err(|e| ToolCheckError::InvalidJson {
                    text: text.clone(),
                    message: e.to_string(),
                })?
            }
            other => other.clone(),
        };

        let Some(schema) = self.schema.as_deref() else {
            return Ok(decoded);
        };

        if let Err(source) = validate(schema, &decoded) {
            tracing::warn!(error = %source, "tool-call arguments failed schema validation");
            return Err(ToolCheckError::SchemaViolation {
                text: decoded.to_string(),
                source,
            });
        }
        Ok(decoded)
    }
}
