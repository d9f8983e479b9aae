use crate::config::ConfigError;
use crate::fc::schema::UnsupportedSchemaError;
use crate::fc::validator::ValidationError;

/// Crate-wide error type returned by the output parser and the CLI.
#[derive(Debug, thiserror::Error)]
pub enum ToolCheckError {
    #[error("Unsupported schema: {0}")]
    UnsupportedSchema(#[from] UnsupportedSchemaError),
    /// Tool-call arguments arrived as text that is not valid JSON.
    #[error("Failed to parse. Text: {text:?}. Error: {message}")]
    InvalidJson { text: String, message: String },
    /// Decoded arguments do not satisfy the tool's parameter schema.
    #[error("Failed to parse. Text: {text:?}. Error: {source}")]
    SchemaViolation {
        text: String,
        #[source]
        source: ValidationError,
    },
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Broad error category for deciding how a caller should react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Setup is broken; abort and do not retry.
    Fatal,
    /// The model produced bad output; surface it or ask the model to correct it.
    ModelOutput,
}

impl ToolCheckError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            ToolCheckError::UnsupportedSchema(_) | ToolCheckError::Config(_) => {
                ErrorCategory::Fatal
            }
            ToolCheckError::InvalidJson { .. } | ToolCheckError::SchemaViolation { .. } => {
                ErrorCategory::ModelOutput
            }
        }
    }

    /// Whether feeding the error back to the model may fix it.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.category() == ErrorCategory::ModelOutput
    }

    /// The raw text that failed to parse, for model-output errors.
    #[must_use]
    pub fn offending_text(&self) -> Option<&str> {
        match self {
            ToolCheckError::InvalidJson { text, .. }
            | ToolCheckError::SchemaViolation { text, .. } => Some(text),
            ToolCheckError::UnsupportedSchema(_) | ToolCheckError::Config(_) => None,
        }
    }

    /// Short description of what went wrong, without the offending text.
    #[must_use]
    pub fn details(&self) -> String {
        match self {
            ToolCheckError::InvalidJson { message, .. } => message.clone(),
            ToolCheckError::SchemaViolation { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}
