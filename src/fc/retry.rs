use serde_json::Value;

use crate::config::FeaturesConfig;
use crate::error::ToolCheckError;
use crate::fc::output::ToolsOutputParser;

const DEFAULT_CORRECTION_TEMPLATE: &str = "\
The arguments of your last tool call were rejected.

Arguments you sent:
```
{original_response}
```

Why they were rejected:
{error_details}

Call the tool again with arguments that are one JSON object, include every
required property, and respect each property's type, range and pattern.
Reply with the corrected tool call only.";

/// Correction-round bookkeeping for one tool call.
///
/// Asking the model is up to the caller; see [`correct_arguments`] for the
/// loop that ties this to a [`ToolsOutputParser`].
#[derive(Debug, Clone)]
pub struct RetryContext {
    pub max_attempts: u32,
    pub current_attempt: u32,
    pub enable_retry: bool,
    pub template: Option<String>,
}

impl RetryContext {
    #[must_use]
    pub fn new(features: &FeaturesConfig) -> Self {
        Self {
            max_attempts: features.correction_retry_max_attempts,
            current_attempt: 0,
            enable_retry: features.enable_correction_retry,
            template: features.correction_prompt_template.clone(),
        }
    }

    /// Whether one more correction round is allowed after a failure that is
    /// `recoverable` by the model.
    #[must_use]
    pub fn should_continue(&self, recoverable: bool) -> bool {
        recoverable && self.enable_retry && self.current_attempt < self.max_attempts
    }

    pub fn increment(&mut self) {
        self.current_attempt = self.current_attempt.saturating_add(1);
    }

    /// Correction prompt for `err`; `None` for errors the model cannot fix.
    #[must_use]
    pub fn prompt_for(&self, err: &ToolCheckError) -> Option<String> {
        let original = err.offending_text()?;
        let template = self.template.as_deref().unwrap_or(DEFAULT_CORRECTION_TEMPLATE);
        Some(
            template
                .replace("{error_details}", &err.details())
                .replace("{original_response}", original),
        )
    }
}

/// Validate `arguments`, asking `ask_model` for corrected arguments while
/// correction rounds remain.
///
/// `ask_model` receives the correction prompt and returns the model's new
/// arguments (a JSON value or a JSON string).
///
/// # Errors
///
/// Returns the last decoding or validation error once rounds run out, or
/// immediately when correction is disabled.
pub fn correct_arguments<F>(
    parser: &ToolsOutputParser,
    features: &FeaturesConfig,
    arguments: Value,
    mut ask_model: F,
) -> Result<Value, ToolCheckError>
where
    F: FnMut(&str) -> Value,
{
    let mut ctx = RetryContext::new(features);
    let mut current = arguments;
    loop {
        let err = match parser.validate_result(&current) {
            Ok(valid) => return Ok(valid),
            Err(err) => err,
        };
        if !ctx.should_continue(err.is_recoverable()) {
            return Err(err);
        }
        let Some(prompt) = ctx.prompt_for(&err) else {
            return Err(err);
        };
        ctx.increment();
        tracing::info!(
            attempt = ctx.current_attempt,
            max_attempts = ctx.max_attempts,
            error = %err.details(),
            "requesting corrected tool-call arguments"
        );
        current = ask_model(&prompt);
    }
}
