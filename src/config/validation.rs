use super::{AppConfig, ConfigError};

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_log_level(config)?;
    validate_parser(config)?;
    validate_retry(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    let valid_levels = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "DISABLED"];
    if !valid_levels.contains(&config.features.log_level.to_uppercase().as_str()) {
        return Err(validation_err(format!(
            "log_level must be one of {valid_levels:?}"
        )));
    }
    Ok(())
}

fn validate_parser(config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(ref key_name) = config.parser.key_name {
        if key_name.trim().is_empty() {
            return Err(validation_err("parser.key_name cannot be empty when set"));
        }
    }
    Ok(())
}

fn validate_retry(config: &AppConfig) -> Result<(), ConfigError> {
    let features = &config.features;
    if features.enable_correction_retry && features.correction_retry_max_attempts == 0 {
        return Err(validation_err(
            "features.correction_retry_max_attempts must be greater than 0 when retry is enabled",
        ));
    }
    if let Some(ref tmpl) = features.correction_prompt_template {
        if !tmpl.contains("{error_details}") || !tmpl.contains("{original_response}") {
            return Err(validation_err(
                "correction_prompt_template must contain {error_details} and {original_response} placeholders",
            ));
        }
    }
    Ok(())
}
