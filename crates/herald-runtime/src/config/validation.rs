//! Configuration validation utilities.
//!
//! Owner ids are not checked here; the client warns about malformed ones
//! when it is built.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ClientConfig, HeraldConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_client_config(&config.client)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates client settings.
fn validate_client_config(client: &ClientConfig) -> ConfigResult<()> {
    if client.use_help && client.help_word.trim().is_empty() {
        return Err(ConfigError::validation(
            "help_word must not be empty while use_help is enabled",
        ));
    }

    // The help word is compared against a single parsed command name.
    if client.help_word.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "help_word cannot contain whitespace: {:?}",
            client.help_word
        )));
    }

    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter module name: {module:?}"
        )));
    }

    Ok(())
}
