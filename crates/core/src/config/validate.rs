use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Queue batching parameters are usable
/// - Counter section is well-formed
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Queue validation
    if config.queue.max_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "queue.max_batch_size must be at least 1".to_string(),
        ));
    }
    if config.queue.max_batch_wait_ms == 0 {
        return Err(ConfigError::ValidationError(
            "queue.max_batch_wait_ms must be at least 1".to_string(),
        ));
    }

    // Counter validation
    if config.counter.name.is_empty() {
        return Err(ConfigError::ValidationError(
            "counter.name cannot be empty".to_string(),
        ));
    }
    if config.counter.command_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "counter.command_buffer must be at least 1".to_string(),
        ));
    }

    Ok(())
}
