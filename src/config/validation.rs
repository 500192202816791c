// src/config/validation.rs

use super::Config;
use anyhow::{anyhow, Result};

/// Validates combinations of settings that the builder cannot express by type.
pub(super) fn validate_config(config: &Config) -> Result<()> {
    if config.excerpt_limit == 0 {
        return Err(anyhow!("Excerpt limit must be greater than zero."));
    }
    if config.prompt_excerpt_limit == 0 {
        return Err(anyhow!("Prompt excerpt limit must be greater than zero."));
    }
    if !(0.0..=2.0).contains(&config.completion.temperature) {
        return Err(anyhow!(
            "Temperature must be between 0.0 and 2.0, got {}.",
            config.completion.temperature
        ));
    }
    if config.completion.max_tokens == 0 {
        return Err(anyhow!("Max tokens must be greater than zero."));
    }
    if config.completion.timeout.is_zero() {
        return Err(anyhow!("Completion timeout must be greater than zero."));
    }
    if config.completion.model.trim().is_empty() {
        return Err(anyhow!("Model name must not be empty."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::ConfigBuilder;
    use crate::errors::Error;

    #[test]
    fn test_rejects_zero_excerpt_limit() {
        let result = ConfigBuilder::new().excerpt_limit(0).build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Excerpt limit")));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let result = ConfigBuilder::new().temperature(3.5).build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Temperature")));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = ConfigBuilder::new().timeout_secs(0).build();
        assert!(result.is_err());
    }
}
