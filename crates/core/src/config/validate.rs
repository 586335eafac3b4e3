use std::collections::HashSet;

use super::{types::Config, ConfigError, EngineConfig};

/// Validate configuration
/// Currently validates:
/// - Search and download timeouts, intervals and limits are non-zero
/// - Explore probability lies in [0, 1]
/// - Engine names are unique and jackett engines have an API key
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let search = &config.search;
    if search.timeout_ms == 0 {
        return Err(invalid("search.timeout_ms cannot be 0"));
    }
    if search.batch_size == 0 {
        return Err(invalid("search.batch_size cannot be 0"));
    }
    if search.max_concurrent_jobs == 0 {
        return Err(invalid("search.max_concurrent_jobs cannot be 0"));
    }
    if !(0.0..=1.0).contains(&search.explore_probability) {
        return Err(invalid("search.explore_probability must be between 0 and 1"));
    }

    let download = &config.download;
    if download.timeout_ms == 0 {
        return Err(invalid("download.timeout_ms cannot be 0"));
    }
    if download.request_interval_ms == 0 {
        return Err(invalid("download.request_interval_ms cannot be 0"));
    }

    let mut names = HashSet::new();
    for engine in &config.engines {
        if !names.insert(engine.name()) {
            return Err(ConfigError::ValidationError(format!(
                "engine name '{}' is used more than once",
                engine.name()
            )));
        }
        if let EngineConfig::Jackett { name, api_key, .. } = engine {
            if api_key.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::ValidationError(format!(
                    "jackett engine '{}' requires an api_key",
                    name
                )));
            }
        }
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
