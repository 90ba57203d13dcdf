use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_audit::config::load_config;
///
/// let config = load_config(Path::new("audit.toml")).unwrap();
/// println!("Max iterations: {}", config.crawler.max_iterations);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    parse_config(&content)
}

/// Parses and validates configuration from TOML text
///
/// Sections and keys that are missing take their default values.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    // Parse TOML
    let config: Config = toml::from_str(content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}
