use crate::config::types::{AnalyzerConfig, Config, CrawlerConfig, ExclusionConfig, OutputConfig};
use crate::report::TABLE_ROWS_PLACEHOLDER;
use crate::url::PatternExclusion;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_analyzer_config(&config.analyzer)?;
    validate_exclusions(&config.exclusions)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency_limit < 1 || config.concurrency_limit > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency_limit must be between 1 and 64, got {}",
            config.concurrency_limit
        )));
    }

    if config.max_iterations < 1 {
        return Err(ConfigError::Validation(format!(
            "max_iterations must be >= 1, got {}",
            config.max_iterations
        )));
    }

    if config.navigation_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout_ms must be >= 100ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    Ok(())
}

/// Validates analyzer configuration
fn validate_analyzer_config(config: &AnalyzerConfig) -> Result<(), ConfigError> {
    if config.command.trim().is_empty() {
        return Err(ConfigError::Validation(
            "analyzer command cannot be empty".to_string(),
        ));
    }

    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "analyzer timeout_ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    Ok(())
}

/// Validates that every exclusion pattern compiles
fn validate_exclusions(config: &ExclusionConfig) -> Result<(), ConfigError> {
    PatternExclusion::new(&config.patterns).map(|_| ())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.report_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "report_path cannot be empty".to_string(),
        ));
    }

    if let Some(template_path) = &config.template_path {
        let template = std::fs::read_to_string(template_path)?;
        if !template.contains(TABLE_ROWS_PLACEHOLDER) {
            return Err(ConfigError::Validation(format!(
                "template '{}' does not contain the {} placeholder",
                template_path.display(),
                TABLE_ROWS_PLACEHOLDER
            )));
        }
    }

    Ok(())
}
