//! Sumi-Audit: an accessibility crawler
//!
//! This crate crawls a website from a single seed URL, scans every internal
//! page it can reach with an external accessibility engine, and collects the
//! violations into an HTML report. Pages that share a DOM skeleton with a page
//! already scanned are skipped, so templated listings are only analyzed once.

pub mod analyzer;
pub mod config;
pub mod crawler;
pub mod render;
pub mod report;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("Failed to launch page renderer: {0}")]
    RendererLaunch(String),

    #[error("Report error: {0}")]
    Report(#[from] report::ReportError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid exclusion pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Sumi-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analyzer::{AccessibilityAnalyzer, Impact, Violation};
pub use config::Config;
pub use crawler::{Coordinator, CrawlEvent, CrawlOutcome};
pub use render::{PageRenderer, RenderedPage};
pub use report::{CrawlResult, PageRecord, ReportModel};
pub use state::{CrawlState, PageState};
pub use url::{normalize, NormalizedUrl};
