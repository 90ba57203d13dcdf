//! Configuration module for Sumi-Audit
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a default, so a crawl can run without any file at all.
//!
//! # Example
//!
//! ```no_run
//! use sumi_audit::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("audit.toml")).unwrap();
//! println!("Batches of {} pages", config.crawler.concurrency_limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnalyzerConfig, Config, CrawlerConfig, ExclusionConfig, OutputConfig, RendererConfig,
    DEFAULT_CONCURRENCY_LIMIT, DEFAULT_MAX_ITERATIONS, DEFAULT_REPORT_PATH,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
