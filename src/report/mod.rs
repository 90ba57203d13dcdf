//! Report module for turning crawl results into documents
//!
//! This module handles:
//! - Collecting page records into a [`CrawlResult`]
//! - Flattening results into a [`ReportModel`] of `(url, violation)` rows
//! - Rendering the interactive HTML report
//! - Exporting the raw result as JSON
//! - Recording and printing crawl statistics

mod html;
mod json;
mod model;
pub mod stats;

pub use html::{load_template, render_html, render_rows, write_html_report, DEFAULT_TEMPLATE};
pub use json::{to_json, write_json};
pub use model::{to_report_model, CrawlResult, PageRecord, ReportModel, ReportRow};
pub use stats::{format_statistics, print_statistics, CrawlStatistics};

use std::path::PathBuf;
use thiserror::Error;

/// Token in a report template that is replaced with the table rows
pub const TABLE_ROWS_PLACEHOLDER: &str = "{{TABLE_ROWS}}";

/// Errors that can occur while writing reports
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report template {0} has no {{{{TABLE_ROWS}}}} placeholder")]
    MissingPlaceholder(String),

    #[error("Failed to serialize crawl result: {0}")]
    Json(#[from] serde_json::Error),
}
