//! Accessibility analyzer interface
//!
//! Rule evaluation is delegated to an external accessibility engine. This module
//! defines the violation model the crawler records and the trait an engine
//! adapter implements. [`CommandAnalyzer`] runs an engine as a child process and
//! reads its JSON results.

mod command;

pub use command::{parse_engine_output, CommandAnalyzer};

use crate::render::RenderedPage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while analyzing a page
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Failed to start analyzer '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("Analyzer timed out after {timeout_ms}ms on {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Analyzer failed on {url}: {message}")]
    Engine { url: String, message: String },

    #[error("Invalid analyzer output: {0}")]
    InvalidOutput(String),
}

/// Severity of a violation
///
/// `Unknown` is used when the engine does not report an impact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    #[default]
    Unknown,
    Minor,
    Moderate,
    Serious,
    Critical,
}

impl Impact {
    /// Parses an engine-reported impact, falling back to `Unknown`
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("minor") => Self::Minor,
            Some("moderate") => Self::Moderate,
            Some("serious") => Self::Serious,
            Some("critical") => Self::Critical,
            _ => Self::Unknown,
        }
    }

    /// Returns the lowercase name of the impact
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Serious => "serious",
            Self::Critical => "critical",
        }
    }

    /// Returns all impacts, most severe first
    pub fn all() -> [Self; 5] {
        [
            Self::Critical,
            Self::Serious,
            Self::Moderate,
            Self::Minor,
            Self::Unknown,
        ]
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One accessibility rule failure on a page
///
/// Copied verbatim from the engine's result and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Rule identifier
    pub id: String,

    /// What the rule checks
    pub description: String,

    /// Short remediation hint
    pub help: String,

    /// Link to the rule documentation
    pub help_url: String,

    /// Severity
    pub impact: Impact,

    /// Selectors of the offending DOM nodes
    pub nodes: Vec<String>,
}

/// Runs accessibility rules against a rendered page
#[async_trait]
pub trait AccessibilityAnalyzer: Send + Sync {
    /// Returns the violations found on `page`, in engine order
    async fn analyze(&self, page: &dyn RenderedPage) -> Result<Vec<Violation>, AnalyzeError>;
}
