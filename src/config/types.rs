use crate::render::{RenderOptions, WaitCondition, DEFAULT_NAVIGATION_TIMEOUT_MS};
use crate::url::exclusion::DEFAULT_EXCLUSION_PATTERNS;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of pages scanned concurrently in one batch
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// Default ceiling on crawl loop iterations
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Default location of the HTML report
pub const DEFAULT_REPORT_PATH: &str = "accessibility-report.html";

/// Main configuration structure for Sumi-Audit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub renderer: RendererConfig,
    pub analyzer: AnalyzerConfig,
    pub exclusions: ExclusionConfig,
    pub output: OutputConfig,
}

/// Crawl loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages scanned concurrently in one batch
    #[serde(rename = "concurrency-limit")]
    pub concurrency_limit: usize,

    /// Maximum number of batches before the crawl stops
    #[serde(rename = "max-iterations")]
    pub max_iterations: usize,

    /// Bounded wait for a page to become ready (milliseconds)
    #[serde(rename = "navigation-timeout-ms")]
    pub navigation_timeout_ms: u64,

    /// When a page counts as ready
    #[serde(rename = "wait-until")]
    pub wait_until: WaitCondition,
}

impl CrawlerConfig {
    /// Returns the options passed to the renderer for every page
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            wait_until: self.wait_until,
            timeout: Duration::from_millis(self.navigation_timeout_ms),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            wait_until: WaitCondition::default(),
        }
    }
}

/// Page renderer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// User agent sent with every page request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("sumi-audit/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// External accessibility engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Program to run for each page
    pub command: String,

    /// Arguments; `{url}` is replaced with the page URL
    pub args: Vec<String>,

    /// Maximum time one analysis may take (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            command: "axe".to_string(),
            args: vec!["{url}".to_string(), "--stdout".to_string()],
            timeout_ms: 60_000,
        }
    }
}

/// URL exclusion configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    /// Regular expressions matched against the normalized URL path
    pub patterns: Vec<String>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_EXCLUSION_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the HTML report
    #[serde(rename = "report-path")]
    pub report_path: PathBuf,

    /// Custom report template; must contain the `{{TABLE_ROWS}}` placeholder
    #[serde(rename = "template-path")]
    pub template_path: Option<PathBuf>,

    /// Optional JSON dump of the crawl result
    #[serde(rename = "json-path")]
    pub json_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            template_path: None,
            json_path: None,
        }
    }
}
