//! External-command analyzer
//!
//! Runs an accessibility engine CLI once per page and parses the JSON it
//! prints. The expected shape is the axe results object, or an array of them:
//!
//! ```json
//! [{ "url": "...", "violations": [{ "id": "...", "impact": "serious",
//!    "description": "...", "help": "...", "helpUrl": "...",
//!    "nodes": [{ "target": ["#main > img"] }] }] }]
//! ```

use crate::analyzer::{AccessibilityAnalyzer, AnalyzeError, Impact, Violation};
use crate::config::AnalyzerConfig;
use crate::render::RenderedPage;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Placeholder replaced with the page URL in analyzer arguments
pub const URL_PLACEHOLDER: &str = "{url}";

/// Analyzer that shells out to an accessibility engine
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAnalyzer {
    /// Creates an analyzer from configuration
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            program: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Builds the argument list for one page
    ///
    /// Every `{url}` is substituted; if no argument mentions it, the URL is
    /// appended as the last argument.
    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(URL_PLACEHOLDER, url))
            .collect();

        if !self.args.iter().any(|a| a.contains(URL_PLACEHOLDER)) {
            args.push(url.to_string());
        }

        args
    }
}

#[async_trait]
impl AccessibilityAnalyzer for CommandAnalyzer {
    async fn analyze(&self, page: &dyn RenderedPage) -> Result<Vec<Violation>, AnalyzeError> {
        let url = page.url().as_str();

        let mut command = Command::new(&self.program);
        command
            .args(self.build_args(url))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::trace!("Running {} on {}", self.program, url);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| AnalyzeError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
            .map_err(|e| AnalyzeError::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalyzeError::Engine {
                url: url.to_string(),
                message: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        parse_engine_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Debug, Deserialize)]
struct EngineResults {
    #[serde(default)]
    violations: Vec<EngineViolation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngineViolation {
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    help: String,
    #[serde(default)]
    help_url: String,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    nodes: Vec<EngineNode>,
}

#[derive(Debug, Deserialize)]
struct EngineNode {
    #[serde(default)]
    target: Vec<Value>,
}

impl From<EngineViolation> for Violation {
    fn from(v: EngineViolation) -> Self {
        Self {
            id: v.id,
            description: v.description,
            help: v.help,
            help_url: v.help_url,
            impact: Impact::parse(v.impact.as_deref()),
            nodes: v
                .nodes
                .iter()
                .flat_map(|node| node.target.iter().map(target_to_string))
                .collect(),
        }
    }
}

/// Flattens a node target into a selector string
///
/// Targets inside shadow roots or iframes are arrays of selectors; they are
/// joined with commas.
fn target_to_string(target: &Value) -> String {
    match target {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(target_to_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Parses engine JSON into violations
///
/// Accepts a single results object or an array of results objects; the
/// violations of all objects are concatenated in order.
///
/// # Returns
///
/// * `Ok(Vec<Violation>)` - Violations in engine order
/// * `Err(AnalyzeError::InvalidOutput)` - The output is not valid results JSON
pub fn parse_engine_output(output: &str) -> Result<Vec<Violation>, AnalyzeError> {
    let value: Value =
        serde_json::from_str(output.trim()).map_err(|e| AnalyzeError::InvalidOutput(e.to_string()))?;

    let results: Vec<EngineResults> = match value {
        Value::Array(_) => serde_json::from_value(value),
        Value::Object(_) => serde_json::from_value(value).map(|r| vec![r]),
        other => {
            return Err(AnalyzeError::InvalidOutput(format!(
                "expected an object or array, got {}",
                other
            )))
        }
    }
    .map_err(|e| AnalyzeError::InvalidOutput(e.to_string()))?;

    Ok(results
        .into_iter()
        .flat_map(|r| r.violations)
        .map(Violation::from)
        .collect())
}
