//! Crawl statistics
//!
//! Counters collected by the coordinator while the crawl runs, and a plain
//! text rendering printed at the end of a CLI run.

use crate::analyzer::Impact;
use crate::report::model::CrawlResult;
use crate::state::PageState;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlStatistics {
    /// Number of batches run
    pub iterations: usize,

    /// Number of URLs taken for scanning
    pub urls_visited: u64,

    /// Count of pages by outcome
    pub pages_by_state: HashMap<PageState, u64>,

    /// Links added to the frontier
    pub links_discovered: u64,

    /// Links rejected by the exclusion policy
    pub links_excluded: u64,

    /// URLs still pending when the crawl stopped
    pub pages_left_pending: u64,

    /// Total number of violations recorded
    pub total_violations: u64,

    /// Violations by impact
    pub violations_by_impact: HashMap<Impact, u64>,

    /// Wall-clock time of the crawl loop
    pub duration: Duration,
}

impl CrawlStatistics {
    /// Creates empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one page outcome
    pub fn record_page(&mut self, state: PageState) {
        *self.pages_by_state.entry(state).or_insert(0) += 1;
    }

    /// Returns the number of pages with the given outcome
    pub fn pages(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Fills the violation counters from the final result
    pub fn record_violations(&mut self, result: &CrawlResult) {
        self.total_violations = result.total_violations() as u64;
        self.violations_by_impact = result.violations_by_impact();
    }

    /// Returns the share of visited URLs that produced a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.urls_visited == 0 {
            return 0.0;
        }
        (self.pages(PageState::Scanned) as f64 / self.urls_visited as f64) * 100.0
    }
}

/// Formats statistics as a plain text block
pub fn format_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Batches run: {}", stats.iterations);
    let _ = writeln!(out, "  URLs visited: {}", stats.urls_visited);
    let _ = writeln!(out, "  Links discovered: {}", stats.links_discovered);
    let _ = writeln!(out, "  Links excluded: {}", stats.links_excluded);
    if stats.pages_left_pending > 0 {
        let _ = writeln!(out, "  Left pending: {}", stats.pages_left_pending);
    }
    let _ = writeln!(out, "  Duration: {:.1}s", stats.duration.as_secs_f64());
    let _ = writeln!(out);

    let _ = writeln!(out, "Pages by State:");
    for state in PageState::all_states() {
        let count = stats.pages(state);
        let percentage = if stats.urls_visited > 0 {
            (count as f64 / stats.urls_visited as f64) * 100.0
        } else {
            0.0
        };
        let _ = writeln!(out, "  {}: {} ({:.1}%)", state, count, percentage);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Violations: {}", stats.total_violations);
    for impact in Impact::all() {
        if let Some(count) = stats.violations_by_impact.get(&impact) {
            let _ = writeln!(out, "  {}: {}", impact, count);
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} pages analyzed)",
        stats.success_rate(),
        stats.pages(PageState::Scanned),
        stats.urls_visited
    );

    out
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    print!("{}", format_statistics(stats));
}
