//! Crawl result and report model
//!
//! [`CrawlResult`] is the ordered list of page records collected by the
//! coordinator. [`to_report_model`] flattens it into one row per violation,
//! which is what the HTML report renders.

use crate::analyzer::{Impact, Violation};
use crate::url::NormalizedUrl;
use serde::Serialize;
use std::collections::HashMap;

/// Violations found on one successfully analyzed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    /// The page URL
    pub url: NormalizedUrl,

    /// Violations in engine order
    pub violations: Vec<Violation>,
}

impl PageRecord {
    /// Creates a record for a page
    pub fn new(url: NormalizedUrl, violations: Vec<Violation>) -> Self {
        Self { url, violations }
    }

    /// Returns whether the page passed every rule
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Page records in the order pages finished scanning
///
/// Records are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CrawlResult {
    pages: Vec<PageRecord>,
}

impl CrawlResult {
    /// Creates an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record
    pub fn push(&mut self, record: PageRecord) {
        self.pages.push(record);
    }

    /// Returns the records in scan order
    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    /// Iterates over the records in scan order
    pub fn iter(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages.iter()
    }

    /// Returns the number of records
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns whether no page was recorded
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Returns the record for `url`, if that page was recorded
    pub fn get(&self, url: &NormalizedUrl) -> Option<&PageRecord> {
        self.pages.iter().find(|record| &record.url == url)
    }

    /// Returns the total number of violations across all pages
    pub fn total_violations(&self) -> usize {
        self.pages.iter().map(|record| record.violations.len()).sum()
    }

    /// Counts violations by impact
    pub fn violations_by_impact(&self) -> HashMap<Impact, u64> {
        let mut counts = HashMap::new();
        for violation in self.pages.iter().flat_map(|record| &record.violations) {
            *counts.entry(violation.impact).or_insert(0) += 1;
        }
        counts
    }
}

impl From<Vec<PageRecord>> for CrawlResult {
    fn from(pages: Vec<PageRecord>) -> Self {
        Self { pages }
    }
}

/// One `(url, violation)` row of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Position of the page in the crawl result
    pub page_index: usize,

    /// Position of the violation within its page
    pub violation_index: usize,

    /// The page URL
    pub url: NormalizedUrl,

    /// The violation, copied verbatim
    pub violation: Violation,
}

impl ReportRow {
    /// Returns the element id of the row's detail panel
    pub fn details_id(&self) -> String {
        format!("details-{}-{}", self.page_index, self.violation_index)
    }
}

/// Flat, ordered report rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportModel {
    pub rows: Vec<ReportRow>,
}

impl ReportModel {
    /// Returns the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the report has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Flattens a crawl result into report rows
///
/// Rows follow page order, then violation order within a page. Pages without
/// violations contribute no rows.
///
/// # Example
///
/// ```
/// use sumi_audit::report::{to_report_model, CrawlResult};
///
/// let model = to_report_model(&CrawlResult::new());
/// assert!(model.is_empty());
/// ```
pub fn to_report_model(result: &CrawlResult) -> ReportModel {
    let rows = result
        .iter()
        .enumerate()
        .flat_map(|(page_index, record)| {
            record
                .violations
                .iter()
                .enumerate()
                .map(move |(violation_index, violation)| ReportRow {
                    page_index,
                    violation_index,
                    url: record.url.clone(),
                    violation: violation.clone(),
                })
        })
        .collect();

    ReportModel { rows }
}
