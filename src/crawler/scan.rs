//! Page scan task
//!
//! One scan task runs per URL of a batch:
//! 1. Open the page through the shared renderer (bounded wait)
//! 2. Fingerprint the body; a fingerprint already claimed marks the page as a
//!    duplicate and ends the task
//! 3. Run the accessibility analyzer and build a [`PageRecord`]
//! 4. Offer the page's new links to the frontier
//! 5. Close the page, whatever happened above
//!
//! Failures never escape a task. They are returned as [`ScanOutcome::Failed`]
//! and reported on the event stream.

use crate::analyzer::{AccessibilityAnalyzer, AnalyzeError, Violation};
use crate::crawler::events::{CrawlEvent, EventSink};
use crate::crawler::fingerprint::fingerprint_page;
use crate::crawler::frontier::Frontier;
use crate::crawler::links::{extract_page_links, LinkExtraction};
use crate::render::{PageRenderer, RenderError, RenderOptions, RenderedPage};
use crate::report::PageRecord;
use crate::state::PageState;
use crate::url::{ExclusionPolicy, NormalizedUrl};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use url::Url;

/// Why a page could not be scanned
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error("Scan task aborted: {0}")]
    Aborted(String),
}

/// Everything a scan task needs, shared by all tasks of a crawl
pub struct ScanContext {
    pub renderer: Arc<dyn PageRenderer>,
    pub analyzer: Arc<dyn AccessibilityAnalyzer>,
    pub frontier: Arc<Mutex<Frontier>>,
    pub exclusions: Arc<dyn ExclusionPolicy>,

    /// Only links on this origin are followed
    pub base: Url,

    pub options: RenderOptions,
    pub events: EventSink,
}

/// Result of scanning one URL
#[derive(Debug)]
pub enum ScanOutcome {
    /// The page was analyzed
    Recorded {
        record: PageRecord,
        links: LinkExtraction,
    },

    /// The page shares its structure with a page already analyzed
    Duplicate {
        url: NormalizedUrl,
        fingerprint: String,
    },

    /// Rendering or analysis failed
    Failed { url: NormalizedUrl, error: ScanError },
}

impl ScanOutcome {
    /// Returns the scanned URL
    pub fn url(&self) -> &NormalizedUrl {
        match self {
            Self::Recorded { record, .. } => &record.url,
            Self::Duplicate { url, .. } | Self::Failed { url, .. } => url,
        }
    }

    /// Returns the page outcome
    pub fn state(&self) -> PageState {
        match self {
            Self::Recorded { .. } => PageState::Scanned,
            Self::Duplicate { .. } => PageState::Duplicate,
            Self::Failed { .. } => PageState::Failed,
        }
    }
}

enum Inspection {
    Duplicate(String),
    Analyzed {
        violations: Vec<Violation>,
        links: LinkExtraction,
    },
}

/// Scans one URL
///
/// # Arguments
///
/// * `ctx` - The shared crawl context
/// * `url` - A URL already moved to `visited`
///
/// # Returns
///
/// The outcome of the scan. An opened page is always closed, including when
/// the analyzer or a page query panics; the panic becomes
/// [`ScanError::Aborted`].
pub async fn scan_page(ctx: Arc<ScanContext>, url: NormalizedUrl) -> ScanOutcome {
    tracing::debug!("Scanning: {}", url);

    let page = match ctx.renderer.open(&url, &ctx.options).await {
        Ok(page) => page,
        Err(e) => return failed(&ctx, url, e.into()),
    };

    let inspection = AssertUnwindSafe(inspect(&ctx, page.as_ref()))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ScanError::Aborted(panic_message(panic.as_ref()))));

    if let Err(e) = page.close().await {
        tracing::debug!("Failed to close page {}: {}", url, e);
    }

    match inspection {
        Ok(Inspection::Duplicate(fingerprint)) => {
            ctx.events.emit(CrawlEvent::PageSkippedDuplicate {
                url: url.clone(),
                fingerprint: fingerprint.clone(),
                timestamp: Utc::now(),
            });
            ScanOutcome::Duplicate { url, fingerprint }
        }
        Ok(Inspection::Analyzed { violations, links }) => {
            emit_links(&ctx.events, &url, &links);
            ctx.events.emit(CrawlEvent::PageScanned {
                url: url.clone(),
                violations: violations.len(),
                links_found: links.accepted.len(),
                timestamp: Utc::now(),
            });
            ScanOutcome::Recorded {
                record: PageRecord::new(url, violations),
                links,
            }
        }
        Err(error) => failed(&ctx, url, error),
    }
}

async fn inspect(ctx: &ScanContext, page: &dyn RenderedPage) -> Result<Inspection, ScanError> {
    let fingerprint = fingerprint_page(page).await?;

    let first_seen = {
        let mut frontier = ctx.frontier.lock().unwrap_or_else(PoisonError::into_inner);
        frontier.record_fingerprint(&fingerprint)
    };
    if !first_seen {
        return Ok(Inspection::Duplicate(fingerprint));
    }

    let violations = ctx.analyzer.analyze(page).await?;

    // The record stands even if the link query fails
    let links = match extract_page_links(
        page,
        &ctx.base,
        &ctx.frontier,
        ctx.exclusions.as_ref(),
    )
    .await
    {
        Ok(links) => links,
        Err(e) => {
            tracing::warn!("Failed to extract links from {}: {}", page.url(), e);
            LinkExtraction::default()
        }
    };

    Ok(Inspection::Analyzed { violations, links })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}

fn emit_links(events: &EventSink, from: &NormalizedUrl, links: &LinkExtraction) {
    for url in &links.accepted {
        events.emit(CrawlEvent::LinkDiscovered {
            from: from.clone(),
            url: url.clone(),
            timestamp: Utc::now(),
        });
    }
    for url in &links.excluded {
        events.emit(CrawlEvent::LinkExcluded {
            from: from.clone(),
            url: url.clone(),
            timestamp: Utc::now(),
        });
    }
}

fn failed(ctx: &ScanContext, url: NormalizedUrl, error: ScanError) -> ScanOutcome {
    ctx.events.emit(CrawlEvent::PageFailed {
        url: url.clone(),
        error: error.to_string(),
        timestamp: Utc::now(),
    });
    ScanOutcome::Failed { url, error }
}
