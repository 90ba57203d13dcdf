//! Crawl event stream
//!
//! The coordinator and its scan tasks report progress as [`CrawlEvent`]s
//! instead of printing. Callers subscribe with an unbounded channel and decide
//! how to render them; without a subscriber, events are dropped.

use crate::url::NormalizedUrl;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Events emitted during a crawl
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CrawlEvent {
    /// The crawl loop is about to take its first batch
    CrawlStarted {
        seed: NormalizedUrl,
        concurrency_limit: usize,
        max_iterations: usize,
        timestamp: DateTime<Utc>,
    },

    /// A batch was taken from the frontier
    BatchStarted {
        iteration: usize,
        urls: Vec<NormalizedUrl>,
        timestamp: DateTime<Utc>,
    },

    /// A page was analyzed and recorded
    PageScanned {
        url: NormalizedUrl,
        violations: usize,
        links_found: usize,
        timestamp: DateTime<Utc>,
    },

    /// A page shares its fingerprint with a page already analyzed
    PageSkippedDuplicate {
        url: NormalizedUrl,
        fingerprint: String,
        timestamp: DateTime<Utc>,
    },

    /// A new link was added to the frontier
    LinkDiscovered {
        from: NormalizedUrl,
        url: NormalizedUrl,
        timestamp: DateTime<Utc>,
    },

    /// A new link was rejected by the exclusion policy
    LinkExcluded {
        from: NormalizedUrl,
        url: NormalizedUrl,
        timestamp: DateTime<Utc>,
    },

    /// Rendering or analysis of a page failed
    PageFailed {
        url: NormalizedUrl,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// The crawl loop is done
    CrawlFinished {
        iterations: usize,
        pages_recorded: usize,
        urls_visited: usize,
        duration: Duration,
        timestamp: DateTime<Utc>,
    },
}

impl CrawlEvent {
    /// Returns when the event was emitted
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::CrawlStarted { timestamp, .. }
            | Self::BatchStarted { timestamp, .. }
            | Self::PageScanned { timestamp, .. }
            | Self::PageSkippedDuplicate { timestamp, .. }
            | Self::LinkDiscovered { timestamp, .. }
            | Self::LinkExcluded { timestamp, .. }
            | Self::PageFailed { timestamp, .. }
            | Self::CrawlFinished { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the page URL the event is about, if any
    pub fn url(&self) -> Option<&NormalizedUrl> {
        match self {
            Self::PageScanned { url, .. }
            | Self::PageSkippedDuplicate { url, .. }
            | Self::LinkDiscovered { url, .. }
            | Self::LinkExcluded { url, .. }
            | Self::PageFailed { url, .. } => Some(url),
            Self::CrawlStarted { seed, .. } => Some(seed),
            Self::BatchStarted { .. } | Self::CrawlFinished { .. } => None,
        }
    }

    /// Renders the event through `tracing`
    pub fn log(&self) {
        match self {
            Self::CrawlStarted {
                seed,
                concurrency_limit,
                max_iterations,
                ..
            } => tracing::info!(
                "Crawl started at {} ({} pages per batch, at most {} batches)",
                seed,
                concurrency_limit,
                max_iterations
            ),
            Self::BatchStarted {
                iteration, urls, ..
            } => tracing::debug!("Batch {}: {} URLs", iteration, urls.len()),
            Self::PageScanned {
                url, violations, ..
            } => tracing::info!("Scanned {} ({} violations)", url, violations),
            Self::PageSkippedDuplicate { url, .. } => {
                tracing::info!("Skipping duplicate page structure: {}", url)
            }
            Self::LinkDiscovered { url, .. } => tracing::debug!("Adding new link: {}", url),
            Self::LinkExcluded { url, .. } => tracing::debug!("Skipping excluded URL: {}", url),
            Self::PageFailed { url, error, .. } => {
                tracing::warn!("Error scanning {}: {}", url, error)
            }
            Self::CrawlFinished {
                iterations,
                pages_recorded,
                urls_visited,
                duration,
                ..
            } => tracing::info!(
                "Crawl finished: {} pages recorded, {} URLs visited in {} batches ({:?})",
                pages_recorded,
                urls_visited,
                iterations,
                duration
            ),
        }
    }
}

/// Sending half of the event stream
///
/// Cloned into every scan task. Emitting never blocks and never fails; if the
/// receiver is gone the event is dropped.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<UnboundedSender<CrawlEvent>>,
}

impl EventSink {
    /// Creates a sink that forwards to `sender`
    pub fn new(sender: UnboundedSender<CrawlEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Creates a sink that drops every event
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Returns true if events are forwarded somewhere
    pub fn is_enabled(&self) -> bool {
        self.sender
            .as_ref()
            .map_or(false, |sender| !sender.is_closed())
    }

    /// Sends an event
    pub fn emit(&self, event: CrawlEvent) {
        if let Some(sender) = &self.sender {
            // A closed channel only means nobody is listening anymore
            let _ = sender.send(event);
        }
    }
}
