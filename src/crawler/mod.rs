//! Crawler module for page discovery and scanning
//!
//! This module contains the core crawling logic, including:
//! - The frontier of pending and visited URLs
//! - Link extraction and structural fingerprinting
//! - The per-page scan task
//! - Overall crawl coordination and the event stream

mod coordinator;
pub mod events;
mod fingerprint;
mod frontier;
mod links;
mod scan;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use events::{CrawlEvent, EventSink};
pub use fingerprint::{canonical_markup, fingerprint, fingerprint_page, strip_volatile};
pub use frontier::Frontier;
pub use links::{extract_links, extract_page_links, LinkExtraction};
pub use scan::{scan_page, ScanContext, ScanError, ScanOutcome};
