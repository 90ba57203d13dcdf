//! Link discovery
//!
//! This module turns the raw hyperlink targets of a rendered page into new
//! frontier entries:
//! - Links are normalized against the crawl base (cross-origin and malformed
//!   links are dropped)
//! - Links already pending or visited are dropped
//! - Links matched by the exclusion policy are dropped and reported
//! - Every remaining link is offered to the frontier before it is returned

use crate::crawler::frontier::Frontier;
use crate::render::{RenderError, RenderedPage};
use crate::url::{normalize, ExclusionPolicy, NormalizedUrl};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use url::Url;

/// Links found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkExtraction {
    /// Newly discovered URLs, now pending in the frontier
    pub accepted: Vec<NormalizedUrl>,

    /// New URLs rejected by the exclusion policy
    pub excluded: Vec<NormalizedUrl>,
}

/// Filters raw hrefs and enqueues the new ones
///
/// # Arguments
///
/// * `hrefs` - Link targets as reported by the page
/// * `base` - The crawl base; only same-origin links are kept
/// * `frontier` - The frontier to check against and offer to
/// * `exclusions` - Policy for near-duplicate URL shapes
///
/// # Returns
///
/// The accepted and excluded URLs, each without duplicates, in page order.
///
/// # Example
///
/// ```
/// use sumi_audit::crawler::{extract_links, Frontier};
/// use sumi_audit::url::{NoExclusions, NormalizedUrl};
///
/// let seed = NormalizedUrl::parse_seed("https://example.com/").unwrap();
/// let mut frontier = Frontier::new(seed.clone());
/// let hrefs = vec!["https://example.com/about".to_string()];
///
/// let links = extract_links(&hrefs, seed.as_url(), &mut frontier, &NoExclusions);
/// assert_eq!(links.accepted.len(), 1);
/// assert!(frontier.is_pending(&links.accepted[0]));
/// ```
pub fn extract_links(
    hrefs: &[String],
    base: &Url,
    frontier: &mut Frontier,
    exclusions: &dyn ExclusionPolicy,
) -> LinkExtraction {
    let mut extraction = LinkExtraction::default();
    let mut rejected: HashSet<NormalizedUrl> = HashSet::new();

    for href in hrefs {
        let Some(url) = normalize(href, base) else {
            tracing::trace!("Dropping link {}", href);
            continue;
        };

        // Check if the link was already scanned or scheduled
        if frontier.is_known(&url) || rejected.contains(&url) {
            continue;
        }

        // Skip near-duplicate detail pages
        if exclusions.is_excluded(&url) {
            tracing::debug!("Skipping excluded URL: {}", url);
            rejected.insert(url.clone());
            extraction.excluded.push(url);
            continue;
        }

        if frontier.offer(url.clone()) {
            tracing::debug!("Adding new link: {}", url);
            extraction.accepted.push(url);
        }
    }

    extraction
}

/// Queries a page for its links and enqueues the new ones
///
/// The page is queried before the frontier lock is taken, so the lock is never
/// held across a suspension point.
pub async fn extract_page_links(
    page: &dyn RenderedPage,
    base: &Url,
    frontier: &Mutex<Frontier>,
    exclusions: &dyn ExclusionPolicy,
) -> Result<LinkExtraction, RenderError> {
    let hrefs = page.links().await?;

    let mut frontier = frontier.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(extract_links(&hrefs, base, &mut frontier, exclusions))
}
