//! Crawl frontier
//!
//! The frontier owns the three bookkeeping sets of a crawl:
//! - `pending`: discovered URLs waiting to be scanned, in insertion order
//! - `visited`: URLs that have been taken for scanning (never shrinks)
//! - `seen_fingerprints`: structural fingerprints already analyzed (never shrinks)
//!
//! A URL is never in `pending` and `visited` at the same time, and once it is
//! visited it can never be offered again.

use crate::url::NormalizedUrl;
use std::collections::{HashSet, VecDeque};

/// Frontier of a single crawl
#[derive(Debug, Default)]
pub struct Frontier {
    /// Scan order of pending URLs
    queue: VecDeque<NormalizedUrl>,

    /// Membership index for `queue`
    pending: HashSet<NormalizedUrl>,

    /// URLs already taken for scanning, in the order they were taken
    visited: Vec<NormalizedUrl>,

    /// Membership index for `visited`
    visited_set: HashSet<NormalizedUrl>,

    /// Structural fingerprints already claimed by a page
    seen_fingerprints: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier with the seed as its only pending URL
    pub fn new(seed: NormalizedUrl) -> Self {
        let mut frontier = Self::default();
        frontier.offer(seed);
        frontier
    }

    /// Adds a URL to `pending`
    ///
    /// # Returns
    ///
    /// * `true` - The URL was new and is now pending
    /// * `false` - The URL was already pending or visited
    pub fn offer(&mut self, url: NormalizedUrl) -> bool {
        if self.visited_set.contains(&url) || self.pending.contains(&url) {
            return false;
        }

        tracing::trace!("Frontier offer accepted: {}", url);
        self.pending.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Moves up to `max_size` URLs from `pending` to `visited`
    ///
    /// URLs are taken in the order they were offered. The move is atomic with
    /// respect to other frontier operations because it happens under a single
    /// `&mut self` borrow.
    pub fn take_batch(&mut self, max_size: usize) -> Vec<NormalizedUrl> {
        let count = max_size.min(self.queue.len());
        let batch: Vec<NormalizedUrl> = self.queue.drain(..count).collect();

        for url in &batch {
            self.pending.remove(url);
            self.visited_set.insert(url.clone());
            self.visited.push(url.clone());
        }

        tracing::trace!(
            "Took batch of {} URLs, {} still pending",
            batch.len(),
            self.queue.len()
        );
        batch
    }

    /// Records a structural fingerprint
    ///
    /// # Returns
    ///
    /// * `true` - First time this fingerprint is seen; the caller owns the analysis
    /// * `false` - Another page already claimed it
    pub fn record_fingerprint(&mut self, fingerprint: &str) -> bool {
        if self.seen_fingerprints.contains(fingerprint) {
            return false;
        }
        self.seen_fingerprints.insert(fingerprint.to_string())
    }

    /// Returns true if the URL is pending or visited
    pub fn is_known(&self, url: &NormalizedUrl) -> bool {
        self.pending.contains(url) || self.visited_set.contains(url)
    }

    /// Returns true if the URL is waiting to be scanned
    pub fn is_pending(&self, url: &NormalizedUrl) -> bool {
        self.pending.contains(url)
    }

    /// Returns true if the URL has been taken for scanning
    pub fn is_visited(&self, url: &NormalizedUrl) -> bool {
        self.visited_set.contains(url)
    }

    /// Returns the number of pending URLs
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether no URLs are pending
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the visited URLs in the order they were taken
    pub fn visited(&self) -> &[NormalizedUrl] {
        &self.visited
    }

    /// Returns the pending URLs in scan order
    pub fn pending(&self) -> impl Iterator<Item = &NormalizedUrl> {
        self.queue.iter()
    }

    /// Returns the number of distinct fingerprints recorded
    pub fn fingerprint_count(&self) -> usize {
        self.seen_fingerprints.len()
    }
}
