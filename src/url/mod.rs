//! URL handling module for Sumi-Audit
//!
//! This module provides link normalization against the crawl origin and the
//! exclusion policy used to keep near-duplicate detail pages out of the frontier.

pub mod exclusion;
mod normalize;

// Re-export main types and functions
pub use exclusion::{ExclusionPolicy, NoExclusions, PatternExclusion};
pub use normalize::{normalize, NormalizedUrl};
