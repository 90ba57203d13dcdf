//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: The orchestrator's state machine (running, draining, done)
//! - `PageState`: The terminal outcome of scanning a single page

mod crawl_state;
mod page_state;

// Re-export main types
pub use crawl_state::CrawlState;
pub use page_state::PageState;
