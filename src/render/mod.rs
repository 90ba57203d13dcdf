//! Page rendering interface
//!
//! The crawler never talks to a browser or HTTP stack directly. It opens pages
//! through a [`PageRenderer`] and inspects them through [`RenderedPage`]:
//! - `links()` answers the `a[href]` query
//! - `body_snapshot()` evaluates the document body into an owned element tree
//! - `close()` releases the per-page resource
//!
//! [`HttpRenderer`] is the built-in implementation backed by `reqwest` and `scraper`.

mod http;
pub mod snapshot;

pub use http::{HttpPage, HttpRenderer};
pub use snapshot::{body_snapshot, DomNode, ElementNode};

use crate::url::NormalizedUrl;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Default bounded wait for a page to become ready
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Errors raised while opening or inspecting a page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Timed out after {timeout_ms}ms waiting for {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("{url} is unreachable: {message}")]
    Unreachable { url: String, message: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Expected HTML from {url}, got '{content_type}'")]
    ContentMismatch { url: String, content_type: String },

    #[error("DOM query failed on {url}: {message}")]
    Query { url: String, message: String },

    #[error("Failed to launch renderer: {0}")]
    Launch(String),
}

/// When a page counts as ready for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitCondition {
    /// The `load` event fired
    Load,

    /// The document was parsed
    #[default]
    DomContentLoaded,

    /// No network activity for a short period
    NetworkIdle,
}

/// Options passed to [`PageRenderer::open`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub wait_until: WaitCondition,
    pub timeout: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wait_until: WaitCondition::default(),
            timeout: Duration::from_millis(DEFAULT_NAVIGATION_TIMEOUT_MS),
        }
    }
}

/// A page that has been opened and is ready for inspection
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// The URL this page was opened for
    fn url(&self) -> &NormalizedUrl;

    /// Returns the target of every `a[href]` element, resolved against the
    /// document URL
    async fn links(&self) -> Result<Vec<String>, RenderError>;

    /// Returns an owned snapshot of the document body
    async fn body_snapshot(&self) -> Result<ElementNode, RenderError>;

    /// Releases the page; called exactly once per opened page
    async fn close(&self) -> Result<(), RenderError>;
}

/// Opens pages on a shared rendering session
///
/// One renderer is created at crawl start and shared read-only by all scan
/// tasks. It is shut down once the crawl loop is done.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Opens `url` and waits, at most `options.timeout`, for it to be ready
    async fn open(
        &self,
        url: &NormalizedUrl,
        options: &RenderOptions,
    ) -> Result<Box<dyn RenderedPage>, RenderError>;

    /// Tears down the shared session
    async fn shutdown(&self) -> Result<(), RenderError> {
        Ok(())
    }
}
