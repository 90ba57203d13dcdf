//! HTTP page renderer
//!
//! This module implements [`PageRenderer`] on top of a plain HTTP client:
//! - One shared `reqwest::Client` is the rendering session
//! - A page is "ready" once its full HTML body has been received
//! - The body is parsed with `scraper` on demand
//!
//! Scripts are not executed, so the wait condition is satisfied as soon as
//! the document arrives; only the timeout bounds the wait.

use crate::config::RendererConfig;
use crate::render::snapshot::{body_snapshot, ElementNode};
use crate::render::{PageRenderer, RenderError, RenderOptions, RenderedPage};
use crate::url::NormalizedUrl;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Renderer backed by a shared HTTP client
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Builds the shared HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - The renderer configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpRenderer)` - Successfully built client
    /// * `Err(RenderError::Launch)` - The client could not be built
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sumi_audit::config::RendererConfig;
    /// use sumi_audit::render::HttpRenderer;
    ///
    /// let renderer = HttpRenderer::launch(&RendererConfig::default()).unwrap();
    /// ```
    pub fn launch(config: &RendererConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        Ok(Self { client })
    }

    /// Fetches a page and checks that it is HTML
    async fn fetch(&self, url: &NormalizedUrl) -> Result<HttpPage, RenderError> {
        let url_str = url.as_str();

        let response = self
            .client
            .get(url_str)
            .send()
            .await
            .map_err(|e| classify_error(url_str, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Http {
                url: url_str.to_string(),
                status: status.as_u16(),
            });
        }

        // Check Content-Type
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return Err(RenderError::ContentMismatch {
                url: url_str.to_string(),
                content_type,
            });
        }

        let document_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url_str, e))?;

        Ok(HttpPage {
            url: url.clone(),
            document_url,
            body,
        })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn open(
        &self,
        url: &NormalizedUrl,
        options: &RenderOptions,
    ) -> Result<Box<dyn RenderedPage>, RenderError> {
        tracing::trace!("Opening {} (wait until {:?})", url, options.wait_until);

        match tokio::time::timeout(options.timeout, self.fetch(url)).await {
            Ok(page) => Ok(Box::new(page?)),
            Err(_) => Err(RenderError::Timeout {
                url: url.to_string(),
                timeout_ms: options.timeout.as_millis() as u64,
            }),
        }
    }
}

/// A fetched HTML document
#[derive(Debug, Clone)]
pub struct HttpPage {
    url: NormalizedUrl,
    document_url: Url,
    body: String,
}

impl HttpPage {
    /// Creates a page from an already fetched document
    pub fn new(url: NormalizedUrl, document_url: Url, body: String) -> Self {
        Self {
            url,
            document_url,
            body,
        }
    }

    /// The URL the document was served from, after redirects
    pub fn document_url(&self) -> &Url {
        &self.document_url
    }
}

#[async_trait]
impl RenderedPage for HttpPage {
    fn url(&self) -> &NormalizedUrl {
        &self.url
    }

    async fn links(&self) -> Result<Vec<String>, RenderError> {
        extract_hrefs(&self.body, &self.document_url).map_err(|message| RenderError::Query {
            url: self.url.to_string(),
            message,
        })
    }

    async fn body_snapshot(&self) -> Result<ElementNode, RenderError> {
        Ok(body_snapshot(&self.body))
    }

    async fn close(&self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Returns the href of every `a[href]`, resolved against the document URL
///
/// Hrefs that cannot be resolved are returned verbatim, the same way a DOM
/// reports the raw attribute when it cannot build an absolute URL.
fn extract_hrefs(html: &str, document_url: &Url) -> Result<Vec<String>, String> {
    let selector = Selector::parse("a[href]").map_err(|e| e.to_string())?;
    let document = Html::parse_document(html);

    let hrefs = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| match document_url.join(href.trim()) {
            Ok(absolute) => absolute.to_string(),
            Err(_) => href.to_string(),
        })
        .collect();

    Ok(hrefs)
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

/// Maps a transport error to a render error
fn classify_error(url: &str, error: reqwest::Error) -> RenderError {
    if error.is_connect() {
        RenderError::Unreachable {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        RenderError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
