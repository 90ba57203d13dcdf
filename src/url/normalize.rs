use crate::{UrlError, UrlResult};
use serde::{Serialize, Serializer};
use std::fmt;
use url::Url;

/// An absolute, same-origin URL with no query string and no fragment
///
/// Two links that differ only by query or fragment collapse to the same
/// `NormalizedUrl`, which is what the frontier uses as page identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    /// Parses and normalizes the crawl seed
    ///
    /// The seed defines the crawl origin, so unlike [`normalize`] it is not
    /// checked against another origin. Only `http` and `https` seeds are accepted.
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_audit::url::NormalizedUrl;
    ///
    /// let seed = NormalizedUrl::parse_seed("https://Example.com/start?x=1#top").unwrap();
    /// assert_eq!(seed.as_str(), "https://example.com/start");
    /// ```
    pub fn parse_seed(seed: &str) -> UrlResult<Self> {
        let url = Url::parse(seed.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )));
        }

        if url.host_str().is_none() {
            return Err(UrlError::MissingHost);
        }

        Ok(Self::strip(url))
    }

    fn strip(mut url: Url) -> Self {
        url.set_fragment(None);
        url.set_query(None);
        Self(url)
    }

    /// Returns the URL as a string slice
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the URL path
    pub fn path(&self) -> &str {
        self.0.path()
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Normalizes a raw link relative to the crawl base
///
/// # Normalization Steps
///
/// 1. Resolve `raw_link` against `base` (relative links are allowed)
/// 2. Reject the link if it cannot be parsed
/// 3. Reject the link if its origin differs from the origin of `base`
///    (this also rejects `mailto:`, `javascript:` and other opaque URLs)
/// 4. Remove the fragment
/// 5. Remove the whole query string
///
/// The result is idempotent: normalizing an already normalized URL yields
/// the same value.
///
/// # Arguments
///
/// * `raw_link` - The link as found on the page
/// * `base` - The crawl base; only its origin matters for acceptance
///
/// # Returns
///
/// * `Some(NormalizedUrl)` - The canonical same-origin URL
/// * `None` - The link is malformed or points to another origin
///
/// # Examples
///
/// ```
/// use sumi_audit::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let url = normalize("/about?ref=1#team", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
///
/// assert!(normalize("https://other.com/", &base).is_none());
/// ```
pub fn normalize(raw_link: &str, base: &Url) -> Option<NormalizedUrl> {
    let resolved = base.join(raw_link.trim()).ok()?;

    if resolved.origin() != base.origin() {
        return None;
    }

    Some(NormalizedUrl::strip(resolved))
}
