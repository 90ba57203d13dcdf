use crate::url::NormalizedUrl;
use crate::ConfigError;
use regex::Regex;

/// Default exclusion patterns for parametrized product and recipe detail pages
///
/// Matches paths such as `/products/hot-smoked-roasted-salmon-352` and
/// `/recipes/classic-beef-tacos-123456`.
pub const DEFAULT_EXCLUSION_PATTERNS: &[&str] = &[r"/products/[^/]+-\d+$", r"/recipes/[^/]+-\d+$"];

/// Decides whether a discovered URL should be kept out of the frontier
///
/// Excluded URLs are never enqueued, even when they are otherwise new. This is
/// a pre-filter applied before any page is rendered and is independent of the
/// structural fingerprint.
pub trait ExclusionPolicy: Send + Sync {
    /// Returns true if the URL must not be crawled
    fn is_excluded(&self, url: &NormalizedUrl) -> bool;
}

impl<F> ExclusionPolicy for F
where
    F: Fn(&NormalizedUrl) -> bool + Send + Sync,
{
    fn is_excluded(&self, url: &NormalizedUrl) -> bool {
        self(url)
    }
}

/// Policy that accepts every URL
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExclusions;

impl ExclusionPolicy for NoExclusions {
    fn is_excluded(&self, _url: &NormalizedUrl) -> bool {
        false
    }
}

/// Excludes URLs whose path matches any of a set of regular expressions
#[derive(Debug, Clone)]
pub struct PatternExclusion {
    patterns: Vec<Regex>,
}

impl PatternExclusion {
    /// Compiles the given patterns
    ///
    /// # Returns
    ///
    /// * `Ok(PatternExclusion)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - The first pattern that failed to compile
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Builds the policy from [`DEFAULT_EXCLUSION_PATTERNS`]
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(DEFAULT_EXCLUSION_PATTERNS)
    }

    /// Returns the number of compiled patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no patterns are configured
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl ExclusionPolicy for PatternExclusion {
    fn is_excluded(&self, url: &NormalizedUrl) -> bool {
        let path = url.path();
        self.patterns.iter().any(|p| p.is_match(path))
    }
}
