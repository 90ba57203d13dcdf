//! Crawl orchestrator state definitions
use std::fmt;

/// Represents the state of the crawl loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Batches are being taken from the frontier and scanned
    Running,

    /// The frontier is empty or the iteration budget is spent; shared
    /// resources are being released
    Draining,

    /// The crawl is finished and the result has been handed off
    Done,
}

impl CrawlState {
    /// Returns true if the loop may still start new batches
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if `self -> next` is a legal transition
    ///
    /// The machine only moves forward: `Running -> Draining -> Done`.
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::Draining) | (Self::Draining, Self::Done)
        )
    }

    /// Returns the lowercase name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
