//! Page state definitions for tracking scan outcomes
//!
//! Every URL taken from the frontier ends in exactly one of these states.
use serde::Serialize;
use std::fmt;

/// Represents the terminal outcome of scanning a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    /// Page was rendered, analyzed and its links were extracted
    Scanned,

    /// Page shares its structural fingerprint with a page scanned earlier;
    /// analysis and link extraction were skipped
    Duplicate,

    /// Rendering or analysis failed; the page produced no record
    Failed,
}

impl PageState {
    /// Returns true if this page produced a record
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Scanned)
    }

    /// Returns true if this page was skipped as a structural duplicate
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Duplicate)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns the snake_case name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scanned => "scanned",
            Self::Duplicate => "duplicate",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![Self::Scanned, Self::Duplicate, Self::Failed]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
