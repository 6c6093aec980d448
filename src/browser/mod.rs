//! Browser page abstraction
//!
//! The scenario session drives a page only through [`BrowserPage`]. The
//! Chromium implementation lives in [`chrome`]; tests substitute a scripted
//! in-memory page.

pub mod chrome;
pub mod locator;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::common::Result;

pub use chrome::ChromePage;
pub use locator::Locator;

/// One evaluation of a locator against the current DOM
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Probe {
    /// Attached matches
    pub count: usize,
    /// Matches with a non-empty box that are not hidden by style
    pub visible: usize,
}

/// Element state a wait can target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    /// Whether a probe satisfies this state
    pub fn is_reached(&self, probe: Probe) -> bool {
        match self {
            WaitState::Visible => probe.visible > 0,
            WaitState::Hidden => probe.visible == 0,
            WaitState::Attached => probe.count > 0,
            WaitState::Detached => probe.count == 0,
        }
    }
}

impl fmt::Display for WaitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        };
        f.write_str(s)
    }
}

/// A single page in a running browser
///
/// Element actions (`click`, `fill`) act on the one element the locator
/// resolves to; implementations return `Error::ElementNotFound` with the
/// match count when that is not exactly one.
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigate and wait for the load event
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Reload the current document and wait for the load event
    async fn reload(&mut self, timeout: Duration) -> Result<()>;

    /// Count matches of a locator
    async fn probe(&mut self, locator: &Locator) -> Result<Probe>;

    async fn click(&mut self, locator: &Locator) -> Result<()>;

    /// Replace the value of an input, textarea or contenteditable element
    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<()>;

    /// Mouse click at viewport coordinates
    async fn click_at(&mut self, x: f64, y: f64) -> Result<()>;

    /// Evaluate a script in the page; returns its JSON value (null if none)
    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value>;

    /// PNG of the current viewport
    async fn screenshot(&mut self) -> Result<Vec<u8>>;

    async fn current_url(&mut self) -> Result<String>;

    /// Release the page and its browser; safe to call more than once
    async fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_states() {
        let gone = Probe { count: 0, visible: 0 };
        let hidden = Probe { count: 2, visible: 0 };
        let shown = Probe { count: 2, visible: 1 };

        assert!(!WaitState::Visible.is_reached(hidden));
        assert!(WaitState::Visible.is_reached(shown));
        assert!(WaitState::Hidden.is_reached(gone));
        assert!(WaitState::Hidden.is_reached(hidden));
        assert!(WaitState::Attached.is_reached(hidden));
        assert!(!WaitState::Detached.is_reached(hidden));
        assert!(WaitState::Detached.is_reached(gone));
    }

    #[test]
    fn test_wait_state_yaml() {
        let state: WaitState = serde_yaml::from_str("detached").unwrap();
        assert_eq!(state, WaitState::Detached);
        assert!(serde_yaml::from_str::<WaitState>("gone").is_err());
    }
}
