//! Error types for the scenario runner
//!
//! Messages name the failed expectation (locator, URL, budget) so that a
//! human reading a failed run knows where to look next, usually alongside
//! the failure screenshot.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scenario runner
#[derive(Error, Debug)]
pub enum Error {
    // === Browser Lifecycle Errors ===
    #[error("Failed to launch browser: {0}. Install Chromium or set browser.executable in the config")]
    Launch(String),

    #[error("Browser protocol error: {0}")]
    Browser(String),

    #[error("Browser session is closed")]
    SessionClosed,

    // === Navigation Errors ===
    #[error("Navigation to '{url}' failed: {reason}")]
    Navigation { url: String, reason: String },

    // === Locator Errors ===
    #[error("Timed out after {timeout_ms}ms waiting for {locator} to be {state}")]
    WaitTimeout {
        locator: String,
        state: String,
        timeout_ms: u64,
    },

    #[error("Expected exactly one element for {locator}, found {count}")]
    ElementNotFound { locator: String, count: usize },

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    // === Assertion Errors ===
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    // === Fixture Errors ===
    #[error("Invalid URL pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid fixture for '{pattern}': {reason}")]
    InvalidFixture { pattern: String, reason: String },

    // === Artifact Errors ===
    #[error("Failed to write screenshot '{path}': {reason}")]
    Screenshot { path: String, reason: String },

    // === Scenario / Configuration Errors ===
    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a navigation error
    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid fixture error
    pub fn invalid_fixture(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidFixture {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a screenshot error
    pub fn screenshot(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Screenshot {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Wrap an engine-level error
    pub fn browser(e: impl std::fmt::Display) -> Self {
        Self::Browser(e.to_string())
    }

    /// Short machine-friendly label for the error kind, used in summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Launch(_) => "LAUNCH_ERROR",
            Error::Navigation { .. } => "NAVIGATION_ERROR",
            Error::WaitTimeout { .. } => "TIMEOUT",
            Error::ElementNotFound { .. } => "ELEMENT_NOT_FOUND",
            Error::AssertionFailed(_) => "ASSERTION_FAILURE",
            Error::Scenario(_)
            | Error::Config(_)
            | Error::ConfigParse(_)
            | Error::InvalidLocator(_)
            | Error::InvalidPattern { .. }
            | Error::InvalidFixture { .. } => "INVALID_SCENARIO",
            _ => "INTERNAL_ERROR",
        }
    }
}
