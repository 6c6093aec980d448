//! URL glob patterns for route fixtures
//!
//! Patterns use glob syntax matched against the full request URL:
//! `**` and `*` match any run of characters (including `/`), `?` matches one
//! character (so it also matches a literal `?` before a query string), and
//! `[...]` is a character class. A pattern that is not valid glob syntax is
//! matched literally.

use std::fmt;

/// Compiled URL pattern
#[derive(Clone)]
pub struct UrlPattern {
    source: String,
    glob: glob::Pattern,
}

impl UrlPattern {
    /// Compile a pattern, falling back to literal matching on invalid glob syntax
    pub fn new(pattern: &str) -> Self {
        let glob = glob::Pattern::new(pattern).unwrap_or_else(|e| {
            tracing::debug!(pattern, error = %e, "Pattern is not a valid glob, matching literally");
            literal(pattern)
        });
        Self {
            source: pattern.to_string(),
            glob,
        }
    }

    /// Returns `true` if the URL matches this pattern
    pub fn is_match(&self, url: &str) -> bool {
        self.glob.matches(url)
    }

    /// The pattern as written in the scenario
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn literal(pattern: &str) -> glob::Pattern {
    // Escaped text is always valid glob syntax
    glob::Pattern::new(&glob::Pattern::escape(pattern)).unwrap_or_default()
}

impl fmt::Debug for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UrlPattern").field(&self.source).finish()
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for UrlPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for UrlPattern {}
