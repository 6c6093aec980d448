//! Common utilities shared by the CLI and the runner

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Join `target` onto `base_url` unless it is already absolute
///
/// `"/tickets/t1"` against `"http://localhost:5173"` gives
/// `"http://localhost:5173/tickets/t1"`; `"about:blank"` and full URLs are
/// returned unchanged.
pub fn resolve_url(base_url: &str, target: &str) -> Result<String> {
    if url::Url::parse(target).is_ok() {
        return Ok(target.to_string());
    }
    let base = url::Url::parse(base_url)
        .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
    base.join(target)
        .map(|u| u.to_string())
        .map_err(|e| Error::navigation(target, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_url() {
        assert_eq!(
            resolve_url("http://localhost:5173", "/tickets/ticket1").unwrap(),
            "http://localhost:5173/tickets/ticket1"
        );
        assert_eq!(
            resolve_url("http://localhost:5173/", "submit-ticket?token=t").unwrap(),
            "http://localhost:5173/submit-ticket?token=t"
        );
    }

    #[test]
    fn test_resolve_absolute_url_unchanged() {
        assert_eq!(
            resolve_url("http://localhost:5173", "http://localhost:5175/organizations/o1").unwrap(),
            "http://localhost:5175/organizations/o1"
        );
        assert_eq!(resolve_url("http://x", "about:blank").unwrap(), "about:blank");
    }

    #[test]
    fn test_resolve_bad_base() {
        assert!(matches!(
            resolve_url("not a url", "/x"),
            Err(Error::Config(_))
        ));
    }
}
