//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the application under test
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserSettings,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Artifact output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            browser: BrowserSettings::default(),
            timeouts: Timeouts::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5173".to_string()
}

/// Viewport size in CSS pixels
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Browser launch settings
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserSettings {
    /// Run without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Path to the Chromium/Chrome executable (searched in PATH if unset)
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Disable the Chromium sandbox (needed in most containers)
    #[serde(default)]
    pub no_sandbox: bool,

    /// Extra command line arguments for the browser
    #[serde(default)]
    pub args: Vec<String>,

    /// Page viewport
    #[serde(default)]
    pub viewport: Viewport,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            executable: None,
            no_sandbox: false,
            args: Vec::new(),
            viewport: Viewport::default(),
        }
    }
}

fn default_headless() -> bool {
    true
}

/// Timeout settings
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Time allowed for the browser to start
    #[serde(default = "default_launch")]
    pub launch_secs: u64,

    /// Time allowed for a navigation to reach the load event
    #[serde(default = "default_navigation")]
    pub navigation_secs: u64,

    /// Default budget for `wait_for` steps
    #[serde(default = "default_wait")]
    pub wait_ms: u64,

    /// Default budget for assertion steps
    #[serde(default = "default_assert")]
    pub assert_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            launch_secs: default_launch(),
            navigation_secs: default_navigation(),
            wait_ms: default_wait(),
            assert_ms: default_assert(),
        }
    }
}

fn default_launch() -> u64 {
    30
}
fn default_navigation() -> u64 {
    30
}
fn default_wait() -> u64 {
    30_000
}
fn default_assert() -> u64 {
    5_000
}

/// Artifact output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Directory that receives screenshots, one subdirectory per scenario
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,

    /// Log browser console messages and page errors
    #[serde(default)]
    pub capture_console: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: default_screenshot_dir(),
            capture_console: false,
        }
    }
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("verification")
}

/// Executable names tried when `browser.executable` is not configured
const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

impl Config {
    /// Load configuration from `path`, or from the default config file
    ///
    /// Returns default configuration if no file exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => config_path().filter(|p| p.exists()),
        };

        if let Some(path) = path {
            let content = std::fs::read_to_string(&path).map_err(|e| super::Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
            return Self::from_toml(&content);
        }
        Ok(Self::default())
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Resolve the browser executable
    ///
    /// Falls back to searching PATH if not explicitly configured. `None` lets
    /// the engine use its own detection.
    pub fn browser_executable(&self) -> Option<PathBuf> {
        if let Some(path) = &self.browser.executable {
            return Some(path.clone());
        }
        BROWSER_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:5173");
        assert!(config.browser.headless);
        assert_eq!(config.browser.viewport, Viewport { width: 1280, height: 720 });
        assert_eq!(config.timeouts.assert_ms, 5_000);
        assert_eq!(config.output.screenshot_dir, PathBuf::from("verification"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            base_url = "http://localhost:5175"

            [browser]
            no_sandbox = true
            viewport = { width = 800, height = 600 }

            [timeouts]
            wait_ms = 15000
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:5175");
        assert!(config.browser.no_sandbox);
        assert!(config.browser.headless);
        assert_eq!(config.browser.viewport.width, 800);
        assert_eq!(config.timeouts.wait_ms, 15_000);
        assert_eq!(config.timeouts.navigation_secs, 30);
    }

    #[test]
    fn test_invalid_toml_is_config_parse_error() {
        let err = Config::from_toml("base_url = [").unwrap_err();
        assert!(matches!(err, crate::common::Error::ConfigParse(_)));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/uiscenario.toml"))).unwrap_err();
        assert!(matches!(err, crate::common::Error::FileRead { .. }));
    }
}
