//! Configuration and artifact paths

use std::io;
use std::path::{Path, PathBuf};

/// Name used for the platform config/data directories
const APP_NAME: &str = "uiscenario";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/uiscenario/`
/// - macOS: `~/Library/Application Support/uiscenario/`
/// - Windows: `%APPDATA%\uiscenario\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Turn a scenario name into a directory-safe slug
///
/// `"Team settings: role menu"` becomes `"team-settings-role-menu"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("scenario");
    }
    slug
}

/// Directory holding one scenario's screenshots
pub fn scenario_artifact_dir(screenshot_dir: &Path, scenario_name: &str) -> PathBuf {
    screenshot_dir.join(slugify(scenario_name))
}

/// Create the parent directory of `path` if it doesn't exist yet
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
