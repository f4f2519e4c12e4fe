//! Platform-specific paths for configuration layers.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/matiz/` (Linux), `~/Library/Application Support/matiz/` (macOS), `%APPDATA%\matiz\` (Windows)
//! - **User layers**: `effects.{toml,yaml,yml}` and `effects.d/` inside the user config dir

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "matiz";

/// Returns the user-specific configuration directory.
///
/// # Platform Paths
///
/// - Linux: `~/.config/matiz/`
/// - macOS: `~/Library/Application Support/matiz/`
/// - Windows: `%APPDATA%\matiz\`
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Ensure the user config directory exists.
///
/// Creates the directory and any parent directories if they don't exist.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}
