//! Platform-specific paths for settings and stored scenes.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/patchbay/` (Linux), `~/Library/Application Support/patchbay/` (macOS), `%APPDATA%\patchbay\` (Windows)
//! - **Settings file**: `<user config>/settings.toml`
//! - **Scene store**: `<user config>/scenes/`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "patchbay";

/// Subdirectory name for the scene store.
const SCENES_SUBDIR: &str = "scenes";

/// File name of the settings file.
const SETTINGS_FILE: &str = "settings.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the default settings file path.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// Returns the directory backing the persistent scene store.
pub fn scenes_dir() -> PathBuf {
    user_config_dir().join(SCENES_SUBDIR)
}
