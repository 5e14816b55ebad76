//! Helpers shared by several commands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use patchbay_config::{Preset, Settings, get_factory_preset, settings_path};

/// Loads settings from `path`, or from the user config file if present.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => {
            let path = settings_path();
            Settings::load_or_default(&path)
                .with_context(|| format!("loading settings from {}", path.display()))
        }
    }
}

/// Resolves a factory preset by id or name, or loads a preset TOML file.
pub fn resolve_preset(name: &str) -> anyhow::Result<Preset> {
    if let Some(preset) = get_factory_preset(name) {
        return Ok(preset);
    }
    let path = PathBuf::from(name);
    if path.is_file() {
        return Preset::load(&path).with_context(|| format!("loading preset {}", path.display()));
    }
    anyhow::bail!("Unknown preset: {name}")
}
