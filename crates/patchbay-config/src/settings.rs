//! Engine settings loaded from TOML.
//!
//! Every field has a default matching the RED808 firmware's expectations, so
//! an empty or partial file is valid.
//!
//! # TOML Format
//!
//! ```toml
//! channel_count = 16
//! removable_sources = false
//!
//! [[default_buses]]
//! name = "BUS A"
//! color = "teal"
//! x = 2240.0
//! y = 380.0
//!
//! [dispatch]
//! min_send_gap_ms = 12
//! queue_capacity = 240
//!
//! [debounce]
//! param_ms = 35
//!
//! [reconcile]
//! stagger_ms = 34
//! replay_margin_ms = 80
//! max_replay = 48
//!
//! [scenes]
//! quantize = true
//! boundary_modulus = 4
//! step_hold_ms = 850
//!
//! [persistence]
//! autosave = true
//! ```

use std::path::Path;
use std::time::Duration;

use patchbay_core::{NamedColor, Position};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest channel count the engine accepts.
pub const MAX_CHANNELS: u8 = 64;

/// A bus created when the engine starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSettings {
    /// Display name.
    pub name: String,
    /// Display colour.
    pub color: NamedColor,
    /// Initial horizontal position.
    #[serde(default)]
    pub x: f32,
    /// Initial vertical position.
    #[serde(default)]
    pub y: f32,
}

impl BusSettings {
    /// Layout position of the bus.
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Outbound command pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Minimum gap between two sends on the device link.
    pub min_send_gap_ms: u64,
    /// Queue bound; the oldest entry is dropped on overflow.
    pub queue_capacity: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            min_send_gap_ms: 12,
            queue_capacity: 240,
        }
    }
}

impl DispatchSettings {
    /// Minimum gap as a [`Duration`].
    pub fn min_send_gap(&self) -> Duration {
        Duration::from_millis(self.min_send_gap_ms)
    }
}

/// Parameter drag coalescing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceSettings {
    /// Quiet period before a parameter edit is sent.
    pub param_ms: u64,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self { param_ms: 35 }
    }
}

impl DebounceSettings {
    /// Debounce window as a [`Duration`].
    pub fn param_window(&self) -> Duration {
        Duration::from_millis(self.param_ms)
    }
}

/// Reconnect reconciliation timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSettings {
    /// Spacing between per-channel reset bursts and between replayed edges.
    pub stagger_ms: u64,
    /// Extra wait after the last reset burst before replay starts.
    pub replay_margin_ms: u64,
    /// Upper bound on edges replayed after a reconnect.
    pub max_replay: usize,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            stagger_ms: 34,
            replay_margin_ms: 80,
            max_replay: 48,
        }
    }
}

impl ReconcileSettings {
    /// Stagger as a [`Duration`].
    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }

    /// Replay margin as a [`Duration`].
    pub fn replay_margin(&self) -> Duration {
        Duration::from_millis(self.replay_margin_ms)
    }
}

/// Scene switching behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Defer scene application to the next step boundary while playing.
    pub quantize: bool,
    /// A step is a boundary when `step % boundary_modulus == 0`.
    pub boundary_modulus: u32,
    /// How long a step message keeps the transport considered playing.
    pub step_hold_ms: u64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            quantize: true,
            boundary_modulus: 4,
            step_hold_ms: 850,
        }
    }
}

/// Automatic persistence of the working state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    /// Write the graph and macro bank to the attached store after every
    /// committed edit.
    pub autosave: bool,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self { autosave: true }
    }
}

impl SceneSettings {
    /// Step hold as a [`Duration`].
    pub fn step_hold(&self) -> Duration {
        Duration::from_millis(self.step_hold_ms)
    }
}

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of physical device channels.
    pub channel_count: u8,
    /// Allow the operator to delete source nodes.
    pub removable_sources: bool,
    /// Buses created at startup.
    pub default_buses: Vec<BusSettings>,
    /// Outbound pacing.
    pub dispatch: DispatchSettings,
    /// Parameter debounce.
    pub debounce: DebounceSettings,
    /// Reconnect reconciliation.
    pub reconcile: ReconcileSettings,
    /// Scene switching.
    pub scenes: SceneSettings,
    /// Automatic persistence.
    pub persistence: PersistenceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channel_count: 16,
            removable_sources: false,
            default_buses: vec![
                BusSettings {
                    name: "BUS A".to_string(),
                    color: NamedColor::Teal,
                    x: 2240.0,
                    y: 380.0,
                },
                BusSettings {
                    name: "BUS B".to_string(),
                    color: NamedColor::Violet,
                    x: 2240.0,
                    y: 640.0,
                },
            ],
            dispatch: DispatchSettings::default(),
            debounce: DebounceSettings::default(),
            reconcile: ReconcileSettings::default(),
            scenes: SceneSettings::default(),
            persistence: PersistenceSettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings from a TOML string and validate them.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings from a file, falling back to defaults when it does not exist.
    ///
    /// Parse and validation failures are still reported.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "settings file missing, using defaults");
            Ok(Self::default())
        }
    }

    /// Save settings to a TOML file, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_count == 0 || self.channel_count > MAX_CHANNELS {
            return Err(ConfigError::invalid_setting(
                "channel_count",
                format!("must be between 1 and {MAX_CHANNELS}"),
            ));
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::invalid_setting(
                "dispatch.queue_capacity",
                "must be at least 1",
            ));
        }
        if self.scenes.boundary_modulus == 0 {
            return Err(ConfigError::invalid_setting(
                "scenes.boundary_modulus",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Layout position of the source node for `channel`.
    pub fn source_position(channel: u8) -> Position {
        Position::new(60.0, 60.0 + f32::from(channel) * 120.0)
    }

    /// Layout position of the master output.
    pub fn sink_position() -> Position {
        Position::new(2540.0, 500.0)
    }
}
