//! Performance macros over the master FX.
//!
//! Four sliders drive the master filter, delay, compressor, and sidechain
//! ducking. Slider positions are kept per macro scene (A to D); selecting a
//! scene recalls its four positions. With macros switched off the sliders
//! still store positions but nothing reaches the device, and switching off
//! returns the master FX to neutral.
//!
//! ```text
//! slider 0..100 ─► MacroBank[active scene] ─► Macro::commands ─► device
//! ```

use std::time::Duration;

use patchbay_core::{ChannelIndex, ParamDescriptor, ParamUnit};
use serde::{Deserialize, Serialize};

use crate::command::DeviceCommand;

/// Blob key the bank is persisted under.
pub const MACROS_KEY: &str = "macros";

const SLIDER: ParamDescriptor = ParamDescriptor::percent("macro", "Macro", "Macro", 100.0, 0.0);

const CUTOFF: ParamDescriptor = ParamDescriptor::percent("cutoff", "Filter Cutoff", "Cutoff", 100.0, 0.0)
    .with_unit(ParamUnit::Hertz)
    .with_range(200.0, 12000.0, 200.0);

const THRESHOLD: ParamDescriptor =
    ParamDescriptor::percent("threshold", "Compressor Threshold", "Thresh", 100.0, 0.0)
        .with_unit(ParamUnit::Decibels)
        .with_range(-50.0, -6.0, -50.0);

/// Cutoff sent when macros are switched off.
const NEUTRAL_CUTOFF: f32 = 16000.0;

const SIDECHAIN_SOURCE: ChannelIndex = 0;
const SIDECHAIN_ATTACK_MS: f32 = 6.0;
const SIDECHAIN_RELEASE_MS: f32 = 180.0;
const SIDECHAIN_KNEE: f32 = 0.45;

/// One of the four macro sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Macro {
    /// Master filter cutoff, 200 Hz to 12 kHz.
    Cutoff,
    /// Master delay mix; zero switches the delay off.
    Delay,
    /// Master compressor threshold, -50 dB to -6 dB; zero switches it off.
    Compressor,
    /// Sidechain ducking from channel 0 onto every other channel.
    Sidechain,
}

impl Macro {
    /// All macros in slider order.
    pub const ALL: [Self; 4] = [Self::Cutoff, Self::Delay, Self::Compressor, Self::Sidechain];

    /// Slider position, 0-based.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The macro at a slider position.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Short display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cutoff => "Filter",
            Self::Delay => "Delay",
            Self::Compressor => "Comp",
            Self::Sidechain => "Sidechain",
        }
    }

    /// Quiet time after the last slider move before the value is sent.
    pub const fn throttle(self) -> Duration {
        match self {
            Self::Cutoff => Duration::from_millis(60),
            Self::Delay => Duration::from_millis(80),
            Self::Compressor => Duration::from_millis(90),
            Self::Sidechain => Duration::from_millis(130),
        }
    }

    /// Device commands for a slider position in `0..=100`.
    pub fn commands(self, value: u8) -> Vec<DeviceCommand> {
        let value = SLIDER.clamp(f32::from(value));
        let on = value > 0.0;
        let normalized = SLIDER.normalize(value);
        match self {
            Self::Cutoff => vec![DeviceCommand::SetFilterCutoff {
                value: CUTOFF.denormalize(normalized).round(),
            }],
            Self::Delay => vec![
                DeviceCommand::SetDelayActive { value: on },
                DeviceCommand::SetDelayMix { value },
            ],
            Self::Compressor => vec![
                DeviceCommand::SetCompressorActive { value: on },
                DeviceCommand::SetCompressorThreshold {
                    value: THRESHOLD.denormalize(normalized),
                },
            ],
            Self::Sidechain => vec![sidechain(on, (1..16).collect(), value)],
        }
    }
}

fn sidechain(active: bool, destinations: Vec<ChannelIndex>, amount: f32) -> DeviceCommand {
    DeviceCommand::SetSidechainPro {
        active,
        source: SIDECHAIN_SOURCE,
        destinations,
        amount,
        attack: SIDECHAIN_ATTACK_MS,
        release: SIDECHAIN_RELEASE_MS,
        knee: SIDECHAIN_KNEE,
    }
}

/// A stored set of four slider positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum MacroScene {
    /// Scene A.
    #[default]
    A,
    /// Scene B.
    B,
    /// Scene C.
    C,
    /// Scene D.
    D,
}

impl MacroScene {
    /// All scenes in display order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    const fn index(self) -> usize {
        self as usize
    }

    /// Parses a scene letter, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }
}

/// Slider positions for every scene, the active scene, and the master switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroBank {
    enabled: bool,
    active: MacroScene,
    scenes: [[u8; 4]; 4],
}

impl Default for MacroBank {
    fn default() -> Self {
        Self {
            enabled: true,
            active: MacroScene::A,
            scenes: [[45, 35, 55, 40], [70, 20, 68, 55], [25, 62, 34, 22], [55, 48, 72, 68]],
        }
    }
}

impl MacroBank {
    /// Whether slider moves reach the device.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The scene sliders currently read and write.
    pub fn active(&self) -> MacroScene {
        self.active
    }

    /// Positions of the active scene, in slider order.
    pub fn values(&self) -> [u8; 4] {
        self.scene_values(self.active)
    }

    /// Positions stored in `scene`.
    pub fn scene_values(&self, scene: MacroScene) -> [u8; 4] {
        self.scenes[scene.index()]
    }

    /// Position of one slider in the active scene.
    pub fn value(&self, m: Macro) -> u8 {
        self.values()[m.index()]
    }

    /// Stores a slider position in the active scene. Returns the stored
    /// value, clamped to `0..=100` and rounded; NaN stores 0.
    pub fn set_value(&mut self, m: Macro, value: f32) -> u8 {
        let stored = SLIDER.clamp(value).round() as u8;
        self.scenes[self.active.index()][m.index()] = stored;
        stored
    }

    /// Makes `scene` active. Returns `false` if it already was.
    pub fn select(&mut self, scene: MacroScene) -> bool {
        let changed = self.active != scene;
        self.active = scene;
        changed
    }

    /// Sets the master switch. Returns `false` if unchanged.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }

    /// Commands that return the master FX to neutral.
    pub fn reset_commands() -> Vec<DeviceCommand> {
        vec![
            DeviceCommand::SetFilterCutoff {
                value: NEUTRAL_CUTOFF,
            },
            DeviceCommand::SetDelayActive { value: false },
            DeviceCommand::SetCompressorActive { value: false },
            sidechain(false, Vec::new(), 0.0),
        ]
    }

    /// Clamps positions read from storage back into `0..=100`.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        for value in self.scenes.iter_mut().flatten() {
            *value = (*value).min(100);
        }
        self
    }
}
