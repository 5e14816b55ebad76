//! The closed catalog of effect kinds the device can run.
//!
//! Every [`EffectKind`] declares its parameter table, display metadata, the
//! device command family its parameters produce ([`CommandShape`]), and whether
//! the device runs it per channel or once for the whole mix ([`EffectScope`]).
//! Command translation is driven entirely from this table.
//!
//! # Example
//!
//! ```rust
//! use patchbay_core::{EffectCategory, EffectKind};
//!
//! for desc in EffectKind::ALL.iter().map(|k| k.descriptor()) {
//!     println!("{}: {}", desc.id, desc.description);
//! }
//!
//! assert_eq!(EffectKind::from_id("echo"), Some(EffectKind::Echo));
//! assert_eq!(EffectKind::Echo.label(), "REVERB");
//! assert_eq!(EffectKind::Phaser.category(), EffectCategory::Modulation);
//! ```

use serde::{Deserialize, Serialize};

use crate::color::NamedColor;
use crate::param_info::{DeviceScale, ParamDescriptor, ParamUnit};

/// Category of effect for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Biquad filters (lowpass, shelves, peaking, ...).
    Filter,
    /// Echo and delay.
    TimeBased,
    /// Bit reduction and waveshaping.
    Distortion,
    /// Compression.
    Dynamics,
    /// Flanger and phaser.
    Modulation,
}

impl EffectCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            EffectCategory::Filter => "Filter",
            EffectCategory::TimeBased => "Time-Based",
            EffectCategory::Distortion => "Distortion",
            EffectCategory::Dynamics => "Dynamics",
            EffectCategory::Modulation => "Modulation",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            EffectCategory::Filter => "Per-channel biquad filters, one filter slot per channel",
            EffectCategory::TimeBased => "Echo and delay sharing one time slot per channel",
            EffectCategory::Distortion => "Bit crushing and waveshaping sharing one FX slot",
            EffectCategory::Dynamics => "Per-channel compression",
            EffectCategory::Modulation => "Flanger per channel, phaser on the master bus",
        }
    }
}

/// Where the device runs an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectScope {
    /// One instance per channel; commands address a track.
    PerChannel,
    /// One device-wide instance; commands carry no track.
    Global,
}

/// The device command family an effect's parameters are sent as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandShape {
    /// `setTrackFilter` with a filter type code; `with_gain` adds the gain field.
    Filter {
        /// Device filter type code.
        code: u8,
        /// Whether the filter takes a gain value.
        with_gain: bool,
    },
    /// `setTrackBitCrush`.
    BitCrush,
    /// `setTrackDistortion`.
    Distortion,
    /// `setTrackEcho`.
    Echo,
    /// `setTrackFlanger`.
    Flanger,
    /// `setTrackCompressor`.
    Compressor,
    /// The global phaser commands.
    Phaser,
}

/// A device-side processing slot. Effects sharing a slot overwrite each other
/// on a channel, and clearing the slot silences all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceSlot {
    /// The per-channel filter.
    Filter,
    /// The per-channel bitcrush/distortion stage (cleared with `clearTrackFX`).
    TrackFx,
    /// The per-channel echo/delay.
    Echo,
    /// The per-channel flanger.
    Flanger,
    /// The per-channel compressor.
    Compressor,
    /// The master phaser.
    Phaser,
}

impl CommandShape {
    /// Returns the device slot the command family writes.
    pub const fn slot(self) -> DeviceSlot {
        match self {
            CommandShape::Filter { .. } => DeviceSlot::Filter,
            CommandShape::BitCrush | CommandShape::Distortion => DeviceSlot::TrackFx,
            CommandShape::Echo => DeviceSlot::Echo,
            CommandShape::Flanger => DeviceSlot::Flanger,
            CommandShape::Compressor => DeviceSlot::Compressor,
            CommandShape::Phaser => DeviceSlot::Phaser,
        }
    }
}

/// Every effect kind in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum EffectKind {
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
    Allpass,
    Peaking,
    Lowshelf,
    Highshelf,
    Resonant,
    Echo,
    Delay,
    Bitcrusher,
    Distortion,
    Compressor,
    Flanger,
    Phaser,
}

/// Describes an effect kind for listings.
#[derive(Debug, Clone)]
pub struct EffectDescriptor {
    /// The kind described.
    pub kind: EffectKind,
    /// Unique identifier (lowercase, no spaces).
    pub id: &'static str,
    /// Display label.
    pub name: &'static str,
    /// Brief description.
    pub description: &'static str,
    /// Category for organization.
    pub category: EffectCategory,
    /// Number of parameters.
    pub param_count: usize,
}

const RES: ParamDescriptor = ParamDescriptor::resonance("Res", 0.707, 0.01);
const Q: ParamDescriptor = ParamDescriptor::resonance("Q", 1.0, 0.01);

static LOWPASS_PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::frequency("Cutoff", "Cutoff", 100.0, 16000.0, 1000.0),
    RES,
];
static BANDPASS_PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::frequency("Cutoff", "Cutoff", 100.0, 16000.0, 1000.0),
    Q,
];
static NOTCH_PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::frequency("Cutoff", "Cutoff", 100.0, 16000.0, 800.0),
    Q,
];
static ALLPASS_PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::frequency("Freq", "Freq", 100.0, 16000.0, 1000.0),
    ParamDescriptor::resonance("Q", 0.707, 0.01),
];
static PEAKING_PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::frequency("Freq", "Freq", 100.0, 16000.0, 1000.0),
    Q,
    ParamDescriptor::gain_db(6.0),
];
static LOWSHELF_PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::frequency("Freq", "Freq", 100.0, 5000.0, 200.0),
    ParamDescriptor::gain_db(6.0),
];
static HIGHSHELF_PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::frequency("Freq", "Freq", 200.0, 16000.0, 8000.0),
    ParamDescriptor::gain_db(6.0),
];
static RESONANT_PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::frequency("Cutoff", "Cutoff", 100.0, 16000.0, 800.0),
    ParamDescriptor::resonance("Res", 5.0, 0.1),
];

const MIX: ParamDescriptor = ParamDescriptor::percent("mix", "Mix", "Mix", 100.0, 50.0);

static ECHO_PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::time_ms(10.0, 200.0, 100.0),
    ParamDescriptor::percent("feedback", "Feedback", "Fdbk", 95.0, 40.0),
    MIX,
];
static DELAY_PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::time_ms(10.0, 200.0, 100.0),
    ParamDescriptor::percent("feedback", "Feedback", "Fdbk", 95.0, 50.0),
    MIX,
];
static BITCRUSHER_PARAMS: [ParamDescriptor; 1] = [ParamDescriptor::percent(
    "bits",
    "Bit Depth",
    "Bits",
    16.0,
    8.0,
)
.with_range(1.0, 16.0, 8.0)
.with_unit(ParamUnit::Bits)
.with_device(DeviceScale::Round)];

/// Distortion curve labels, indexed by the `mode` parameter.
pub static DISTORTION_MODES: &[&str] = &["SOFT", "HARD", "TUBE", "FUZZ"];

static DISTORTION_PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::percent("amount", "Amount", "Amount", 100.0, 50.0),
    ParamDescriptor::select("mode", "Mode", DISTORTION_MODES, 0.0),
];
static COMPRESSOR_PARAMS: [ParamDescriptor; 2] = [
    ParamDescriptor::percent("threshold", "Threshold", "Thresh", 100.0, 60.0)
        .with_device(DeviceScale::Linear { lo: -60.0, hi: 0.0 }),
    ParamDescriptor::percent("ratio", "Ratio", "Ratio", 20.0, 4.0)
        .with_range(1.0, 20.0, 4.0)
        .with_step(0.5)
        .with_unit(ParamUnit::Ratio),
];
static MODULATION_PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::percent("rate", "Rate", "Rate", 100.0, 30.0),
    ParamDescriptor::percent("depth", "Depth", "Depth", 100.0, 50.0),
    ParamDescriptor::percent("feedback", "Feedback", "Fdbk", 90.0, 40.0),
];

impl EffectKind {
    /// All kinds in catalog order.
    pub const ALL: [EffectKind; 16] = [
        EffectKind::Lowpass,
        EffectKind::Highpass,
        EffectKind::Bandpass,
        EffectKind::Notch,
        EffectKind::Allpass,
        EffectKind::Peaking,
        EffectKind::Lowshelf,
        EffectKind::Highshelf,
        EffectKind::Resonant,
        EffectKind::Echo,
        EffectKind::Delay,
        EffectKind::Bitcrusher,
        EffectKind::Distortion,
        EffectKind::Compressor,
        EffectKind::Flanger,
        EffectKind::Phaser,
    ];

    /// Catalog identifier, as used in saved scenes and presets.
    pub const fn id(self) -> &'static str {
        match self {
            EffectKind::Lowpass => "lowpass",
            EffectKind::Highpass => "highpass",
            EffectKind::Bandpass => "bandpass",
            EffectKind::Notch => "notch",
            EffectKind::Allpass => "allpass",
            EffectKind::Peaking => "peaking",
            EffectKind::Lowshelf => "lowshelf",
            EffectKind::Highshelf => "highshelf",
            EffectKind::Resonant => "resonant",
            EffectKind::Echo => "echo",
            EffectKind::Delay => "delay",
            EffectKind::Bitcrusher => "bitcrusher",
            EffectKind::Distortion => "distortion",
            EffectKind::Compressor => "compressor",
            EffectKind::Flanger => "flanger",
            EffectKind::Phaser => "phaser",
        }
    }

    /// Looks up a kind by catalog identifier (case-insensitive).
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.id().eq_ignore_ascii_case(id))
    }

    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            EffectKind::Lowpass => "LOW PASS",
            EffectKind::Highpass => "HI PASS",
            EffectKind::Bandpass => "BAND PASS",
            EffectKind::Notch => "NOTCH",
            EffectKind::Allpass => "ALL PASS",
            EffectKind::Peaking => "PEAKING",
            EffectKind::Lowshelf => "LO SHELF",
            EffectKind::Highshelf => "HI SHELF",
            EffectKind::Resonant => "RESONANT",
            EffectKind::Echo => "REVERB",
            EffectKind::Delay => "DELAY",
            EffectKind::Bitcrusher => "BITCRUSHER",
            EffectKind::Distortion => "DISTORTION",
            EffectKind::Compressor => "COMPRESSOR",
            EffectKind::Flanger => "FLANGER",
            EffectKind::Phaser => "PHASER",
        }
    }

    /// Brief description.
    pub const fn description(self) -> &'static str {
        match self {
            EffectKind::Lowpass => "Resonant low-pass filter",
            EffectKind::Highpass => "Resonant high-pass filter",
            EffectKind::Bandpass => "Band-pass filter with adjustable Q",
            EffectKind::Notch => "Notch (band-reject) filter",
            EffectKind::Allpass => "All-pass phase shifter",
            EffectKind::Peaking => "Peaking EQ band with boost/cut",
            EffectKind::Lowshelf => "Low shelf boost/cut",
            EffectKind::Highshelf => "High shelf boost/cut",
            EffectKind::Resonant => "High-resonance low-pass for acid sweeps",
            EffectKind::Echo => "Short reverb-style echo",
            EffectKind::Delay => "Feedback delay",
            EffectKind::Bitcrusher => "Bit depth reduction",
            EffectKind::Distortion => "Waveshaping distortion with four curves",
            EffectKind::Compressor => "Per-channel compressor",
            EffectKind::Flanger => "Per-channel flanger",
            EffectKind::Phaser => "Master-bus phaser, shared by every channel",
        }
    }

    /// Category for organization.
    pub const fn category(self) -> EffectCategory {
        match self {
            EffectKind::Lowpass
            | EffectKind::Highpass
            | EffectKind::Bandpass
            | EffectKind::Notch
            | EffectKind::Allpass
            | EffectKind::Peaking
            | EffectKind::Lowshelf
            | EffectKind::Highshelf
            | EffectKind::Resonant => EffectCategory::Filter,
            EffectKind::Echo | EffectKind::Delay => EffectCategory::TimeBased,
            EffectKind::Bitcrusher | EffectKind::Distortion => EffectCategory::Distortion,
            EffectKind::Compressor => EffectCategory::Dynamics,
            EffectKind::Flanger | EffectKind::Phaser => EffectCategory::Modulation,
        }
    }

    /// Display colour, also used for cables leaving nodes of this kind.
    pub const fn color(self) -> NamedColor {
        match self {
            EffectKind::Lowpass | EffectKind::Highpass => NamedColor::Cyan,
            EffectKind::Bandpass => NamedColor::Blue,
            EffectKind::Notch => NamedColor::Silver,
            EffectKind::Allpass => NamedColor::Slate,
            EffectKind::Peaking => NamedColor::Amber,
            EffectKind::Lowshelf => NamedColor::Lime,
            EffectKind::Highshelf => NamedColor::Lavender,
            EffectKind::Resonant => NamedColor::Hotpink,
            EffectKind::Echo => NamedColor::Orange,
            EffectKind::Delay => NamedColor::Yellow,
            EffectKind::Bitcrusher => NamedColor::Purple,
            EffectKind::Distortion => NamedColor::Pink,
            EffectKind::Compressor => NamedColor::Green,
            EffectKind::Flanger => NamedColor::Teal,
            EffectKind::Phaser => NamedColor::Violet,
        }
    }

    /// Parameter table, in index order.
    pub fn params(self) -> &'static [ParamDescriptor] {
        match self {
            EffectKind::Lowpass | EffectKind::Highpass => &LOWPASS_PARAMS,
            EffectKind::Bandpass => &BANDPASS_PARAMS,
            EffectKind::Notch => &NOTCH_PARAMS,
            EffectKind::Allpass => &ALLPASS_PARAMS,
            EffectKind::Peaking => &PEAKING_PARAMS,
            EffectKind::Lowshelf => &LOWSHELF_PARAMS,
            EffectKind::Highshelf => &HIGHSHELF_PARAMS,
            EffectKind::Resonant => &RESONANT_PARAMS,
            EffectKind::Echo => &ECHO_PARAMS,
            EffectKind::Delay => &DELAY_PARAMS,
            EffectKind::Bitcrusher => &BITCRUSHER_PARAMS,
            EffectKind::Distortion => &DISTORTION_PARAMS,
            EffectKind::Compressor => &COMPRESSOR_PARAMS,
            EffectKind::Flanger | EffectKind::Phaser => &MODULATION_PARAMS,
        }
    }

    /// Finds a parameter descriptor by key.
    pub fn param(self, key: &str) -> Option<&'static ParamDescriptor> {
        self.params().iter().find(|d| d.key == key)
    }

    /// The device command family for this kind.
    pub const fn command_shape(self) -> CommandShape {
        match self {
            EffectKind::Lowpass => CommandShape::Filter { code: 1, with_gain: false },
            EffectKind::Highpass => CommandShape::Filter { code: 2, with_gain: false },
            EffectKind::Bandpass => CommandShape::Filter { code: 3, with_gain: false },
            EffectKind::Notch => CommandShape::Filter { code: 4, with_gain: false },
            EffectKind::Allpass => CommandShape::Filter { code: 5, with_gain: false },
            EffectKind::Peaking => CommandShape::Filter { code: 6, with_gain: true },
            EffectKind::Lowshelf => CommandShape::Filter { code: 7, with_gain: true },
            EffectKind::Highshelf => CommandShape::Filter { code: 8, with_gain: true },
            EffectKind::Resonant => CommandShape::Filter { code: 9, with_gain: false },
            EffectKind::Echo | EffectKind::Delay => CommandShape::Echo,
            EffectKind::Bitcrusher => CommandShape::BitCrush,
            EffectKind::Distortion => CommandShape::Distortion,
            EffectKind::Compressor => CommandShape::Compressor,
            EffectKind::Flanger => CommandShape::Flanger,
            EffectKind::Phaser => CommandShape::Phaser,
        }
    }

    /// Looks up the filter kind for a device filter type code.
    pub fn from_filter_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| {
            matches!(k.command_shape(), CommandShape::Filter { code: c, .. } if c == code)
        })
    }

    /// Whether the device runs this kind per channel or once globally.
    pub const fn scope(self) -> EffectScope {
        match self {
            EffectKind::Phaser => EffectScope::Global,
            _ => EffectScope::PerChannel,
        }
    }

    /// The device slot this kind occupies.
    pub const fn slot(self) -> DeviceSlot {
        self.command_shape().slot()
    }

    /// Listing metadata.
    pub fn descriptor(self) -> EffectDescriptor {
        EffectDescriptor {
            kind: self,
            id: self.id(),
            name: self.label(),
            description: self.description(),
            category: self.category(),
            param_count: self.params().len(),
        }
    }
}

impl core::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(EffectKind::from_id("LOWPASS"), Some(EffectKind::Lowpass));
        assert_eq!(EffectKind::from_id("reverb"), None);
    }

    #[test]
    fn defaults_lie_within_range() {
        for kind in EffectKind::ALL {
            for desc in kind.params() {
                assert!(desc.min <= desc.default && desc.default <= desc.max, "{kind}.{}", desc.key);
            }
        }
    }

    #[test]
    fn filter_codes_are_unique_and_reversible() {
        for code in 1..=9 {
            let kind = EffectKind::from_filter_code(code).expect("code maps to a filter");
            assert_eq!(kind.category(), EffectCategory::Filter);
        }
        assert_eq!(EffectKind::from_filter_code(0), None);
        assert_eq!(EffectKind::from_filter_code(10), None);
    }

    #[test]
    fn shared_slots() {
        assert_eq!(EffectKind::Echo.slot(), EffectKind::Delay.slot());
        assert_eq!(EffectKind::Bitcrusher.slot(), EffectKind::Distortion.slot());
        assert_ne!(EffectKind::Flanger.slot(), EffectKind::Phaser.slot());
    }

    #[test]
    fn only_phaser_is_global() {
        let globals: Vec<_> = EffectKind::ALL
            .iter()
            .filter(|k| k.scope() == EffectScope::Global)
            .collect();
        assert_eq!(globals, vec![&EffectKind::Phaser]);
    }

    #[test]
    fn shelves_carry_no_resonance() {
        assert!(EffectKind::Lowshelf.param("resonance").is_none());
        assert!(EffectKind::Peaking.param("resonance").is_some());
        assert_eq!(EffectKind::Highshelf.param("cutoff").map(|d| d.min), Some(200.0));
    }
}
