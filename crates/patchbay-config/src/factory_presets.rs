//! Factory presets bundled with the patchbay.
//!
//! Built-in effect chains that are always available without external files.
//! Each expands to a scene through [`Preset::to_scene`].

use crate::Preset;

/// Identifiers of the built-in presets, in display order.
pub static FACTORY_PRESET_IDS: &[&str] = &[
    "tight-bus",
    "lofi-crunch",
    "space-wide",
    "dub-echo",
    "808-boom",
    "industrial",
    "techno-acid",
    "vinyl-warmth",
    "glitch-stutter",
    "ambient-wash",
    "hiphop-grit",
    "minimal-clean",
    "telephone",
    "flanger-sweep",
    "tape-saturation",
    "massive-reverb",
    "extreme-flanger",
    "cathedral",
    "robot-voice",
];

/// TOML content for factory presets.
///
/// These are embedded at compile time and always available.
static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("tight-bus", TIGHT_BUS_PRESET),
    ("lofi-crunch", LOFI_CRUNCH_PRESET),
    ("space-wide", SPACE_WIDE_PRESET),
    ("dub-echo", DUB_ECHO_PRESET),
    ("808-boom", BOOM_808_PRESET),
    ("industrial", INDUSTRIAL_PRESET),
    ("techno-acid", TECHNO_ACID_PRESET),
    ("vinyl-warmth", VINYL_WARMTH_PRESET),
    ("glitch-stutter", GLITCH_STUTTER_PRESET),
    ("ambient-wash", AMBIENT_WASH_PRESET),
    ("hiphop-grit", HIPHOP_GRIT_PRESET),
    ("minimal-clean", MINIMAL_CLEAN_PRESET),
    ("telephone", TELEPHONE_PRESET),
    ("flanger-sweep", FLANGER_SWEEP_PRESET),
    ("tape-saturation", TAPE_SATURATION_PRESET),
    ("massive-reverb", MASSIVE_REVERB_PRESET),
    ("extreme-flanger", EXTREME_FLANGER_PRESET),
    ("cathedral", CATHEDRAL_PRESET),
    ("robot-voice", ROBOT_VOICE_PRESET),
];

const TIGHT_BUS_PRESET: &str = r#"
id = "tight-bus"
name = "TIGHT BUS"
description = "Highpass into compressor: clean punch"

[[chain]]
key = "hpf"
effect = "highpass"
x = 760
y = 500
params = { cutoff = 55, resonance = 0.82 }

[[chain]]
key = "comp"
effect = "compressor"
x = 1120
y = 500
params = { threshold = 62, ratio = 5 }
"#;

const LOFI_CRUNCH_PRESET: &str = r#"
id = "lofi-crunch"
name = "LOFI CRUNCH"
description = "Bitcrusher, distortion and delay: dirty tape"

[[chain]]
key = "crush"
effect = "bitcrusher"
x = 720
y = 660
params = { bits = 7 }

[[chain]]
key = "dist"
effect = "distortion"
x = 1080
y = 780
params = { amount = 58, mode = 2 }

[[chain]]
key = "dly"
effect = "delay"
x = 1440
y = 660
params = { time = 200, feedback = 44, mix = 36 }
"#;

const SPACE_WIDE_PRESET: &str = r#"
id = "space-wide"
name = "SPACE WIDE"
description = "Bandpass, phaser, reverb and compressor: wide atmosphere"

[[chain]]
key = "bp"
effect = "bandpass"
x = 680
y = 440
params = { cutoff = 1450, resonance = 1.1 }

[[chain]]
key = "ph"
effect = "phaser"
x = 1020
y = 600
params = { rate = 34, depth = 62, feedback = 28 }

[[chain]]
key = "rv"
effect = "echo"
x = 1360
y = 440
params = { time = 200, feedback = 26, mix = 40 }

[[chain]]
key = "cp"
effect = "compressor"
x = 1700
y = 600
params = { threshold = 56, ratio = 3.5 }
"#;

const DUB_ECHO_PRESET: &str = r#"
id = "dub-echo"
name = "DUB ECHO"
description = "Long delay into reverb: dub echoes"

[[chain]]
key = "dly"
effect = "delay"
x = 720
y = 480
params = { time = 180, feedback = 72, mix = 55 }

[[chain]]
key = "rv"
effect = "echo"
x = 1100
y = 640
params = { time = 200, feedback = 50, mix = 45 }

[[chain]]
key = "lpf"
effect = "lowpass"
x = 1480
y = 480
params = { cutoff = 2200, resonance = 1.2 }
"#;

const BOOM_808_PRESET: &str = r#"
id = "808-boom"
name = "808 BOOM"
description = "Low shelf boost into compressor: heavy sub"

[[chain]]
key = "ls"
effect = "lowshelf"
x = 780
y = 560
params = { cutoff = 120, gain = 9 }

[[chain]]
key = "comp"
effect = "compressor"
x = 1200
y = 420
params = { threshold = 45, ratio = 6 }
"#;

const INDUSTRIAL_PRESET: &str = r#"
id = "industrial"
name = "INDUSTRIAL"
description = "Heavy distortion and bitcrusher: aggressive"

[[chain]]
key = "dist"
effect = "distortion"
x = 700
y = 700
params = { amount = 82, mode = 3 }

[[chain]]
key = "crush"
effect = "bitcrusher"
x = 1100
y = 500
params = { bits = 4 }

[[chain]]
key = "hpf"
effect = "highpass"
x = 1500
y = 700
params = { cutoff = 200, resonance = 1.5 }
"#;

const TECHNO_ACID_PRESET: &str = r#"
id = "techno-acid"
name = "TECHNO ACID"
description = "Resonant lowpass into distortion: acid line"

[[chain]]
key = "reso"
effect = "resonant"
x = 700
y = 520
params = { cutoff = 600, resonance = 12 }

[[chain]]
key = "dist"
effect = "distortion"
x = 1100
y = 680
params = { amount = 40, mode = 1 }

[[chain]]
key = "comp"
effect = "compressor"
x = 1500
y = 520
params = { threshold = 55, ratio = 4 }
"#;

const VINYL_WARMTH_PRESET: &str = r#"
id = "vinyl-warmth"
name = "VINYL WARMTH"
description = "Soft lowpass and light crush: analog warmth"

[[chain]]
key = "lpf"
effect = "lowpass"
x = 740
y = 600
params = { cutoff = 6500, resonance = 0.6 }

[[chain]]
key = "crush"
effect = "bitcrusher"
x = 1120
y = 440
params = { bits = 12 }

[[chain]]
key = "rv"
effect = "echo"
x = 1500
y = 600
params = { time = 80, feedback = 18, mix = 22 }
"#;

const GLITCH_STUTTER_PRESET: &str = r#"
id = "glitch-stutter"
name = "GLITCH STUTTER"
description = "Short delay, crusher and flanger: controlled chaos"

[[chain]]
key = "dly"
effect = "delay"
x = 680
y = 460
params = { time = 30, feedback = 65, mix = 60 }

[[chain]]
key = "crush"
effect = "bitcrusher"
x = 1080
y = 700
params = { bits = 6 }

[[chain]]
key = "fl"
effect = "flanger"
x = 1480
y = 460
params = { rate = 70, depth = 80, feedback = 55 }
"#;

const AMBIENT_WASH_PRESET: &str = r#"
id = "ambient-wash"
name = "AMBIENT WASH"
description = "Long reverb and slow phaser: ambient pad"

[[chain]]
key = "rv"
effect = "echo"
x = 720
y = 540
params = { time = 200, feedback = 60, mix = 65 }

[[chain]]
key = "ph"
effect = "phaser"
x = 1140
y = 380
params = { rate = 10, depth = 45, feedback = 20 }

[[chain]]
key = "lpf"
effect = "lowpass"
x = 1540
y = 540
params = { cutoff = 4000, resonance = 0.7 }
"#;

const HIPHOP_GRIT_PRESET: &str = r#"
id = "hiphop-grit"
name = "HIP-HOP GRIT"
description = "Mid peak, soft drive and compressor: gritty boom bap"

[[chain]]
key = "pk"
effect = "peaking"
x = 700
y = 640
params = { cutoff = 800, resonance = 2, gain = 4 }

[[chain]]
key = "dist"
effect = "distortion"
x = 1100
y = 480
params = { amount = 25, mode = 0 }

[[chain]]
key = "comp"
effect = "compressor"
x = 1500
y = 640
params = { threshold = 50, ratio = 7 }
"#;

const MINIMAL_CLEAN_PRESET: &str = r#"
id = "minimal-clean"
name = "MINIMAL CLEAN"
description = "Highpass, treble shelf and compressor: minimal clarity"

[[chain]]
key = "hpf"
effect = "highpass"
x = 760
y = 440
params = { cutoff = 150, resonance = 0.7 }

[[chain]]
key = "hs"
effect = "highshelf"
x = 1160
y = 580
params = { cutoff = 6000, gain = 3 }

[[chain]]
key = "comp"
effect = "compressor"
x = 1560
y = 440
params = { threshold = 65, ratio = 3 }
"#;

const TELEPHONE_PRESET: &str = r#"
id = "telephone"
name = "TELEPHONE"
description = "Narrow bandpass: telephone and radio"

[[chain]]
key = "bp"
effect = "bandpass"
x = 800
y = 520
params = { cutoff = 1800, resonance = 5 }

[[chain]]
key = "dist"
effect = "distortion"
x = 1240
y = 520
params = { amount = 15, mode = 0 }
"#;

const FLANGER_SWEEP_PRESET: &str = r#"
id = "flanger-sweep"
name = "FLANGER SWEEP"
description = "Deep flanger into delay: metallic sweep"

[[chain]]
key = "fl"
effect = "flanger"
x = 700
y = 500
params = { rate = 20, depth = 85, feedback = 65 }

[[chain]]
key = "dly"
effect = "delay"
x = 1100
y = 660
params = { time = 120, feedback = 35, mix = 40 }

[[chain]]
key = "comp"
effect = "compressor"
x = 1500
y = 500
params = { threshold = 58, ratio = 3.5 }
"#;

const TAPE_SATURATION_PRESET: &str = r#"
id = "tape-saturation"
name = "TAPE SATURATION"
description = "Soft drive, lowpass and compressor: tape saturation"

[[chain]]
key = "dist"
effect = "distortion"
x = 740
y = 580
params = { amount = 30, mode = 2 }

[[chain]]
key = "lpf"
effect = "lowpass"
x = 1140
y = 420
params = { cutoff = 8000, resonance = 0.5 }

[[chain]]
key = "comp"
effect = "compressor"
x = 1540
y = 580
params = { threshold = 55, ratio = 3 }
"#;

const MASSIVE_REVERB_PRESET: &str = r#"
id = "massive-reverb"
name = "⚡ MASSIVE REVERB"
description = "Reverb at maximum: endless wet tail"

[[chain]]
key = "rv"
effect = "echo"
x = 780
y = 500
params = { time = 200, feedback = 92, mix = 95 }

[[chain]]
key = "lpf"
effect = "lowpass"
x = 1260
y = 640
params = { cutoff = 3000, resonance = 1.5 }
"#;

const EXTREME_FLANGER_PRESET: &str = r#"
id = "extreme-flanger"
name = "⚡ EXTREME FLANGER"
description = "Flanger at maximum: jet engine"

[[chain]]
key = "fl"
effect = "flanger"
x = 1000
y = 520
params = { rate = 85, depth = 95, feedback = 88 }
"#;

const CATHEDRAL_PRESET: &str = r#"
id = "cathedral"
name = "⚡ CATHEDRAL"
description = "Double reverb and phaser: giant hall"

[[chain]]
key = "rv1"
effect = "echo"
x = 680
y = 440
params = { time = 200, feedback = 85, mix = 80 }

[[chain]]
key = "ph"
effect = "phaser"
x = 1100
y = 680
params = { rate = 8, depth = 70, feedback = 60 }

[[chain]]
key = "rv2"
effect = "echo"
x = 1520
y = 440
params = { time = 150, feedback = 70, mix = 75 }
"#;

const ROBOT_VOICE_PRESET: &str = r#"
id = "robot-voice"
name = "⚡ ROBOT VOICE"
description = "Extreme flanger, phaser and crusher: robot voice"

[[chain]]
key = "fl"
effect = "flanger"
x = 680
y = 660
params = { rate = 95, depth = 90, feedback = 85 }

[[chain]]
key = "ph"
effect = "phaser"
x = 1100
y = 440
params = { rate = 80, depth = 90, feedback = 75 }

[[chain]]
key = "crush"
effect = "bitcrusher"
x = 1520
y = 660
params = { bits = 5 }
"#;

/// Returns all factory presets.
///
/// # Example
///
/// ```rust
/// use patchbay_config::factory_presets::factory_presets;
///
/// for preset in factory_presets() {
///     println!("{}: {} effects", preset.name, preset.chain.len());
/// }
/// ```
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| Preset::from_toml(toml).ok())
        .collect()
}

/// Returns a factory preset by id or display name (case-insensitive).
///
/// # Example
///
/// ```rust
/// use patchbay_config::factory_presets::get_factory_preset;
///
/// let preset = get_factory_preset("dub-echo").unwrap();
/// assert_eq!(preset.name, "DUB ECHO");
/// ```
pub fn get_factory_preset(name: &str) -> Option<Preset> {
    let name_lower = name.to_lowercase();

    for (preset_id, toml) in FACTORY_PRESETS_TOML {
        if *preset_id == name_lower {
            return Preset::from_toml(toml).ok();
        }
    }

    factory_presets().into_iter().find(|p| {
        p.name.to_lowercase() == name_lower
            || p.name.trim_start_matches('⚡').trim().to_lowercase() == name_lower
    })
}

/// Returns `true` if `name` names a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}
