//! Typed parameter records for effect nodes.
//!
//! [`EffectParams`] is a tagged union with one variant per [`EffectKind`]; kinds
//! that share a parameter layout share a record type. Values are always kept
//! inside the ranges declared by the catalog: numeric fields clamp, enumerated
//! fields reject anything that does not name a choice.

use serde::{Deserialize, Serialize};

use crate::catalog::EffectKind;
use crate::param_info::{ParamDescriptor, ParameterInfo};

/// Errors from setting a parameter by name.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    /// The effect has no parameter with this name.
    #[error("effect '{kind}' has no parameter '{name}'")]
    UnknownParam {
        /// Effect kind addressed.
        kind: EffectKind,
        /// Name that was not found.
        name: String,
    },
    /// An enumerated parameter was given a value that is not a choice index.
    #[error("{value} is not a valid choice for '{param}'")]
    OutOfRange {
        /// Parameter key.
        param: &'static str,
        /// Rejected value.
        value: f32,
    },
}

/// Cutoff and resonance, for the plain biquad filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Cutoff or centre frequency in Hz.
    pub cutoff: f32,
    /// Resonance / Q.
    pub resonance: f32,
}

/// Peaking EQ band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakingParams {
    /// Centre frequency in Hz.
    pub cutoff: f32,
    /// Q.
    pub resonance: f32,
    /// Boost/cut in dB.
    pub gain: f32,
}

/// Shelving EQ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShelfParams {
    /// Corner frequency in Hz.
    pub cutoff: f32,
    /// Boost/cut in dB.
    pub gain: f32,
}

/// Echo and delay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EchoParams {
    /// Delay time in ms.
    pub time: f32,
    /// Feedback in percent.
    pub feedback: f32,
    /// Wet mix in percent.
    pub mix: f32,
}

/// Bit reduction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitCrusherParams {
    /// Output bit depth.
    pub bits: f32,
}

/// Distortion curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum DistortionMode {
    #[default]
    Soft,
    Hard,
    Tube,
    Fuzz,
}

impl DistortionMode {
    /// Device index of the curve.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Looks up a curve by device index.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Soft),
            1 => Some(Self::Hard),
            2 => Some(Self::Tube),
            3 => Some(Self::Fuzz),
            _ => None,
        }
    }
}

/// Waveshaping distortion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistortionParams {
    /// Drive amount in percent.
    pub amount: f32,
    /// Curve selection.
    pub mode: DistortionMode,
}

/// Compressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorParams {
    /// Threshold in percent of the device range.
    pub threshold: f32,
    /// Ratio (n:1).
    pub ratio: f32,
}

/// Flanger and phaser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModulationParams {
    /// LFO rate in percent.
    pub rate: f32,
    /// Modulation depth in percent.
    pub depth: f32,
    /// Feedback in percent.
    pub feedback: f32,
}

/// Parameters of an effect node, tagged by kind.
///
/// ```rust
/// use patchbay_core::{EffectKind, EffectParams, FilterParams};
///
/// let mut p = EffectParams::defaults(EffectKind::Lowpass);
/// assert_eq!(p, EffectParams::Lowpass(FilterParams { cutoff: 1000.0, resonance: 0.707 }));
///
/// assert_eq!(p.set_named("cutoff", 50_000.0), Ok(16000.0));
/// assert!(p.set_named("mode", 1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum EffectParams {
    Lowpass(FilterParams),
    Highpass(FilterParams),
    Bandpass(FilterParams),
    Notch(FilterParams),
    Allpass(FilterParams),
    Peaking(PeakingParams),
    Lowshelf(ShelfParams),
    Highshelf(ShelfParams),
    Resonant(FilterParams),
    Echo(EchoParams),
    Delay(EchoParams),
    Bitcrusher(BitCrusherParams),
    Distortion(DistortionParams),
    Compressor(CompressorParams),
    Flanger(ModulationParams),
    Phaser(ModulationParams),
}

impl EffectParams {
    /// Returns the catalog defaults for a kind.
    pub fn defaults(kind: EffectKind) -> Self {
        let d = |key: &str| kind.param(key).map_or(0.0, |p| p.default);
        let filter = || FilterParams {
            cutoff: d("cutoff"),
            resonance: d("resonance"),
        };
        let shelf = || ShelfParams {
            cutoff: d("cutoff"),
            gain: d("gain"),
        };
        let echo = || EchoParams {
            time: d("time"),
            feedback: d("feedback"),
            mix: d("mix"),
        };
        let modulation = || ModulationParams {
            rate: d("rate"),
            depth: d("depth"),
            feedback: d("feedback"),
        };
        match kind {
            EffectKind::Lowpass => Self::Lowpass(filter()),
            EffectKind::Highpass => Self::Highpass(filter()),
            EffectKind::Bandpass => Self::Bandpass(filter()),
            EffectKind::Notch => Self::Notch(filter()),
            EffectKind::Allpass => Self::Allpass(filter()),
            EffectKind::Resonant => Self::Resonant(filter()),
            EffectKind::Peaking => Self::Peaking(PeakingParams {
                cutoff: d("cutoff"),
                resonance: d("resonance"),
                gain: d("gain"),
            }),
            EffectKind::Lowshelf => Self::Lowshelf(shelf()),
            EffectKind::Highshelf => Self::Highshelf(shelf()),
            EffectKind::Echo => Self::Echo(echo()),
            EffectKind::Delay => Self::Delay(echo()),
            EffectKind::Bitcrusher => Self::Bitcrusher(BitCrusherParams { bits: d("bits") }),
            EffectKind::Distortion => Self::Distortion(DistortionParams {
                amount: d("amount"),
                mode: DistortionMode::default(),
            }),
            EffectKind::Compressor => Self::Compressor(CompressorParams {
                threshold: d("threshold"),
                ratio: d("ratio"),
            }),
            EffectKind::Flanger => Self::Flanger(modulation()),
            EffectKind::Phaser => Self::Phaser(modulation()),
        }
    }

    /// The kind these parameters belong to.
    pub const fn kind(&self) -> EffectKind {
        match self {
            Self::Lowpass(_) => EffectKind::Lowpass,
            Self::Highpass(_) => EffectKind::Highpass,
            Self::Bandpass(_) => EffectKind::Bandpass,
            Self::Notch(_) => EffectKind::Notch,
            Self::Allpass(_) => EffectKind::Allpass,
            Self::Peaking(_) => EffectKind::Peaking,
            Self::Lowshelf(_) => EffectKind::Lowshelf,
            Self::Highshelf(_) => EffectKind::Highshelf,
            Self::Resonant(_) => EffectKind::Resonant,
            Self::Echo(_) => EffectKind::Echo,
            Self::Delay(_) => EffectKind::Delay,
            Self::Bitcrusher(_) => EffectKind::Bitcrusher,
            Self::Distortion(_) => EffectKind::Distortion,
            Self::Compressor(_) => EffectKind::Compressor,
            Self::Flanger(_) => EffectKind::Flanger,
            Self::Phaser(_) => EffectKind::Phaser,
        }
    }

    /// Sets a parameter by key or name and returns the value actually applied.
    ///
    /// Numeric parameters clamp to their range. Enumerated parameters accept
    /// only an integral index naming one of their choices.
    pub fn set_named(&mut self, name: &str, value: f32) -> Result<f32, ParamError> {
        let index = self
            .find_param_by_name(name)
            .ok_or_else(|| ParamError::UnknownParam {
                kind: self.kind(),
                name: name.to_string(),
            })?;
        let desc = self.descriptor(index);
        if desc.is_enumerated() && desc.choice_label(value).is_none() {
            return Err(ParamError::OutOfRange {
                param: desc.key,
                value,
            });
        }
        self.set_param(index, value);
        Ok(self.get_param(index))
    }

    /// Reads a parameter by key.
    pub fn get_named(&self, key: &str) -> Option<f32> {
        self.find_param_by_name(key).map(|i| self.get_param(i))
    }

    /// Returns `(key, value)` pairs in parameter order.
    pub fn values(&self) -> Vec<(&'static str, f32)> {
        self.kind()
            .params()
            .iter()
            .enumerate()
            .map(|(i, desc)| (desc.key, self.get_param(i)))
            .collect()
    }

    /// Re-clamps every field, e.g. after deserializing untrusted data.
    pub fn sanitize(&mut self) {
        for i in 0..self.param_count() {
            let value = self.get_param(i);
            self.set_param(i, value);
        }
    }

    fn descriptor(&self, index: usize) -> &'static ParamDescriptor {
        &self.kind().params()[index]
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut f32> {
        match (self, index) {
            (
                Self::Lowpass(p)
                | Self::Highpass(p)
                | Self::Bandpass(p)
                | Self::Notch(p)
                | Self::Allpass(p)
                | Self::Resonant(p),
                i,
            ) => match i {
                0 => Some(&mut p.cutoff),
                1 => Some(&mut p.resonance),
                _ => None,
            },
            (Self::Peaking(p), i) => match i {
                0 => Some(&mut p.cutoff),
                1 => Some(&mut p.resonance),
                2 => Some(&mut p.gain),
                _ => None,
            },
            (Self::Lowshelf(p) | Self::Highshelf(p), i) => match i {
                0 => Some(&mut p.cutoff),
                1 => Some(&mut p.gain),
                _ => None,
            },
            (Self::Echo(p) | Self::Delay(p), i) => match i {
                0 => Some(&mut p.time),
                1 => Some(&mut p.feedback),
                2 => Some(&mut p.mix),
                _ => None,
            },
            (Self::Bitcrusher(p), 0) => Some(&mut p.bits),
            (Self::Distortion(p), 0) => Some(&mut p.amount),
            (Self::Compressor(p), i) => match i {
                0 => Some(&mut p.threshold),
                1 => Some(&mut p.ratio),
                _ => None,
            },
            (Self::Flanger(p) | Self::Phaser(p), i) => match i {
                0 => Some(&mut p.rate),
                1 => Some(&mut p.depth),
                2 => Some(&mut p.feedback),
                _ => None,
            },
            _ => None,
        }
    }
}

impl ParameterInfo for EffectParams {
    fn param_count(&self) -> usize {
        self.kind().params().len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        self.kind().params().get(index).copied()
    }

    fn get_param(&self, index: usize) -> f32 {
        if let (Self::Distortion(p), 1) = (self, index) {
            return f32::from(p.mode.index());
        }
        // field_mut needs &mut; copy out of a scratch value instead.
        let mut scratch = *self;
        scratch.field_mut(index).map_or(0.0, |v| *v)
    }

    fn set_param(&mut self, index: usize, value: f32) {
        let Some(desc) = self.param_info(index) else {
            return;
        };
        if let (Self::Distortion(p), 1) = (&mut *self, index) {
            let idx = desc.clamp(value).round() as u8;
            p.mode = DistortionMode::from_index(idx).unwrap_or_default();
            return;
        }
        if let Some(field) = self.field_mut(index) {
            *field = desc.clamp(value);
        }
    }
}
