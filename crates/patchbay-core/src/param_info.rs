//! Parameter introspection for effect nodes.
//!
//! Every effect kind declares its parameters as a static table of
//! [`ParamDescriptor`]s. The descriptor carries everything the rest of the
//! system needs: display metadata, the valid range and default, the
//! normalization curve for UI controls, and the [`DeviceScale`] that converts
//! the operator-facing value into the value the device expects.
//!
//! # Example
//!
//! ```rust
//! use patchbay_core::{EffectKind, EffectParams, ParameterInfo};
//!
//! let mut params = EffectParams::defaults(EffectKind::Compressor);
//! let idx = params.find_param_by_name("threshold").unwrap();
//! params.set_param(idx, 150.0);
//! assert_eq!(params.get_param(idx), 100.0);
//!
//! // 100 % maps to 0 dB on the device.
//! let desc = params.param_info(idx).unwrap();
//! assert_eq!(desc.to_device(params.get_param(idx)), 0.0);
//! ```

/// Scaling curve for parameter normalization.
///
/// Determines how a parameter's plain value maps to normalized \[0.0, 1.0\] space.
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamScale {
    /// Linear mapping (default).
    #[default]
    Linear,
    /// Logarithmic mapping, for frequency parameters. Requires `min > 0.0`.
    Logarithmic,
}

/// Conversion from the operator-facing value to the value sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DeviceScale {
    /// The device takes the value unchanged.
    #[default]
    AsIs,
    /// The device takes the value rounded to the nearest integer.
    Round,
    /// The descriptor range `[min, max]` maps linearly onto `[lo, hi]`.
    Linear {
        /// Device value at the descriptor minimum.
        lo: f32,
        /// Device value at the descriptor maximum.
        hi: f32,
    },
}

/// Trait for values that expose introspectable parameters.
///
/// Parameters are accessed by zero-based index; the index is stable for the
/// lifetime of the value. Implementations clamp on [`set_param`](Self::set_param).
pub trait ParameterInfo {
    /// Returns the number of parameters exposed.
    fn param_count(&self) -> usize;

    /// Returns the descriptor for the parameter at `index`, or `None` past the end.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Gets the current value of the parameter at `index` (`0.0` past the end).
    fn get_param(&self, index: usize) -> f32;

    /// Sets the parameter at `index`, clamped to the descriptor range.
    /// Out-of-bounds indices are ignored.
    fn set_param(&mut self, index: usize, value: f32);

    /// Finds a parameter index by key, name, or short name (case-insensitive).
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i).is_some_and(|desc| {
                desc.key.eq_ignore_ascii_case(name)
                    || desc.name.eq_ignore_ascii_case(name)
                    || desc.short_name.eq_ignore_ascii_case(name)
            })
        })
    }
}

/// Describes a single parameter's metadata for display, validation, and device output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Stable key used in saved scenes and device commands (e.g. `"cutoff"`).
    pub key: &'static str,
    /// Full name for display (e.g. "Cutoff", "Bit Depth").
    pub name: &'static str,
    /// Short name for compact displays, 8 characters or fewer.
    pub short_name: &'static str,
    /// Unit type for formatting the value.
    pub unit: ParamUnit,
    /// Minimum valid value.
    pub min: f32,
    /// Maximum valid value.
    pub max: f32,
    /// Default value.
    pub default: f32,
    /// Recommended control increment.
    pub step: f32,
    /// Normalization curve for UI controls.
    pub scale: ParamScale,
    /// Labels for enumerated parameters; empty for numeric ones.
    ///
    /// An enumerated parameter stores the selected index as its value.
    pub choices: &'static [&'static str],
    /// Conversion applied when the value is sent to the device.
    pub device: DeviceScale,
}

impl ParamDescriptor {
    /// A frequency in Hz on a logarithmic control.
    pub const fn frequency(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            key: "cutoff",
            name,
            short_name,
            unit: ParamUnit::Hertz,
            min,
            max,
            default,
            step: 1.0,
            scale: ParamScale::Logarithmic,
            choices: &[],
            device: DeviceScale::AsIs,
        }
    }

    /// Filter resonance / Q in the 0.5–20 range.
    pub const fn resonance(name: &'static str, default: f32, step: f32) -> Self {
        Self {
            key: "resonance",
            name,
            short_name: name,
            unit: ParamUnit::None,
            min: 0.5,
            max: 20.0,
            default,
            step,
            scale: ParamScale::Linear,
            choices: &[],
            device: DeviceScale::AsIs,
        }
    }

    /// Filter gain in dB, ±12.
    pub const fn gain_db(default: f32) -> Self {
        Self {
            key: "gain",
            name: "Gain",
            short_name: "Gain",
            unit: ParamUnit::Decibels,
            min: -12.0,
            max: 12.0,
            default,
            step: 0.5,
            scale: ParamScale::Linear,
            choices: &[],
            device: DeviceScale::AsIs,
        }
    }

    /// A time in milliseconds.
    pub const fn time_ms(min: f32, max: f32, default: f32) -> Self {
        Self {
            key: "time",
            name: "Time",
            short_name: "Time",
            unit: ParamUnit::Milliseconds,
            min,
            max,
            default,
            step: 1.0,
            scale: ParamScale::Linear,
            choices: &[],
            device: DeviceScale::AsIs,
        }
    }

    /// A percentage parameter in `0..=max`.
    pub const fn percent(
        key: &'static str,
        name: &'static str,
        short_name: &'static str,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            key,
            name,
            short_name,
            unit: ParamUnit::Percent,
            min: 0.0,
            max,
            default,
            step: 1.0,
            scale: ParamScale::Linear,
            choices: &[],
            device: DeviceScale::AsIs,
        }
    }

    /// An enumerated parameter selecting one of `choices` by index.
    pub const fn select(
        key: &'static str,
        name: &'static str,
        choices: &'static [&'static str],
        default: f32,
    ) -> Self {
        Self {
            key,
            name,
            short_name: name,
            unit: ParamUnit::None,
            min: 0.0,
            max: (choices.len() - 1) as f32,
            default,
            step: 1.0,
            scale: ParamScale::Linear,
            choices,
            device: DeviceScale::Round,
        }
    }

    /// Overrides the key.
    pub const fn with_key(mut self, key: &'static str) -> Self {
        self.key = key;
        self
    }

    /// Overrides the unit.
    pub const fn with_unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Overrides the range and default.
    pub const fn with_range(mut self, min: f32, max: f32, default: f32) -> Self {
        self.min = min;
        self.max = max;
        self.default = default;
        self
    }

    /// Overrides the step size.
    pub const fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Sets the conversion applied for the device.
    pub const fn with_device(mut self, device: DeviceScale) -> Self {
        self.device = device;
        self
    }

    /// Returns `true` for enumerated (select) parameters.
    #[inline]
    pub const fn is_enumerated(&self) -> bool {
        !self.choices.is_empty()
    }

    /// Returns the label of an enumerated value, if `value` names a choice.
    pub fn choice_label(&self, value: f32) -> Option<&'static str> {
        if value < 0.0 || value.fract() != 0.0 {
            return None;
        }
        self.choices.get(value as usize).copied()
    }

    /// Clamps a value to the valid range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Converts a plain value to normalized \[0.0, 1.0\] using the scale curve.
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                (value / self.min).ln() / (self.max / self.min).ln()
            }
        }
    }

    /// Converts a normalized \[0.0, 1.0\] value back to a plain value.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * (self.max / self.min).powf(normalized)
            }
        }
    }

    /// Converts a plain value into the value the device expects.
    pub fn to_device(&self, value: f32) -> f32 {
        match self.device {
            DeviceScale::AsIs => value,
            DeviceScale::Round => value.round(),
            DeviceScale::Linear { lo, hi } => {
                let range = self.max - self.min;
                if range == 0.0 {
                    return lo;
                }
                lo + (value - self.min) / range * (hi - lo)
            }
        }
    }

    /// Converts a device-reported value back into the plain range (clamped).
    pub fn from_device(&self, device_value: f32) -> f32 {
        let plain = match self.device {
            DeviceScale::AsIs | DeviceScale::Round => device_value,
            DeviceScale::Linear { lo, hi } => {
                if hi == lo {
                    self.min
                } else {
                    self.min + (device_value - lo) / (hi - lo) * (self.max - self.min)
                }
            }
        };
        self.clamp(plain)
    }

    /// Formats a value with its unit suffix, or the choice label for enumerations.
    pub fn format_value(&self, value: f32) -> String {
        if let Some(label) = self.choice_label(value) {
            return label.to_string();
        }
        if self.step >= 1.0 {
            format!("{value:.0}{}", self.unit.suffix())
        } else {
            format!("{value:.2}{}", self.unit.suffix())
        }
    }
}

/// Unit types for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels (dB).
    Decibels,
    /// Hertz (Hz).
    Hertz,
    /// Milliseconds (ms).
    Milliseconds,
    /// Percentage (%).
    Percent,
    /// Ratio (n:1), for compressor ratios.
    Ratio,
    /// Bit depth.
    Bits,
    /// No unit.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// ```rust
    /// use patchbay_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Hertz.suffix(), " Hz");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Percent => "%",
            ParamUnit::Ratio => ":1",
            ParamUnit::Bits => " bit",
            ParamUnit::None => "",
        }
    }
}
