//! Display colours for nodes and cables.
//!
//! Cable colour is always derived from the node a cable leaves: sources use the
//! per-channel palette, effects use their catalog colour, buses carry their own.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 24-bit RGB colour, serialized as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    /// Builds a colour from a packed `0xRRGGBB` value.
    pub const fn rgb(packed: u32) -> Self {
        Self(packed & 0x00ff_ffff)
    }

    /// Returns the packed `0xRRGGBB` value.
    pub const fn packed(self) -> u32 {
        self.0
    }

    /// Colour used for cables leaving the master output (never drawn in practice).
    pub const MASTER: Self = Self::rgb(0xffd700);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Error returned when parsing a colour that is not `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid colour '{0}', expected #rrggbb")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err(ParseColorError(s.to_string()));
        }
        u32::from_str_radix(hex, 16)
            .map(Self::rgb)
            .map_err(|_| ParseColorError(s.to_string()))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-channel source colours, indexed by channel.
pub const CHANNEL_PALETTE: [Color; 16] = [
    Color::rgb(0xff2d2d),
    Color::rgb(0xff6b35),
    Color::rgb(0xffa726),
    Color::rgb(0xffd600),
    Color::rgb(0xc6ff00),
    Color::rgb(0x69f0ae),
    Color::rgb(0x26c6da),
    Color::rgb(0x448aff),
    Color::rgb(0x7c4dff),
    Color::rgb(0xea80fc),
    Color::rgb(0xff4081),
    Color::rgb(0xf50057),
    Color::rgb(0xff1744),
    Color::rgb(0xd500f9),
    Color::rgb(0x651fff),
    Color::rgb(0x00e676),
];

/// Returns the palette colour for a channel, wrapping past the palette length.
pub fn channel_color(channel: u8) -> Color {
    CHANNEL_PALETTE[channel as usize % CHANNEL_PALETTE.len()]
}

/// Named colours used by the effect catalog and buses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum NamedColor {
    Cyan,
    Orange,
    Yellow,
    Purple,
    Pink,
    Green,
    Teal,
    Violet,
    Blue,
    Gold,
    Silver,
    Slate,
    Amber,
    Lime,
    Lavender,
    Hotpink,
}

impl NamedColor {
    /// Resolves the name to its RGB value.
    pub const fn color(self) -> Color {
        match self {
            Self::Cyan => Color::rgb(0x00e5ff),
            Self::Orange => Color::rgb(0xff9100),
            Self::Yellow => Color::rgb(0xffd600),
            Self::Purple => Color::rgb(0xb388ff),
            Self::Pink => Color::rgb(0xff4081),
            Self::Green => Color::rgb(0x69f0ae),
            Self::Teal => Color::rgb(0x26c6da),
            Self::Violet => Color::rgb(0xea80fc),
            Self::Blue => Color::rgb(0x448aff),
            Self::Gold => Color::rgb(0xffd700),
            Self::Silver => Color::rgb(0xaab0c0),
            Self::Slate => Color::rgb(0x78909c),
            Self::Amber => Color::rgb(0xffab40),
            Self::Lime => Color::rgb(0xc6ff00),
            Self::Lavender => Color::rgb(0xce93d8),
            Self::Hotpink => Color::rgb(0xf06292),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        let c = Color::rgb(0x00e5ff);
        assert_eq!(c.to_string(), "#00e5ff");
        assert_eq!("#00e5ff".parse::<Color>().unwrap(), c);
        assert_eq!("00E5FF".parse::<Color>().unwrap(), c);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("#12345".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn channel_color_wraps() {
        assert_eq!(channel_color(0), CHANNEL_PALETTE[0]);
        assert_eq!(channel_color(17), CHANNEL_PALETTE[1]);
    }

    #[test]
    fn serde_uses_hex_string() {
        let json = serde_json::to_string(&Color::rgb(0xff2d2d)).unwrap();
        assert_eq!(json, "\"#ff2d2d\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(0xff2d2d));
    }
}
