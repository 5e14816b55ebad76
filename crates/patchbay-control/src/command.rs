//! Device wire commands.
//!
//! Each command serializes to one flat JSON object whose `cmd` field names
//! the operation, e.g. `{"cmd":"setTrackFilter","track":0,"filterType":1,...}`.
//! Optional fields are omitted rather than sent as `null`.

use patchbay_core::ChannelIndex;
use serde::{Deserialize, Serialize};

/// A command understood by the device firmware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum DeviceCommand {
    /// Program the channel's filter slot.
    SetTrackFilter {
        /// Target channel.
        track: ChannelIndex,
        /// Device filter type code.
        #[serde(rename = "filterType")]
        filter_type: u8,
        /// Cutoff or centre frequency in Hz.
        cutoff: f32,
        /// Resonance / Q.
        resonance: f32,
        /// Gain in dB, for peaking and shelving filters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gain: Option<f32>,
    },
    /// Clear the channel's filter slot.
    ClearTrackFilter {
        /// Target channel.
        track: ChannelIndex,
    },
    /// Bit depth reduction on the channel's FX slot.
    SetTrackBitCrush {
        /// Target channel.
        track: ChannelIndex,
        /// Bit depth.
        value: u8,
    },
    /// Distortion on the channel's FX slot.
    SetTrackDistortion {
        /// Target channel.
        track: ChannelIndex,
        /// Drive amount, percent.
        amount: f32,
        /// Curve index.
        mode: u8,
    },
    /// Clear the channel's bitcrush/distortion slot.
    #[serde(rename = "clearTrackFX")]
    ClearTrackFx {
        /// Target channel.
        track: ChannelIndex,
    },
    /// Channel echo/delay.
    SetTrackEcho {
        /// Target channel.
        track: ChannelIndex,
        /// Enable flag.
        active: bool,
        /// Time in ms.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time: Option<f32>,
        /// Feedback, percent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback: Option<f32>,
        /// Wet mix, percent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mix: Option<f32>,
    },
    /// Channel flanger.
    SetTrackFlanger {
        /// Target channel.
        track: ChannelIndex,
        /// Enable flag.
        active: bool,
        /// Rate, percent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rate: Option<f32>,
        /// Depth, percent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depth: Option<f32>,
        /// Feedback, percent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback: Option<f32>,
    },
    /// Channel compressor.
    SetTrackCompressor {
        /// Target channel.
        track: ChannelIndex,
        /// Enable flag.
        active: bool,
        /// Threshold in dB.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
        /// Compression ratio.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ratio: Option<f32>,
    },
    /// Enable or disable the master phaser.
    SetPhaserActive {
        /// Enable flag.
        value: bool,
    },
    /// Master phaser rate.
    SetPhaserRate {
        /// Rate, percent.
        value: f32,
    },
    /// Master phaser depth.
    SetPhaserDepth {
        /// Depth, percent.
        value: f32,
    },
    /// Master phaser feedback.
    SetPhaserFeedback {
        /// Feedback, percent.
        value: f32,
    },
    /// Master filter cutoff.
    SetFilterCutoff {
        /// Cutoff in Hz.
        value: f32,
    },
    /// Enable or disable the master delay.
    SetDelayActive {
        /// Enable flag.
        value: bool,
    },
    /// Master delay wet mix.
    SetDelayMix {
        /// Mix, percent.
        value: f32,
    },
    /// Enable or disable the master compressor.
    SetCompressorActive {
        /// Enable flag.
        value: bool,
    },
    /// Master compressor threshold.
    SetCompressorThreshold {
        /// Threshold in dB.
        value: f32,
    },
    /// Sidechain ducking from one channel onto others.
    SetSidechainPro {
        /// Enable flag.
        active: bool,
        /// Trigger channel.
        source: ChannelIndex,
        /// Ducked channels.
        destinations: Vec<ChannelIndex>,
        /// Ducking amount, percent.
        amount: f32,
        /// Attack in ms.
        attack: f32,
        /// Release in ms.
        release: f32,
        /// Knee, 0..1.
        knee: f32,
    },
    /// Ask the device to report channel volumes.
    GetTrackVolumes,
}

impl DeviceCommand {
    /// Serializes to the wire payload.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a wire payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// The channel addressed, if any.
    pub fn track(&self) -> Option<ChannelIndex> {
        match self {
            Self::SetTrackFilter { track, .. }
            | Self::ClearTrackFilter { track }
            | Self::SetTrackBitCrush { track, .. }
            | Self::SetTrackDistortion { track, .. }
            | Self::ClearTrackFx { track }
            | Self::SetTrackEcho { track, .. }
            | Self::SetTrackFlanger { track, .. }
            | Self::SetTrackCompressor { track, .. } => Some(*track),
            Self::SetPhaserActive { .. }
            | Self::SetPhaserRate { .. }
            | Self::SetPhaserDepth { .. }
            | Self::SetPhaserFeedback { .. }
            | Self::SetFilterCutoff { .. }
            | Self::SetDelayActive { .. }
            | Self::SetDelayMix { .. }
            | Self::SetCompressorActive { .. }
            | Self::SetCompressorThreshold { .. }
            | Self::SetSidechainPro { .. }
            | Self::GetTrackVolumes => None,
        }
    }

    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetTrackFilter { .. } => "setTrackFilter",
            Self::ClearTrackFilter { .. } => "clearTrackFilter",
            Self::SetTrackBitCrush { .. } => "setTrackBitCrush",
            Self::SetTrackDistortion { .. } => "setTrackDistortion",
            Self::ClearTrackFx { .. } => "clearTrackFX",
            Self::SetTrackEcho { .. } => "setTrackEcho",
            Self::SetTrackFlanger { .. } => "setTrackFlanger",
            Self::SetTrackCompressor { .. } => "setTrackCompressor",
            Self::SetPhaserActive { .. } => "setPhaserActive",
            Self::SetPhaserRate { .. } => "setPhaserRate",
            Self::SetPhaserDepth { .. } => "setPhaserDepth",
            Self::SetPhaserFeedback { .. } => "setPhaserFeedback",
            Self::SetFilterCutoff { .. } => "setFilterCutoff",
            Self::SetDelayActive { .. } => "setDelayActive",
            Self::SetDelayMix { .. } => "setDelayMix",
            Self::SetCompressorActive { .. } => "setCompressorActive",
            Self::SetCompressorThreshold { .. } => "setCompressorThreshold",
            Self::SetSidechainPro { .. } => "setSidechainPro",
            Self::GetTrackVolumes => "getTrackVolumes",
        }
    }

    /// Returns `true` for commands that switch a processing slot off.
    pub fn is_deactivation(&self) -> bool {
        matches!(
            self,
            Self::ClearTrackFilter { .. }
                | Self::ClearTrackFx { .. }
                | Self::SetTrackEcho { active: false, .. }
                | Self::SetTrackFlanger { active: false, .. }
                | Self::SetTrackCompressor { active: false, .. }
                | Self::SetPhaserActive { value: false }
                | Self::SetDelayActive { value: false }
                | Self::SetCompressorActive { value: false }
                | Self::SetSidechainPro { active: false, .. }
        )
    }
}
