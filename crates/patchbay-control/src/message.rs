//! Inbound device messages.
//!
//! The firmware broadcasts loosely structured JSON: one object may carry a
//! play state, a step index, and a volume array at once, and numbers
//! sometimes arrive as strings. [`parse_message`] extracts every fact it
//! recognizes and ignores the rest. Binary frames carry per-channel peak
//! levels and are decoded by [`parse_level_frame`].

use patchbay_core::ChannelIndex;
use serde_json::{Map, Value};

/// First byte of a binary level frame.
pub const LEVEL_FRAME_MARKER: u8 = 0xAA;

/// Live FX state reported by the firmware for one channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveFxReport {
    /// Channel reported.
    pub track: ChannelIndex,
    /// Effect family: `echo`, `flanger`, or `compressor`.
    pub fx: String,
    /// Enable flag, if reported.
    pub active: Option<bool>,
    /// Echo time, ms.
    pub time: Option<f32>,
    /// Feedback, percent.
    pub feedback: Option<f32>,
    /// Echo mix, percent.
    pub mix: Option<f32>,
    /// Flanger rate, percent.
    pub rate: Option<f32>,
    /// Flanger depth, percent.
    pub depth: Option<f32>,
    /// Compressor threshold, dB.
    pub threshold: Option<f32>,
    /// Compressor ratio.
    pub ratio: Option<f32>,
}

/// A fact extracted from an inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// Sequencer started or stopped.
    PlayState(bool),
    /// Sequencer tempo, BPM.
    Tempo(f32),
    /// Sequencer step index.
    Step(u32),
    /// Volumes for channels `0..n`.
    Volumes(Vec<f32>),
    /// Volume of one channel.
    Volume {
        /// Channel.
        track: ChannelIndex,
        /// Volume, device units.
        volume: f32,
    },
    /// The firmware refused a filter (active filter limit reached).
    FilterRejected {
        /// Channel, if reported.
        track: Option<ChannelIndex>,
    },
    /// A filter was programmed, possibly by another client.
    FilterSet {
        /// Channel.
        track: ChannelIndex,
        /// Device filter type code.
        filter_type: u8,
        /// Cutoff, Hz.
        cutoff: Option<f32>,
        /// Resonance.
        resonance: Option<f32>,
    },
    /// A channel's filter was cleared.
    FilterCleared {
        /// Channel.
        track: ChannelIndex,
    },
    /// Live FX state for a channel.
    LiveFx(LiveFxReport),
    /// Mute state of one channel.
    Muted {
        /// Channel.
        track: ChannelIndex,
        /// Mute flag.
        muted: bool,
    },
    /// Mute flags for channels `0..n`.
    MuteMap(Vec<bool>),
}

/// Parses `step`-style values: numbers, or strings with a leading integer.
fn lenient_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => {
            let s = s.trim();
            let digits: &str = &s[..s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len())];
            digits.parse().ok()
        }
        _ => None,
    }
}

fn lenient_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn lenient_track(value: &Value) -> Option<ChannelIndex> {
    lenient_u32(value).and_then(|v| ChannelIndex::try_from(v).ok())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn field_f32(obj: &Map<String, Value>, key: &str) -> Option<f32> {
    obj.get(key).and_then(lenient_f32)
}

/// Extracts every recognized fact from a text message.
///
/// Malformed JSON or non-object payloads yield no events.
pub fn parse_message(text: &str) -> Vec<DeviceEvent> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => events_from(&obj),
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed device message");
            Vec::new()
        }
    }
}

fn events_from(obj: &Map<String, Value>) -> Vec<DeviceEvent> {
    let mut events = Vec::new();
    let kind = obj.get("type").and_then(Value::as_str).unwrap_or("");
    let track = obj.get("track").and_then(lenient_track);

    if matches!(kind, "playState" | "sequencerState" | "status" | "state")
        && let Some(playing) = obj.get("playing")
    {
        events.push(DeviceEvent::PlayState(truthy(playing)));
    }
    if let Some(bpm) = field_f32(obj, "tempo") {
        events.push(DeviceEvent::Tempo(bpm));
    }
    if let Some(step) = obj.get("step").and_then(lenient_u32) {
        events.push(DeviceEvent::Step(step));
    }

    if let Some(Value::Array(volumes)) = obj.get("trackVolumes") {
        events.push(DeviceEvent::Volumes(
            volumes.iter().map(|v| lenient_f32(v).unwrap_or(100.0)).collect(),
        ));
    }
    if kind == "trackVolumes"
        && let Some(Value::Array(volumes)) = obj.get("volumes")
    {
        events.push(DeviceEvent::Volumes(
            volumes.iter().map(|v| lenient_f32(v).unwrap_or(100.0)).collect(),
        ));
    }
    if matches!(kind, "trackVolumeSet" | "trackVolume")
        && let (Some(track), Some(volume)) = (track, field_f32(obj, "volume"))
    {
        events.push(DeviceEvent::Volume { track, volume });
    }

    if kind == "trackFilterSet" {
        match obj.get("success").and_then(Value::as_bool) {
            Some(false) => events.push(DeviceEvent::FilterRejected { track }),
            Some(true) => {
                let filter_type = obj.get("filterType").and_then(lenient_u32);
                if let (Some(track), Some(code)) = (track, filter_type) {
                    events.push(DeviceEvent::FilterSet {
                        track,
                        filter_type: u8::try_from(code).unwrap_or(0),
                        cutoff: field_f32(obj, "cutoff"),
                        resonance: field_f32(obj, "resonance"),
                    });
                }
            }
            None => {}
        }
    }
    if kind == "trackFilterCleared"
        && let Some(track) = track
    {
        events.push(DeviceEvent::FilterCleared { track });
    }

    if kind == "trackLiveFx"
        && let (Some(track), Some(fx)) = (track, obj.get("fx").and_then(Value::as_str))
    {
        events.push(DeviceEvent::LiveFx(LiveFxReport {
            track,
            fx: fx.to_string(),
            active: obj.get("active").map(truthy),
            time: field_f32(obj, "time"),
            feedback: field_f32(obj, "feedback"),
            mix: field_f32(obj, "mix"),
            rate: field_f32(obj, "rate"),
            depth: field_f32(obj, "depth"),
            threshold: field_f32(obj, "threshold"),
            ratio: field_f32(obj, "ratio"),
        }));
    }

    match obj.get("trackMuted") {
        Some(Value::Array(flags)) => {
            events.push(DeviceEvent::MuteMap(flags.iter().map(truthy).collect()));
        }
        _ if kind == "trackMuted" => {
            if let Some(track) = track {
                let muted = obj.get("muted").is_some_and(truthy);
                events.push(DeviceEvent::Muted { track, muted });
            }
        }
        _ => {}
    }

    events
}

/// Decodes a binary level frame into per-channel peaks in `0.0..=1.0`.
///
/// A frame is the marker byte, one byte per channel, and a trailing byte.
/// Frames that are too short or unmarked yield `None`.
pub fn parse_level_frame(frame: &[u8], channels: usize) -> Option<Vec<f32>> {
    if frame.len() < channels + 2 || frame[0] != LEVEL_FRAME_MARKER {
        return None;
    }
    Some(
        frame[1..=channels]
            .iter()
            .map(|&b| f32::from(b) / 255.0)
            .collect(),
    )
}
