//! Per-channel display state reported by the device.
//!
//! Volumes, peaks, and mute flags arrive asynchronously and only feed the
//! display. Edge levels blend the volume and peak of every channel that
//! reaches the edge's source, so a cable glows with the signal it carries.

use patchbay_core::{ChannelIndex, EdgeId, RoutingGraph};

/// Largest device volume.
pub const MAX_VOLUME: f32 = 127.0;

/// Volume assumed before the device reports one, and for unparseable values.
pub const DEFAULT_VOLUME: f32 = 100.0;

const VOLUME_WEIGHT: f32 = 0.35;
const PEAK_WEIGHT: f32 = 0.65;

/// Clamps a reported volume into `0.0..=127.0`; NaN becomes the default.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        DEFAULT_VOLUME
    } else {
        volume.clamp(0.0, MAX_VOLUME)
    }
}

/// Latest volume, peak, and mute state per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Meters {
    volumes: Vec<f32>,
    peaks: Vec<f32>,
    muted: Vec<bool>,
}

impl Meters {
    /// Meters for `channels` channels at default volume, silent, unmuted.
    pub fn new(channels: u8) -> Self {
        let n = usize::from(channels);
        Self {
            volumes: vec![DEFAULT_VOLUME; n],
            peaks: vec![0.0; n],
            muted: vec![false; n],
        }
    }

    /// Number of channels tracked.
    pub fn channel_count(&self) -> usize {
        self.volumes.len()
    }

    /// Volume of a channel, device units.
    pub fn volume(&self, track: ChannelIndex) -> Option<f32> {
        self.volumes.get(usize::from(track)).copied()
    }

    /// Peak of a channel, `0.0..=1.0`.
    pub fn peak(&self, track: ChannelIndex) -> Option<f32> {
        self.peaks.get(usize::from(track)).copied()
    }

    /// Mute flag of a channel.
    pub fn is_muted(&self, track: ChannelIndex) -> bool {
        self.muted.get(usize::from(track)).copied().unwrap_or(false)
    }

    /// Records one channel's volume. Out-of-range channels are ignored.
    pub fn set_volume(&mut self, track: ChannelIndex, volume: f32) {
        if let Some(slot) = self.volumes.get_mut(usize::from(track)) {
            *slot = clamp_volume(volume);
        }
    }

    /// Records volumes for channels `0..volumes.len()`.
    pub fn set_volumes(&mut self, volumes: &[f32]) {
        for (slot, &v) in self.volumes.iter_mut().zip(volumes) {
            *slot = clamp_volume(v);
        }
    }

    /// Records peaks for channels `0..peaks.len()`.
    pub fn set_peaks(&mut self, peaks: &[f32]) {
        for (slot, &p) in self.peaks.iter_mut().zip(peaks) {
            *slot = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        }
    }

    /// Records one channel's mute flag.
    pub fn set_muted(&mut self, track: ChannelIndex, muted: bool) {
        if let Some(slot) = self.muted.get_mut(usize::from(track)) {
            *slot = muted;
        }
    }

    /// Records mute flags for channels `0..flags.len()`.
    pub fn set_mute_map(&mut self, flags: &[bool]) {
        for (slot, &m) in self.muted.iter_mut().zip(flags) {
            *slot = m;
        }
    }

    /// Display level of an edge in `0.0..=1.0`.
    ///
    /// Averages volume and peak over the channels feeding the edge's source.
    /// An edge no channel reaches sits at mid level. `None` for unknown edges.
    pub fn edge_level(&self, graph: &RoutingGraph, edge: EdgeId) -> Option<f32> {
        graph.edge(edge)?;
        let tracks = graph.tracks_on_edge(edge);
        if tracks.is_empty() {
            return Some(0.5);
        }

        let (mut vol_sum, mut vol_n, mut peak_sum, mut peak_n) = (0.0, 0u32, 0.0, 0u32);
        for &t in &tracks {
            if let Some(v) = self.volume(t) {
                vol_sum += v;
                vol_n += 1;
            }
            if let Some(p) = self.peak(t) {
                peak_sum += p;
                peak_n += 1;
            }
        }
        let vol_norm = if vol_n == 0 {
            0.5
        } else {
            vol_sum / vol_n as f32 / MAX_VOLUME
        };
        let peak_norm = if peak_n == 0 {
            0.0
        } else {
            peak_sum / peak_n as f32
        };
        Some((vol_norm * VOLUME_WEIGHT + peak_norm * PEAK_WEIGHT).clamp(0.0, 1.0))
    }
}
