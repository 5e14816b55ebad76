//! Quantized scene switching.
//!
//! While the device sequencer runs, a requested scene waits for the next
//! step boundary so the change lands on the beat. The controller tracks
//! whether playback is running from two signals: explicit play-state
//! messages, and step messages (which keep "running" true for a hold window
//! even when no play-state message arrives).

use std::time::Duration;

use patchbay_config::SceneSettings;
use patchbay_core::{SceneData, StepGrid, TransportState};

/// A scene waiting for a step boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingScene {
    /// Display label of the request.
    pub label: String,
    /// The scene to apply.
    pub scene: SceneData,
}

/// Decides when requested scenes are applied.
#[derive(Debug, Clone)]
pub struct SceneController {
    grid: StepGrid,
    quantize: bool,
    step_hold: Duration,
    transport: TransportState,
    step_driven_until: Option<Duration>,
    current_step: Option<u32>,
    tempo: Option<f32>,
    pending: Option<PendingScene>,
}

impl SceneController {
    /// Creates a controller from settings.
    pub fn new(settings: &SceneSettings) -> Self {
        Self {
            grid: StepGrid::new(settings.boundary_modulus),
            quantize: settings.quantize,
            step_hold: settings.step_hold(),
            transport: TransportState::Stopped,
            step_driven_until: None,
            current_step: None,
            tempo: None,
            pending: None,
        }
    }

    /// Enables or disables quantized application.
    pub fn set_quantize(&mut self, quantize: bool) {
        self.quantize = quantize;
    }

    /// Whether quantized application is enabled.
    pub fn quantize(&self) -> bool {
        self.quantize
    }

    /// The step grid in use.
    pub fn grid(&self) -> StepGrid {
        self.grid
    }

    /// Last play state reported by the device.
    pub fn transport(&self) -> TransportState {
        self.transport
    }

    /// Last step index seen.
    pub fn current_step(&self) -> Option<u32> {
        self.current_step
    }

    /// Last tempo reported by the device, in BPM.
    pub fn tempo(&self) -> Option<f32> {
        self.tempo
    }

    /// Records a tempo report.
    pub fn on_tempo(&mut self, bpm: f32) {
        self.tempo = Some(bpm);
    }

    /// Whether playback counts as running at `now`.
    pub fn is_running(&self, now: Duration) -> bool {
        self.transport.is_playing() || self.step_driven_until.is_some_and(|until| now < until)
    }

    /// Records a play-state report. Stopping also ends step-driven playback;
    /// a pending scene stays queued.
    pub fn on_play_state(&mut self, playing: bool) {
        self.transport = TransportState::from_playing(playing);
        if !playing {
            self.step_driven_until = None;
        }
    }

    /// Records a step report. Returns the pending scene if `step` is a
    /// boundary.
    ///
    /// Repeated reports of the same step are ignored.
    pub fn on_step(&mut self, step: u32, now: Duration) -> Option<PendingScene> {
        if self.current_step == Some(step) {
            return None;
        }
        self.current_step = Some(step);
        if !self.transport.is_playing() {
            self.step_driven_until = Some(now + self.step_hold);
        }
        if self.pending.is_some() && self.grid.is_boundary(step) {
            return self.pending.take();
        }
        None
    }

    /// Requests a scene. Returns it for immediate application unless it was
    /// queued for the next boundary; a queued request replaces any pending one.
    pub fn request(
        &mut self,
        scene: SceneData,
        label: impl Into<String>,
        now: Duration,
    ) -> Option<PendingScene> {
        let request = PendingScene {
            label: label.into(),
            scene,
        };
        if !self.quantize || !self.is_running(now) {
            self.pending = None;
            return Some(request);
        }
        self.pending = Some(request);
        tracing::info!(
            label = %self.pending.as_ref().map_or("", |p| p.label.as_str()),
            steps = ?self.steps_until_apply(),
            "scene queued for next step boundary"
        );
        None
    }

    /// Step reports left before the queued scene lands, counting the
    /// boundary step itself. `None` with nothing queued or no step seen yet.
    pub fn steps_until_apply(&self) -> Option<u32> {
        self.pending.as_ref()?;
        let step = self.current_step?;
        Some(self.grid.steps_until_boundary(step.wrapping_add(1)) + 1)
    }

    /// The queued scene, if any.
    pub fn pending(&self) -> Option<&PendingScene> {
        self.pending.as_ref()
    }

    /// Takes the queued scene for immediate application.
    pub fn take_pending(&mut self) -> Option<PendingScene> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn controller() -> SceneController {
        SceneController::new(&SceneSettings::default())
    }

    #[test]
    fn stopped_transport_applies_immediately() {
        let mut c = controller();
        assert!(c.request(SceneData::default(), "A", ms(0)).is_some());
        assert!(c.pending().is_none());
    }

    #[test]
    fn playing_transport_waits_for_boundary() {
        let mut c = controller();
        c.on_play_state(true);
        assert!(c.request(SceneData::default(), "A", ms(0)).is_none());
        assert!(c.on_step(1, ms(10)).is_none());
        assert_eq!(c.steps_until_apply(), Some(3));
        assert!(c.on_step(2, ms(20)).is_none());
        assert!(c.on_step(3, ms(30)).is_none());
        let applied = c.on_step(4, ms(40)).unwrap();
        assert_eq!(applied.label, "A");
        assert!(c.pending().is_none());
    }

    #[test]
    fn newer_request_replaces_pending() {
        let mut c = controller();
        c.on_play_state(true);
        c.request(SceneData::default(), "A", ms(0));
        c.request(SceneData::default(), "B", ms(1));
        assert_eq!(c.on_step(8, ms(2)).unwrap().label, "B");
    }

    #[test]
    fn steps_alone_mean_running_within_hold() {
        let mut c = controller();
        c.on_step(1, ms(1000));
        assert!(c.is_running(ms(1849)));
        assert!(!c.is_running(ms(1850)));
        assert!(c.request(SceneData::default(), "A", ms(1100)).is_none());
        assert!(c.request(SceneData::default(), "B", ms(2000)).is_some());
    }

    #[test]
    fn stop_keeps_pending_scene() {
        let mut c = controller();
        c.on_play_state(true);
        c.request(SceneData::default(), "A", ms(0));
        c.on_play_state(false);
        assert!(!c.is_running(ms(1)));
        assert_eq!(c.pending().map(|p| p.label.as_str()), Some("A"));
        assert_eq!(c.take_pending().unwrap().label, "A");
    }

    #[test]
    fn repeated_step_is_ignored() {
        let mut c = controller();
        c.on_play_state(true);
        c.on_step(4, ms(0));
        c.request(SceneData::default(), "A", ms(1));
        assert!(c.on_step(4, ms(2)).is_none());
        assert!(c.on_step(0, ms(3)).is_some());
    }

    #[test]
    fn quantize_off_is_immediate_even_when_playing() {
        let mut c = controller();
        c.set_quantize(false);
        c.on_play_state(true);
        assert!(c.request(SceneData::default(), "A", ms(0)).is_some());
    }

    #[test]
    fn custom_modulus() {
        let mut c = SceneController::new(&SceneSettings {
            boundary_modulus: 8,
            ..SceneSettings::default()
        });
        assert_eq!(c.grid().modulus(), 8);
        c.on_play_state(true);
        c.on_tempo(128.0);
        assert_eq!(c.tempo(), Some(128.0));
        c.request(SceneData::default(), "A", ms(0));
        assert_eq!(c.steps_until_apply(), None);
        assert!(c.on_step(4, ms(1)).is_none());
        assert_eq!(c.steps_until_apply(), Some(4));
        assert!(c.on_step(16, ms(2)).is_some());
    }
}
