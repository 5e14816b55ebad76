//! Transport state and the step grid used for quantized scene changes.

/// Whether the device sequencer is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// Sequencer stopped (default).
    #[default]
    Stopped,
    /// Sequencer running.
    Playing,
}

impl TransportState {
    /// Builds the state from a `playing` flag.
    pub const fn from_playing(playing: bool) -> Self {
        if playing { Self::Playing } else { Self::Stopped }
    }

    /// Returns `true` when playing.
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Boundary test over sequencer step indices.
///
/// A step is a boundary when `step % modulus == 0`. The modulus is
/// configuration: 4 aligns to quarter notes on a 16-step bar, 16 to bar lines.
///
/// ```rust
/// use patchbay_core::StepGrid;
///
/// let grid = StepGrid::new(4);
/// assert!(grid.is_boundary(0));
/// assert!(!grid.is_boundary(3));
/// assert!(grid.is_boundary(12));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepGrid {
    modulus: u32,
}

impl StepGrid {
    /// Creates a grid; a modulus of 0 is treated as 1 (every step is a boundary).
    pub const fn new(modulus: u32) -> Self {
        Self {
            modulus: if modulus == 0 { 1 } else { modulus },
        }
    }

    /// The effective modulus.
    pub const fn modulus(self) -> u32 {
        self.modulus
    }

    /// Returns `true` if `step` falls on a boundary.
    pub const fn is_boundary(self, step: u32) -> bool {
        step % self.modulus == 0
    }

    /// Number of steps from `step` to the next boundary (0 if `step` is one).
    pub const fn steps_until_boundary(self, step: u32) -> u32 {
        let rem = step % self.modulus;
        if rem == 0 { 0 } else { self.modulus - rem }
    }
}

impl Default for StepGrid {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_default_is_stopped() {
        assert_eq!(TransportState::default(), TransportState::Stopped);
        assert!(TransportState::from_playing(true).is_playing());
    }

    #[test]
    fn zero_modulus_means_every_step() {
        let grid = StepGrid::new(0);
        assert_eq!(grid.modulus(), 1);
        assert!((0..8).all(|s| grid.is_boundary(s)));
    }

    #[test]
    fn steps_until_boundary() {
        let grid = StepGrid::new(4);
        assert_eq!(grid.steps_until_boundary(4), 0);
        assert_eq!(grid.steps_until_boundary(5), 3);
        assert_eq!(grid.steps_until_boundary(7), 1);
    }
}
