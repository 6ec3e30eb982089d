// The step grid: one track per instrument, 16 steps per track, each step an
// on/off flag plus a velocity. Mutated only by input handlers on the control
// thread; the scheduler reads it, never writes.

use crate::shared::{DEFAULT_VELOCITY, NUM_INSTRUMENTS, NUM_STEPS};

#[derive(Clone, Copy, Debug)]
pub struct Step {
    pub active: bool,
    velocity: u8, // invariant: 1..=127, kept through the setters below
}

impl Default for Step {
    fn default() -> Self {
        Self {
            active: false,
            velocity: DEFAULT_VELOCITY,
        }
    }
}

impl Step {
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: i32) {
        self.velocity = velocity.clamp(1, 127) as u8;
    }

    pub fn nudge_velocity(&mut self, delta: i32) {
        self.set_velocity(self.velocity as i32 + delta);
    }

    // Velocity survives toggling off; switching back on restores it.
    pub fn toggle(&mut self) {
        self.active = !self.active;
    }

    // Squared curve: perceived loudness, not linear. Live playback and the
    // offline render must agree on this exactly.
    pub fn gain(&self) -> f32 {
        let v = self.velocity as f32 / 127.0;
        v * v
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Track {
    pub steps: [Step; NUM_STEPS],
}

impl Default for Track {
    fn default() -> Self {
        Self {
            steps: [Step::default(); NUM_STEPS],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Pattern {
    pub tracks: [Track; NUM_INSTRUMENTS],
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            tracks: std::array::from_fn(|_| Track::default()),
        }
    }
}

impl Pattern {
    pub fn step(&self, instrument: usize, index: usize) -> Step {
        self.tracks[instrument].steps[index]
    }

    pub fn step_mut(&mut self, instrument: usize, index: usize) -> &mut Step {
        &mut self.tracks[instrument].steps[index]
    }

    // Everything off, velocities back to the default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_step_is_inactive_at_default_velocity() {
        let step = Step::default();
        assert!(!step.active);
        assert_eq!(step.velocity(), 100);
    }

    #[test]
    fn toggle_retains_velocity() {
        let mut step = Step::default();
        step.set_velocity(42);
        step.toggle();
        assert!(step.active);
        step.toggle();
        assert!(!step.active);
        step.toggle();
        assert_eq!(step.velocity(), 42);
    }

    #[test]
    fn velocity_clamped_to_valid_range() {
        let mut step = Step::default();
        step.nudge_velocity(1000);
        assert_eq!(step.velocity(), 127);
        step.nudge_velocity(-1000);
        assert_eq!(step.velocity(), 1);
        step.set_velocity(0);
        assert_eq!(step.velocity(), 1);
    }

    #[test]
    fn gain_is_squared_normalized_velocity() {
        let mut step = Step::default();
        step.set_velocity(127);
        assert_eq!(step.gain(), 1.0);

        step.set_velocity(64);
        assert!((step.gain() - 0.25400051).abs() < 1e-6);

        step.set_velocity(1);
        assert!((step.gain() - 6.2e-5).abs() < 1e-6);

        for v in 1..=127 {
            step.set_velocity(v);
            let expected = (v as f32 / 127.0) * (v as f32 / 127.0);
            assert_eq!(step.gain(), expected);
        }
    }

    #[test]
    fn clear_resets_every_step() {
        let mut pattern = Pattern::default();
        pattern.step_mut(2, 5).toggle();
        pattern.step_mut(2, 5).set_velocity(9);
        pattern.clear();
        assert!(!pattern.step(2, 5).active);
        assert_eq!(pattern.step(2, 5).velocity(), 100);
    }
}
