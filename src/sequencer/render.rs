// Offline render: the same per-step timing math as the live scheduler, but
// against a fixed-length in-memory buffer instead of the audio clock. The
// whole pattern is programmed up front (no real-time constraint), mixed, and
// handed to the WAV encoder.

use crate::audio::{SampleBuffer, StereoFrame};
use crate::shared::{NUM_INSTRUMENTS, NUM_STEPS};
use crate::store::SampleStore;

use super::pattern::Pattern;
use super::scheduler::{sanitize_bpm, seconds_per_step};

pub const RENDER_SAMPLE_RATE: u32 = 44100;
pub const RENDER_LOOPS: usize = 4;

// A non-real-time trigger sink: a preallocated stereo buffer that samples
// are mixed into at their scheduled offsets. Anything past the end of the
// buffer is truncated.
pub struct OfflineRenderTarget {
    sample_rate: u32,
    frames: Vec<StereoFrame>,
}

impl OfflineRenderTarget {
    pub fn new(total_frames: usize, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frames: vec![StereoFrame::zero(); total_frames],
        }
    }

    pub fn schedule_at(&mut self, buffer: &SampleBuffer, gain: f32, when: f64) {
        let start = (when * self.sample_rate as f64).round() as usize;
        for (i, &sample) in buffer.data.iter().enumerate() {
            let Some(slot) = self.frames.get_mut(start + i) else {
                break;
            };
            slot.add_scaled(sample, gain);
        }
    }

    pub fn finish(self) -> Vec<StereoFrame> {
        self.frames
    }
}

// Every (row, gain, time) the render plays, over all loop repeats. Split out
// from the mixing so timing can be checked without rendering audio.
pub fn pattern_triggers(
    pattern: &Pattern,
    step_secs: f64,
) -> Vec<(usize, f32, f64)> {
    let mut triggers = Vec::new();
    for repeat in 0..RENDER_LOOPS {
        let loop_offset = repeat as f64 * step_secs * NUM_STEPS as f64;
        for row in 0..NUM_INSTRUMENTS {
            for index in 0..NUM_STEPS {
                let step = pattern.step(row, index);
                if step.active {
                    triggers.push((row, step.gain(), loop_offset + index as f64 * step_secs));
                }
            }
        }
    }
    triggers
}

// Render the pattern at the tempo given, repeated RENDER_LOOPS times, at
// 44.1kHz stereo. Pattern and tempo are read once here; nothing mutates them
// mid-render since this runs to completion on the control thread. Returns
// None when no samples are loaded at all (nothing to render).
pub fn render_pattern(
    pattern: &Pattern,
    store: &SampleStore,
    bpm: u32,
) -> Option<Vec<StereoFrame>> {
    if store.is_empty() {
        return None;
    }

    let step_secs = seconds_per_step(sanitize_bpm(bpm));
    let total_secs = step_secs * NUM_STEPS as f64 * RENDER_LOOPS as f64;
    let total_frames = (total_secs * RENDER_SAMPLE_RATE as f64).round() as usize;

    let mut target = OfflineRenderTarget::new(total_frames, RENDER_SAMPLE_RATE);
    for (row, gain, when) in pattern_triggers(pattern, step_secs) {
        if let Some(sample) = store.get(row) {
            target.schedule_at(&sample.buffer, gain, when);
        }
    }
    Some(target.finish())
}
