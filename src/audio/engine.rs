use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio_api::AudioCommand;

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::sample_id::SampleId;
use super::voice::Voice;

const MAX_VOICES: usize = 64; // hard cap so the callback never grows the pool

// Owned by the output callback. Everything arrives through AudioCommands;
// the only thing that leaves is the frame clock, published through an
// atomic so the control thread can read "now" without locking.
pub struct Engine {
    sample_rate: f64,
    samples: HashMap<SampleId, SampleBuffer>,
    voices: Vec<Voice>,
    frames_done: u64,
    clock_frames: Arc<AtomicU64>,
}

impl Engine {
    pub fn new(sample_rate: u32, clock_frames: Arc<AtomicU64>) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            samples: HashMap::new(),
            voices: Vec::with_capacity(MAX_VOICES),
            frames_done: 0,
            clock_frames,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::RegisterSample { id, buffer } => {
                self.samples.insert(id, buffer);
            }
            AudioCommand::PlayAt { id, gain, when } => {
                // a start time already in the past plays as soon as possible
                let start = ((when * self.sample_rate).round() as u64).max(self.frames_done);
                self.start_voice(id, start, gain);
            }
            AudioCommand::PlayNow { id, gain } => {
                self.start_voice(id, self.frames_done, gain);
            }
        }
    }

    fn start_voice(&mut self, id: SampleId, start_frame: u64, gain: f32) {
        if !self.samples.contains_key(&id) {
            return;
        }
        if self.voices.len() >= MAX_VOICES {
            // steal the oldest voice
            if let Some(oldest) = self
                .voices
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| v.start_frame)
                .map(|(i, _)| i)
            {
                self.voices.swap_remove(oldest);
            }
        }
        self.voices.push(Voice::new(id, start_frame, gain));
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            *frame = StereoFrame::zero();
        }

        let block_start = self.frames_done;
        for voice in self.voices.iter_mut() {
            if let Some(buffer) = self.samples.get(&voice.sample) {
                voice.render_into(buffer, out, block_start);
            } else {
                voice.active = false;
            }
        }
        self.voices.retain(|v| v.active);

        self.frames_done = block_start + out.len() as u64;
        self.clock_frames.store(self.frames_done, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub fn frames_done(&self) -> u64 {
        self.frames_done
    }
}
