use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::sample_id::SampleId;

// One scheduled playback of a sample. A voice whose start frame lies in the
// future is held by the engine untouched; once its block comes up it begins
// mixing from the exact in-block offset.
#[derive(Clone, Copy, Debug)]
pub struct Voice {
    pub sample: SampleId,
    pub start_frame: u64,
    pub gain: f32,
    pub active: bool,
    pos: usize,
}

impl Voice {
    pub fn new(sample: SampleId, start_frame: u64, gain: f32) -> Self {
        Self {
            sample,
            start_frame,
            gain,
            active: true,
            pos: 0,
        }
    }

    // Mix this voice into an output block that covers absolute frames
    // [block_start, block_start + out.len()).
    pub fn render_into(&mut self, buffer: &SampleBuffer, out: &mut [StereoFrame], block_start: u64) {
        if !self.active {
            return;
        }
        if buffer.is_empty() {
            self.active = false;
            return;
        }

        // first block may start mid-buffer; later blocks always at 0
        let offset = self.start_frame.saturating_sub(block_start) as usize;
        if offset >= out.len() {
            return; // not due within this block
        }

        for frame in out[offset..].iter_mut() {
            let Some(&sample) = buffer.data.get(self.pos) else {
                self.active = false;
                break;
            };
            frame.add_scaled(sample, self.gain);
            self.pos += 1;
        }
    }
}
