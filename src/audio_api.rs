pub use crate::audio::{SampleBuffer, SampleId};

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The engine can't load files (interrupts the callback), so a decoded
    // buffer must be registered first; triggers then refer to it by id.
    RegisterSample { id: SampleId, buffer: SampleBuffer },

    // Start playback at an absolute audio-clock time in seconds. The engine
    // holds the voice pending until the block containing that frame, so the
    // sound starts sample-accurately no matter when the command arrived.
    PlayAt { id: SampleId, gain: f32, when: f64 },

    // Immediate pad hit, starts at the top of the next rendered block.
    PlayNow { id: SampleId, gain: f32 },
}
