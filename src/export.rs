// WAV encoding for the offline render: 16-bit signed little-endian PCM,
// stereo, at the render sample rate.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::audio::StereoFrame;

pub const EXPORT_FILE: &str = "stepbox_beat.wav";

pub fn write_wav(path: &Path, frames: &[StereoFrame], sample_rate: u32) -> anyhow::Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for frame in frames {
        writer.write_sample(to_i16(frame.left))?;
        writer.write_sample(to_i16(frame.right))?;
    }
    writer.finalize()?;
    Ok(())
}

// Clamp before scaling: the mix is additive and can exceed full scale.
#[inline]
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}
