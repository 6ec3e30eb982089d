use std::path::Path;

use super::frame::StereoFrame;

#[derive(Clone, Debug)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>,
}

impl From<Vec<StereoFrame>> for SampleBuffer {
    fn from(data: Vec<StereoFrame>) -> Self {
        Self { data }
    }
}

impl SampleBuffer {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Decode a WAV file into stereo frames at the target rate. Mono files
    // are duplicated to both channels; files with more than two channels
    // keep the first two.
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let file_rate = spec.sample_rate;
        let file_channels = spec.channels as usize;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max = (1i32 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let mut frames: Vec<StereoFrame> = if file_channels == 1 {
            samples
                .into_iter()
                .map(|x| StereoFrame { left: x, right: x })
                .collect()
        } else {
            samples
                .chunks_exact(file_channels)
                .map(|c| StereoFrame { left: c[0], right: c[1] })
                .collect()
        };

        if file_rate != target_rate {
            frames = resample_linear(&frames, file_rate, target_rate);
        }

        Ok(Self { data: frames })
    }
}

// Plain linear resampler. Drum one-shots are short and resampled once at
// load time, so quality over speed was never worth a real filter here.
fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;
        if idx >= frames.len().saturating_sub(1) {
            out.push(*frames.last().unwrap_or(&StereoFrame::zero()));
        } else {
            let a = frames[idx];
            let b = frames[idx + 1];
            out.push(StereoFrame {
                left: a.left * (1.0 - frac) + b.left * frac,
                right: a.right * (1.0 - frac) + b.right * frac,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(values: &[f32]) -> Vec<StereoFrame> {
        values.iter().map(|&v| StereoFrame { left: v, right: v }).collect()
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let frames = mono(&[0.0, 0.5, 1.0]);
        let out = resample_linear(&frames, 44100, 44100);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].left, 0.5);
    }

    #[test]
    fn resample_doubles_length_and_interpolates() {
        let frames = mono(&[0.0, 1.0]);
        let out = resample_linear(&frames, 22050, 44100);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].left, 0.0);
        assert!((out[1].left - 0.5).abs() < 1e-6);
    }
}
