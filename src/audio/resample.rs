//! Offline resampling and channel interleaving.
//!
//! The classifier expects all audio at one fixed sample rate. [`render`]
//! takes decoded per-channel buffers at an arbitrary rate and produces a
//! single interleaved buffer at the target rate, preserving duration
//! (`out_frames = ceil(duration_seconds * target_rate)`) and channel count.
//!
//! The resampler uses linear interpolation, which is plenty for a
//! mel-spectrogram classifier; swap in `rubato` if fidelity ever matters.

use super::decode::DecodedAudio;

/// Interleaved samples at the target rate, ready for PCM encoding.
///
/// Layout is channel-major per frame: `ch0[0], ch1[0], ch0[1], ch1[1], ...`,
/// so `samples.len() == frame_count * channels`.
#[derive(Debug, Clone)]
pub struct ResampledAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl ResampledAudio {
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }
}

/// Resample a single channel from `source_rate` to `target_rate` by linear
/// interpolation. A 1:1 rate is a pass-through copy.
pub fn resample_channel(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }

    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

/// Interleave equal-length channel buffers frame-by-frame, channel index
/// ascending within each frame.
pub fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let frame_count = channels.first().map(|c| c.len()).unwrap_or(0);
    let mut out = Vec::with_capacity(frame_count * channels.len());

    for i in 0..frame_count {
        for channel in channels {
            out.push(channel.get(i).copied().unwrap_or(0.0));
        }
    }

    out
}

/// Render decoded audio to an interleaved buffer at `target_rate`.
///
/// When the decoded rate already matches the target, resampling is skipped
/// and the channels are interleaved as-is.
pub fn render(decoded: &DecodedAudio, target_rate: u32) -> ResampledAudio {
    let channels: Vec<Vec<f32>> = if decoded.sample_rate == target_rate {
        decoded.channels.clone()
    } else {
        decoded
            .channels
            .iter()
            .map(|ch| resample_channel(ch, decoded.sample_rate, target_rate))
            .collect()
    };

    ResampledAudio {
        sample_rate: target_rate,
        channels: decoded.channel_count(),
        samples: interleave(&channels),
    }
}
