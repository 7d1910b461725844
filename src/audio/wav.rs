//! 16-bit PCM WAV serialization.
//!
//! The classifier's decoding stack expects the canonical 44-byte RIFF/WAVE
//! header followed by interleaved little-endian i16 samples, so the output
//! here must be byte-exact: hound emits exactly that layout for integer PCM.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

pub const WAV_MIME: &str = "audio/wav";

/// A finished WAV container ready for upload.
#[derive(Debug, Clone)]
pub struct WavAsset {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime: &'static str,
}

impl WavAsset {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: "recording.wav".to_string(),
            mime: WAV_MIME,
        }
    }
}

/// Quantize a float sample to signed 16-bit PCM.
///
/// Clips to `[-1.0, 1.0]`, then scales by 32767 for positive values and
/// 32768 for negative values (the standard asymmetric PCM range), truncating
/// toward zero.
pub fn quantize_sample(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Serialize interleaved float samples into a WAV byte container.
///
/// Caller guarantees `sample_rate > 0` and `channels >= 1`; the output is
/// always `44 + samples.len() * 2` bytes.
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            WavWriter::new(&mut cursor, spec).context("failed to create WAV writer")?;

        for &sample in samples {
            writer
                .write_sample(quantize_sample(sample))
                .context("failed to write PCM sample")?;
        }

        writer.finalize().context("failed to finalize WAV container")?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_clips_out_of_range() {
        assert_eq!(quantize_sample(1.5), 32767);
        assert_eq!(quantize_sample(-1.5), -32768);
        assert_eq!(quantize_sample(0.0), 0);
    }

    #[test]
    fn quantize_is_asymmetric_at_full_scale() {
        assert_eq!(quantize_sample(1.0), 32767);
        assert_eq!(quantize_sample(-1.0), -32768);
    }

    #[test]
    fn quantize_truncates_after_scaling() {
        // 0.5 * 32767 = 16383.5 -> 16383
        assert_eq!(quantize_sample(0.5), 16383);
        // -0.5 * 32768 = -16384.0 -> -16384
        assert_eq!(quantize_sample(-0.5), -16384);
    }

    #[test]
    fn encoded_length_is_header_plus_data() {
        let samples = vec![0.0_f32; 480 * 2]; // 480 stereo frames
        let bytes = encode_wav(&samples, 22050, 2).unwrap();
        assert_eq!(bytes.len(), 44 + 480 * 2 * 2);
    }

    #[test]
    fn empty_buffer_yields_bare_header() {
        let bytes = encode_wav(&[], 22050, 1).unwrap();
        assert_eq!(bytes.len(), 44);
    }
}
