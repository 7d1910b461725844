//! Transcode orchestrator: compressed blob in, submittable asset out.
//!
//! The pipeline is strictly sequential: decode, resample to the target rate,
//! interleave, quantize, frame into a WAV container. Every failure along the
//! way (corrupt blob, unsupported codec, zero-length capture) is absorbed and
//! the original container is handed on instead, so a recording that once
//! started always yields something submittable.

use tracing::{info, warn};

use super::decode::decode_blob;
use super::resample::render;
use super::wav::{encode_wav, WavAsset};
use crate::capture::{extension_for_mime, EncodedBlob};

/// The original compressed container, passed through when transcoding fails.
#[derive(Debug, Clone)]
pub struct FallbackAsset {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime: String,
}

impl FallbackAsset {
    pub fn from_blob(blob: EncodedBlob) -> Self {
        let ext = extension_for_mime(&blob.mime);
        Self {
            filename: format!("recording.{ext}"),
            mime: blob.mime,
            bytes: blob.data,
        }
    }
}

/// Result of the orchestrator: canonical WAV when transcoding succeeded,
/// the original container otherwise. Never an error.
#[derive(Debug, Clone)]
pub enum AudioAsset {
    Wav(WavAsset),
    Fallback(FallbackAsset),
}

impl AudioAsset {
    pub fn bytes(&self) -> &[u8] {
        match self {
            AudioAsset::Wav(a) => &a.bytes,
            AudioAsset::Fallback(a) => &a.bytes,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            AudioAsset::Wav(a) => &a.filename,
            AudioAsset::Fallback(a) => &a.filename,
        }
    }

    pub fn mime(&self) -> &str {
        match self {
            AudioAsset::Wav(a) => a.mime,
            AudioAsset::Fallback(a) => &a.mime,
        }
    }

    pub fn is_wav(&self) -> bool {
        matches!(self, AudioAsset::Wav(_))
    }

    pub fn into_parts(self) -> (Vec<u8>, String, String) {
        match self {
            AudioAsset::Wav(a) => (a.bytes, a.filename, a.mime.to_string()),
            AudioAsset::Fallback(a) => (a.bytes, a.filename, a.mime),
        }
    }
}

/// Convert a compressed blob into a canonical WAV at `target_rate`, or fall
/// back to the original container when any stage fails.
pub fn transcode(blob: EncodedBlob, target_rate: u32) -> AudioAsset {
    match try_transcode(&blob, target_rate) {
        Ok(asset) => {
            info!(
                "transcoded {} byte {} blob into {} byte WAV",
                blob.data.len(),
                blob.mime,
                asset.bytes.len()
            );
            AudioAsset::Wav(asset)
        }
        Err(e) => {
            warn!(
                "transcoding failed, submitting original {} container: {:#}",
                blob.mime, e
            );
            AudioAsset::Fallback(FallbackAsset::from_blob(blob))
        }
    }
}

fn try_transcode(blob: &EncodedBlob, target_rate: u32) -> anyhow::Result<WavAsset> {
    let hint = extension_for_mime_hint(&blob.mime);
    let decoded = decode_blob(&blob.data, hint)?;

    if decoded.frame_count() == 0 {
        anyhow::bail!("decoded buffer is empty");
    }

    let rendered = render(&decoded, target_rate);
    let bytes = encode_wav(&rendered.samples, rendered.sample_rate, rendered.channels)?;

    Ok(WavAsset::new(bytes))
}

// Only hint the demuxer when the MIME actually names a known format;
// probing by content works better than a wrong extension.
fn extension_for_mime_hint(mime: &str) -> Option<&'static str> {
    match extension_for_mime(mime) {
        "webm" if !mime.contains("webm") => None,
        ext => Some(ext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::DEFAULT_MIME;

    fn blob(data: Vec<u8>, mime: &str) -> EncodedBlob {
        EncodedBlob {
            data,
            mime: mime.to_string(),
        }
    }

    #[test]
    fn malformed_blob_falls_back_to_original() {
        let original = vec![0x42u8; 64];
        let asset = transcode(blob(original.clone(), "audio/webm"), 22050);

        match asset {
            AudioAsset::Fallback(f) => {
                assert_eq!(f.bytes, original);
                assert_eq!(f.mime, "audio/webm");
                assert_eq!(f.filename, "recording.webm");
            }
            AudioAsset::Wav(_) => panic!("garbage must not transcode"),
        }
    }

    #[test]
    fn empty_blob_falls_back() {
        let asset = transcode(blob(Vec::new(), DEFAULT_MIME), 22050);
        assert!(!asset.is_wav());
    }

    #[test]
    fn fallback_extension_tracks_mime_subtype() {
        let asset = transcode(blob(vec![1, 2, 3], "audio/ogg;codecs=opus"), 22050);
        assert_eq!(asset.filename(), "recording.ogg");
        assert_eq!(asset.mime(), "audio/ogg;codecs=opus");
    }

    #[test]
    fn unknown_mime_defaults_to_webm_extension() {
        let asset = transcode(blob(vec![1, 2, 3], ""), 22050);
        assert_eq!(asset.filename(), "recording.webm");
    }

    #[test]
    fn wav_input_is_transcoded_to_target_rate() {
        // 2 seconds of a 440-ish tone at 44100 Hz mono.
        let samples: Vec<f32> = (0..88200)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 44100.0).sin() * 0.5)
            .collect();
        let wav = crate::audio::encode_wav(&samples, 44100, 1).unwrap();

        let asset = transcode(blob(wav, "audio/wav"), 22050);
        assert!(asset.is_wav());
        assert_eq!(asset.filename(), "recording.wav");
        assert_eq!(asset.mime(), "audio/wav");

        // Header must report 22050 Hz mono with 2 seconds of data.
        let bytes = asset.bytes();
        let sample_rate = u32::from_le_bytes(bytes[24..28].try_into().unwrap());
        let channels = u16::from_le_bytes(bytes[22..24].try_into().unwrap());
        let data_bytes = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
        assert_eq!(sample_rate, 22050);
        assert_eq!(channels, 1);
        assert_eq!(data_bytes, 2 * 22050 * 2);
    }
}
