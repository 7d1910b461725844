use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// MIME assumed for a blob whose chunks never declared one.
pub const DEFAULT_MIME: &str = "audio/webm";

/// One buffer of encoded audio as delivered by a capture device.
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    pub data: Vec<u8>,
    /// Container MIME declared by the device, e.g. `audio/webm` or `audio/wav`.
    pub mime: String,
}

/// All chunks of a session concatenated in arrival order.
#[derive(Debug, Clone)]
pub struct EncodedBlob {
    pub data: Vec<u8>,
    pub mime: String,
}

/// Errors from acquiring or running a capture device.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no usable input device: {0}")]
    DeviceUnavailable(String),

    #[error("capture already in progress")]
    AlreadyRecording,

    #[error("capture device failed: {0}")]
    Device(String),
}

/// A source of encoded audio chunks.
///
/// `start` hands back the receiving end of a bounded chunk queue, the
/// explicit capability token for the acquired stream. Implementations:
/// - [`MicrophoneDevice`](super::MicrophoneDevice): cpal default input device
/// - [`FileDevice`](super::FileDevice): streams an existing audio file
///
/// Tests inject scripted fakes through this trait.
#[async_trait]
pub trait CaptureDevice: Send {
    /// Acquire the underlying stream and start producing chunks.
    async fn start(&mut self) -> Result<mpsc::Receiver<EncodedChunk>, CaptureError>;

    /// Flush pending data and release the underlying stream. The sending end
    /// of the chunk queue must be dropped by the time this returns.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Device name for logging.
    fn name(&self) -> &str;
}

/// Container MIME for a file extension. Unknown extensions get the
/// catch-all default so the classifier still receives a type.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" | "mp4" => "audio/mp4",
        "webm" => "audio/webm",
        _ => DEFAULT_MIME,
    }
}

/// File extension for a container MIME, derived from the subtype.
/// Unknown or empty types default to `webm`.
pub fn extension_for_mime(mime: &str) -> &'static str {
    let essence = mime.split(';').next().unwrap_or("").trim();
    let subtype = essence.split('/').nth(1).unwrap_or("");

    match subtype {
        "wav" | "x-wav" | "wave" => "wav",
        "mpeg" | "mp3" => "mp3",
        "ogg" => "ogg",
        "flac" => "flac",
        "mp4" | "m4a" => "m4a",
        "webm" => "webm",
        _ => "webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_maps_common_subtypes() {
        assert_eq!(extension_for_mime("audio/wav"), "wav");
        assert_eq!(extension_for_mime("audio/x-wav"), "wav");
        assert_eq!(extension_for_mime("audio/mpeg"), "mp3");
        assert_eq!(extension_for_mime("audio/webm;codecs=opus"), "webm");
    }

    #[test]
    fn extension_defaults_to_webm() {
        assert_eq!(extension_for_mime(""), "webm");
        assert_eq!(extension_for_mime("application/octet-stream"), "webm");
        assert_eq!(extension_for_mime("not a mime"), "webm");
    }

    #[test]
    fn mime_and_extension_roundtrip() {
        for ext in ["wav", "mp3", "ogg", "flac", "webm"] {
            assert_eq!(extension_for_mime(mime_for_extension(ext)), ext);
        }
    }
}
