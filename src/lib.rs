pub mod audio;
pub mod capture;
pub mod classify;
pub mod config;
pub mod history;
pub mod http;

pub use audio::{
    encode_wav, quantize_sample, transcode, AudioAsset, DecodedAudio, FallbackAsset,
    ResampledAudio, WavAsset, WAV_MIME,
};
pub use capture::{
    CaptureDevice, CaptureError, CaptureSession, EncodedBlob, EncodedChunk, FileDevice,
    MicrophoneDevice, SessionState,
};
pub use classify::{ClassifierClient, ClassifyError, Prediction};
pub use config::Config;
pub use history::{ClassificationRecord, HistoryStore};
pub use http::{create_router, AppState};
