pub mod decode;
pub mod resample;
pub mod transcode;
pub mod wav;

pub use decode::DecodedAudio;
pub use resample::ResampledAudio;
pub use transcode::{transcode, AudioAsset, FallbackAsset};
pub use wav::{encode_wav, quantize_sample, WavAsset, WAV_MIME};
