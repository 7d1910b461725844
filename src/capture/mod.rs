//! Audio capture: device abstraction and session lifecycle.
//!
//! A [`CaptureSession`] owns one [`CaptureDevice`] stream, accumulates the
//! encoded chunks it produces, and yields a single compressed blob at stop.

pub mod device;
pub mod file;
pub mod microphone;
pub mod session;

pub use device::{
    extension_for_mime, mime_for_extension, CaptureDevice, CaptureError, EncodedBlob,
    EncodedChunk, DEFAULT_MIME,
};
pub use file::FileDevice;
pub use microphone::MicrophoneDevice;
pub use session::{CaptureSession, SessionState};
