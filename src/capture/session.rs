//! Capture session lifecycle.
//!
//! One session owns one device stream and produces at most one compressed
//! blob. Chunks arrive asynchronously over the device's queue and are
//! consumed in arrival order when the session is stopped; nothing sent after
//! stop makes it into the blob.

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::device::{CaptureDevice, CaptureError, EncodedBlob, EncodedChunk, DEFAULT_MIME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Stopped,
}

/// Stateful controller for a single recording.
///
/// State machine: `Idle -> Recording -> Stopped`. `start` is rejected while
/// recording, `stop` outside of recording is a no-op, and the device stream
/// is released on every exit path.
pub struct CaptureSession {
    device: Box<dyn CaptureDevice>,
    state: SessionState,
    chunk_rx: Option<mpsc::Receiver<EncodedChunk>>,
}

impl CaptureSession {
    pub fn new(device: Box<dyn CaptureDevice>) -> Self {
        Self {
            device,
            state: SessionState::Idle,
            chunk_rx: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Acquire the device stream and begin accumulating chunks.
    ///
    /// A second `start` while recording is rejected, not queued: exactly one
    /// device stream may be live per session.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.state == SessionState::Recording {
            warn!("capture already in progress, rejecting re-entrant start");
            return Err(CaptureError::AlreadyRecording);
        }

        let rx = self.device.start().await?;
        self.chunk_rx = Some(rx);
        self.state = SessionState::Recording;

        info!("capture started on {}", self.device.name());
        Ok(())
    }

    /// Stop recording and return the accumulated blob.
    ///
    /// The device stream is released before anything else so the microphone
    /// goes dark immediately; a release failure is logged, never propagated.
    /// Returns `None` when the session was not recording or accumulated zero
    /// bytes of audio.
    pub async fn stop(&mut self) -> Option<EncodedBlob> {
        if self.state != SessionState::Recording {
            return None;
        }
        self.state = SessionState::Stopped;

        if let Err(e) = self.device.stop().await {
            warn!("device release failed: {}", e);
        }

        let chunks = self.drain_chunks().await;
        if chunks.is_empty() {
            info!("empty capture, nothing to emit");
            return None;
        }

        let mime = chunks
            .first()
            .map(|c| c.mime.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME.to_string());

        let mut data = Vec::with_capacity(chunks.iter().map(|c| c.data.len()).sum());
        for chunk in chunks {
            data.extend_from_slice(&chunk.data);
        }

        info!("capture stopped: {} byte {} blob", data.len(), mime);
        Some(EncodedBlob { data, mime })
    }

    /// Tear down a session without producing a blob. Used when the user
    /// cancels: the device is released and accumulated chunks are discarded.
    pub async fn abort(&mut self) {
        if self.state != SessionState::Recording {
            return;
        }
        self.state = SessionState::Stopped;

        if let Err(e) = self.device.stop().await {
            warn!("device release failed during abort: {}", e);
        }
        self.chunk_rx = None;

        info!("capture aborted, chunks discarded");
    }

    /// Consume everything buffered in the chunk queue, in arrival order.
    /// Empty chunks are discarded. Closing the receiver first guarantees
    /// nothing sent after this point is observed.
    async fn drain_chunks(&mut self) -> Vec<EncodedChunk> {
        let mut chunks = Vec::new();

        if let Some(mut rx) = self.chunk_rx.take() {
            rx.close();
            while let Some(chunk) = rx.recv().await {
                if chunk.data.is_empty() {
                    continue;
                }
                chunks.push(chunk);
            }
        }

        chunks
    }
}
