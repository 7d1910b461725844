//! File-backed capture device for the "file selected" flow.
//!
//! Streams an existing audio file through the same chunk queue a live
//! device would use, so uploads and recordings share one session lifecycle.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::device::{mime_for_extension, CaptureDevice, CaptureError, EncodedChunk};

const CHUNK_BYTES: usize = 32 * 1024;

pub struct FileDevice {
    path: PathBuf,
    task: Option<JoinHandle<()>>,
}

impl FileDevice {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            task: None,
        }
    }
}

#[async_trait]
impl CaptureDevice for FileDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<EncodedChunk>, CaptureError> {
        if self.task.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let data = tokio::fs::read(&self.path).await.map_err(|e| {
            CaptureError::DeviceUnavailable(format!("cannot read {}: {e}", self.path.display()))
        })?;

        let mime = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(mime_for_extension)
            .unwrap_or_else(|| mime_for_extension(""))
            .to_string();

        info!(
            "streaming {} ({} bytes, {}) in {} byte chunks",
            self.path.display(),
            data.len(),
            mime,
            CHUNK_BYTES
        );

        // Size the queue to the whole file so the feeder never blocks on a
        // session that has not drained yet.
        let chunk_count = data.len() / CHUNK_BYTES + 1;
        let (tx, rx) = mpsc::channel(chunk_count);

        self.task = Some(tokio::spawn(async move {
            for piece in data.chunks(CHUNK_BYTES) {
                let chunk = EncodedChunk {
                    data: piece.to_vec(),
                    mime: mime.clone(),
                };
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| CaptureError::Device(e.to_string()))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file stream"
    }
}
