//! Live microphone capture via cpal.
//!
//! cpal streams are not `Send`, so the stream lives on a dedicated worker
//! thread for the whole session. The worker accumulates raw f32 samples from
//! the callback and flushes a single WAV-framed chunk into the session's
//! queue when stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::device::{CaptureDevice, CaptureError, EncodedChunk};
use crate::audio::{encode_wav, WAV_MIME};

pub struct MicrophoneDevice {
    stop_flag: Option<Arc<AtomicBool>>,
    worker: Option<JoinHandle<()>>,
}

impl MicrophoneDevice {
    pub fn new() -> Self {
        Self {
            stop_flag: None,
            worker: None,
        }
    }
}

impl Default for MicrophoneDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for MicrophoneDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<EncodedChunk>, CaptureError> {
        if self.worker.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(16);
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), CaptureError>>();
        let stop_flag = Arc::new(AtomicBool::new(false));

        let worker_stop = Arc::clone(&stop_flag);
        let worker = std::thread::spawn(move || capture_loop(worker_stop, chunk_tx, ready_tx));

        // Stream setup happens on the worker; wait for its verdict without
        // blocking the runtime.
        let setup = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| CaptureError::Device(e.to_string()))?
            .map_err(|_| {
                CaptureError::DeviceUnavailable("capture thread exited during setup".to_string())
            })?;

        if let Err(e) = setup {
            // Worker already bailed out; reap it so the thread doesn't leak.
            let _ = worker.join();
            return Err(e);
        }

        self.stop_flag = Some(stop_flag);
        self.worker = Some(worker);
        Ok(chunk_rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(flag) = self.stop_flag.take() {
            flag.store(true, Ordering::Relaxed);
        }

        if let Some(worker) = self.worker.take() {
            tokio::task::spawn_blocking(move || worker.join())
                .await
                .map_err(|e| CaptureError::Device(e.to_string()))?
                .map_err(|_| CaptureError::Device("capture thread panicked".to_string()))?;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "default input device (cpal)"
    }
}

impl Drop for MicrophoneDevice {
    fn drop(&mut self) {
        // Teardown while still recording: signal the worker and let it wind
        // down on its own. The flushed chunk lands in a closed queue and is
        // dropped, so nothing is emitted.
        if let Some(flag) = self.stop_flag.take() {
            flag.store(true, Ordering::Relaxed);
        }
    }
}

fn capture_loop(
    stop_flag: Arc<AtomicBool>,
    chunk_tx: mpsc::Sender<EncodedChunk>,
    ready_tx: std_mpsc::Sender<Result<(), CaptureError>>,
) {
    let host = cpal::default_host();

    let device = match host.default_input_device() {
        Some(d) => d,
        None => {
            let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable(
                "no input device on the default audio host".to_string(),
            )));
            return;
        }
    };

    let supported = match device.default_input_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = ready_tx.send(Err(CaptureError::DeviceUnavailable(e.to_string())));
            return;
        }
    };

    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let config: cpal::StreamConfig = supported.into();

    let (sample_tx, sample_rx) = std_mpsc::channel::<Vec<f32>>();

    let stream = match device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // Receiver lives on this same worker; send errors mean shutdown.
            let _ = sample_tx.send(data.to_vec());
        },
        |err: cpal::StreamError| {
            error!("cpal stream error: {}", err);
        },
        None,
    ) {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(CaptureError::Device(e.to_string())));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(CaptureError::Device(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));
    info!(
        "microphone stream open: {} Hz, {} channels",
        sample_rate, channels
    );

    let mut samples: Vec<f32> = Vec::new();
    while !stop_flag.load(Ordering::Relaxed) {
        match sample_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(buf) => samples.extend(buf),
            Err(std_mpsc::RecvTimeoutError::Timeout) => {}
            Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    // Release the hardware stream before flushing so the microphone
    // indicator disappears immediately.
    drop(stream);

    // Collect whatever the callback queued before the stream closed.
    while let Ok(buf) = sample_rx.try_recv() {
        samples.extend(buf);
    }

    if samples.is_empty() {
        info!("microphone produced no samples");
        return;
    }

    match encode_wav(&samples, sample_rate, channels) {
        Ok(data) => {
            info!("flushing {} byte WAV chunk from microphone", data.len());
            let _ = chunk_tx.blocking_send(EncodedChunk {
                data,
                mime: WAV_MIME.to_string(),
            });
        }
        Err(e) => warn!("failed to frame captured samples: {:#}", e),
    }
}
