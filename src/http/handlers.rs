use super::state::AppState;
use crate::capture::{
    mime_for_extension, CaptureError, CaptureSession, EncodedBlob, MicrophoneDevice, DEFAULT_MIME,
};
use crate::history::ClassificationRecord;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CaptureStatusResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ClassificationResponse {
    pub status: String,
    /// Whether the submitted asset was a transcoded WAV (false = original
    /// container fallback).
    pub converted: bool,
    pub record: Option<ClassificationRecord>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /capture/start
/// Acquire the microphone and begin accumulating chunks
pub async fn start_capture(State(state): State<AppState>) -> impl IntoResponse {
    let mut recorder = state.recorder.lock().await;

    if recorder.as_ref().map(|s| s.is_recording()).unwrap_or(false) {
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "capture already in progress".to_string(),
            }),
        )
            .into_response();
    }

    let mut session = CaptureSession::new(Box::new(MicrophoneDevice::new()));

    if let Err(e) = session.start().await {
        error!("failed to start capture: {}", e);
        let status = match e {
            CaptureError::DeviceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CaptureError::AlreadyRecording => StatusCode::CONFLICT,
            CaptureError::Device(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        return (
            status,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response();
    }

    *recorder = Some(session);
    info!("capture session started");

    (
        StatusCode::OK,
        Json(CaptureStatusResponse {
            status: "recording".to_string(),
            message: "capture started".to_string(),
        }),
    )
        .into_response()
}

/// POST /capture/stop
/// Stop the session, transcode the blob, classify it, append to history
pub async fn stop_capture(State(state): State<AppState>) -> impl IntoResponse {
    let session = {
        let mut recorder = state.recorder.lock().await;
        recorder.take()
    };

    let Some(mut session) = session else {
        // Stop without an active capture is a no-op.
        return (
            StatusCode::OK,
            Json(ClassificationResponse {
                status: "idle".to_string(),
                converted: false,
                record: None,
            }),
        )
            .into_response();
    };

    // History timestamps are capture-completion time, not classification
    // time, so take it before the network call.
    let captured_at = Utc::now();

    let Some(blob) = session.stop().await else {
        info!("capture stopped with no audio, skipping submission");
        return (
            StatusCode::OK,
            Json(ClassificationResponse {
                status: "empty".to_string(),
                converted: false,
                record: None,
            }),
        )
            .into_response();
    };

    classify_blob(&state, blob, captured_at).await
}

/// POST /capture/cancel
/// Release the device and discard whatever was captured
pub async fn cancel_capture(State(state): State<AppState>) -> impl IntoResponse {
    let session = {
        let mut recorder = state.recorder.lock().await;
        recorder.take()
    };

    if let Some(mut session) = session {
        session.abort().await;
    }

    (
        StatusCode::OK,
        Json(CaptureStatusResponse {
            status: "cancelled".to_string(),
            message: "capture discarded".to_string(),
        }),
    )
        .into_response()
}

/// POST /classify
/// The "file selected" trigger: classify an uploaded audio file
pub async fn classify_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut blob: Option<EncodedBlob> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("audio") && field.file_name().is_none() {
            continue;
        }

        let mime = field
            .content_type()
            .map(|m| m.to_string())
            .or_else(|| {
                field
                    .file_name()
                    .and_then(|n| n.rsplit('.').next())
                    .map(|ext| mime_for_extension(ext).to_string())
            })
            .unwrap_or_else(|| DEFAULT_MIME.to_string());

        match field.bytes().await {
            Ok(bytes) if !bytes.is_empty() => {
                blob = Some(EncodedBlob {
                    data: bytes.to_vec(),
                    mime,
                });
                break;
            }
            Ok(_) => {}
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("failed to read upload: {e}"),
                    }),
                )
                    .into_response();
            }
        }
    }

    let Some(blob) = blob else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No audio file provided".to_string(),
            }),
        )
            .into_response();
    };

    classify_blob(&state, blob, Utc::now()).await
}

/// GET /history
pub async fn get_history(State(state): State<AppState>) -> impl IntoResponse {
    let records = state.history.all().await;
    (StatusCode::OK, Json(records)).into_response()
}

/// DELETE /history
pub async fn clear_history(State(state): State<AppState>) -> impl IntoResponse {
    match state.history.clear().await {
        Ok(()) => (
            StatusCode::OK,
            Json(CaptureStatusResponse {
                status: "cleared".to_string(),
                message: "history cleared".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("failed to clear history: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "failed to clear history".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// ============================================================================
// Shared classification path
// ============================================================================

/// Transcode a blob, submit it, persist the record. Transcode failures are
/// absorbed into the fallback asset; only classifier failures surface.
async fn classify_blob(
    state: &AppState,
    blob: EncodedBlob,
    captured_at: DateTime<Utc>,
) -> axum::response::Response {
    let target_rate = state.target_sample_rate;

    let asset = match tokio::task::spawn_blocking(move || {
        crate::audio::transcode(blob, target_rate)
    })
    .await
    {
        Ok(asset) => asset,
        Err(e) => {
            error!("transcode task panicked: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal transcoding failure".to_string(),
                }),
            )
                .into_response();
        }
    };

    let converted = asset.is_wav();

    let prediction = match state.classifier.classify(&asset).await {
        Ok(p) => p,
        Err(e) => {
            error!("classification failed: {}", e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let record = ClassificationRecord::new(prediction, captured_at);

    if let Err(e) = state.history.append(record.clone()).await {
        error!("failed to persist history record: {:#}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "failed to persist classification record".to_string(),
            }),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(ClassificationResponse {
            status: "classified".to_string(),
            converted,
            record: Some(record),
        }),
    )
        .into_response()
}
