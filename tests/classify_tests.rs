// Integration tests for the classifier adapter, against an in-process stub
// server speaking the classifier's wire format.

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use genrecast::{AudioAsset, ClassifierClient, ClassifyError, FallbackAsset, WavAsset};
use serde_json::json;

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn wav_asset() -> AudioAsset {
    AudioAsset::Wav(WavAsset::new(genrecast::encode_wav(&[0.0; 100], 22050, 1).unwrap()))
}

#[tokio::test]
async fn successful_prediction_is_parsed() {
    let router = Router::new().route(
        "/predict",
        post(|mut multipart: Multipart| async move {
            // The request must carry exactly one field named "audio" with
            // the filename and MIME produced by the orchestrator.
            let field = multipart.next_field().await.unwrap().expect("audio field");
            assert_eq!(field.name(), Some("audio"));
            assert_eq!(field.file_name(), Some("recording.wav"));
            assert_eq!(field.content_type(), Some("audio/wav"));
            let bytes = field.bytes().await.unwrap();
            assert_eq!(&bytes[0..4], b"RIFF");

            Json(json!({
                "genre": "metal",
                "confidence": 0.91,
                "top_3": [["metal", 0.91], ["rock", 0.06], ["punk", 0.02]]
            }))
        }),
    );
    let base_url = spawn_stub(router).await;

    let client = ClassifierClient::new(base_url, 5);
    let prediction = client.classify(&wav_asset()).await.unwrap();

    assert_eq!(prediction.genre, "metal");
    assert!((prediction.confidence - 0.91).abs() < 1e-6);
    assert_eq!(prediction.top_3.len(), 3);
    assert_eq!(prediction.top_3[0].0, "metal");
}

#[tokio::test]
async fn fallback_asset_is_submitted_with_original_type() {
    let router = Router::new().route(
        "/predict",
        post(|mut multipart: Multipart| async move {
            let field = multipart.next_field().await.unwrap().expect("audio field");
            assert_eq!(field.file_name(), Some("recording.webm"));
            assert_eq!(field.content_type(), Some("audio/webm"));
            Json(json!({"genre": "pop", "confidence": 0.4, "top_3": []}))
        }),
    );
    let base_url = spawn_stub(router).await;

    let asset = AudioAsset::Fallback(FallbackAsset {
        bytes: vec![1, 2, 3],
        filename: "recording.webm".to_string(),
        mime: "audio/webm".to_string(),
    });

    let client = ClassifierClient::new(base_url, 5);
    let prediction = client.classify(&asset).await.unwrap();
    assert_eq!(prediction.genre, "pop");
}

#[tokio::test]
async fn server_error_string_is_surfaced_verbatim() {
    let router = Router::new().route(
        "/predict",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Could not decode audio. Try a different file."})),
            )
                .into_response()
        }),
    );
    let base_url = spawn_stub(router).await;

    let client = ClassifierClient::new(base_url, 5);
    match client.classify(&wav_asset()).await {
        Err(ClassifyError::Server { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Could not decode audio. Try a different file.");
        }
        other => panic!("expected Server error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    // Nothing listens on this port.
    let client = ClassifierClient::new("http://127.0.0.1:9", 1);
    match client.classify(&wav_asset()).await {
        Err(ClassifyError::Request(_)) | Err(ClassifyError::Timeout) => {}
        other => panic!("expected Request error, got {other:?}"),
    }
}
