//! Outbound classifier adapter.
//!
//! Submits the finished audio asset as a single multipart field to the
//! remote classifier's `/predict` endpoint and maps the JSON response into
//! a [`Prediction`]. No automatic retry: a failed submission requires the
//! user to re-trigger capture or upload.

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::audio::AudioAsset;

/// Errors surfaced by the classifier call. Only these (and device
/// acquisition failures) are ever user-visible.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier request failed: {0}")]
    Request(String),

    #[error("classifier request timed out")]
    Timeout,

    #[error("classifier returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("failed to parse classifier response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ClassifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClassifyError::Timeout
        } else {
            ClassifyError::Request(e.to_string())
        }
    }
}

/// A genre prediction: the winning label, its confidence, and the ranked
/// runner-up list as returned by the model (descending by score).
#[derive(Debug, Clone)]
pub struct Prediction {
    pub genre: String,
    pub confidence: f32,
    pub top_3: Vec<(String, f32)>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    genre: String,
    confidence: f32,
    #[serde(default)]
    top_3: Vec<(String, f32)>,
}

#[derive(Debug, Deserialize)]
struct ServerErrorResponse {
    error: String,
}

pub struct ClassifierClient {
    client: reqwest::Client,
    base_url: String,
}

impl ClassifierClient {
    /// Build a client for the classifier at `base_url` with a per-request
    /// timeout. Falls back to a default client if the builder fails, which
    /// does not happen with these options in practice.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Submit `asset` and return the prediction.
    ///
    /// Non-2xx responses surface the server's `error` string verbatim when
    /// one is present.
    pub async fn classify(&self, asset: &AudioAsset) -> Result<Prediction, ClassifyError> {
        let part = reqwest::multipart::Part::bytes(asset.bytes().to_vec())
            .file_name(asset.filename().to_string())
            .mime_str(asset.mime())
            .map_err(|e| ClassifyError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let url = format!("{}/predict", self.base_url);
        info!(
            "submitting {} ({} bytes) to {}",
            asset.filename(),
            asset.bytes().len(),
            url
        );

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ServerErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| "classifier returned an unreadable error".to_string());
            return Err(ClassifyError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = response
            .json::<PredictResponse>()
            .await
            .map_err(|e| ClassifyError::Parse(e.to_string()))?;

        info!(
            "classified as {} ({:.1}%)",
            parsed.genre,
            parsed.confidence * 100.0
        );

        Ok(Prediction {
            genre: parsed.genre,
            confidence: parsed.confidence,
            top_3: parsed.top_3,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_response_parses_top3_pairs() {
        let json = r#"{
            "genre": "jazz",
            "confidence": 0.82,
            "top_3": [["jazz", 0.82], ["blues", 0.11], ["rock", 0.04]]
        }"#;
        let parsed: PredictResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.genre, "jazz");
        assert_eq!(parsed.top_3.len(), 3);
        assert_eq!(parsed.top_3[1].0, "blues");
        assert!(parsed.top_3[0].1 >= parsed.top_3[1].1);
    }

    #[test]
    fn predict_response_tolerates_missing_top3() {
        let parsed: PredictResponse =
            serde_json::from_str(r#"{"genre": "pop", "confidence": 0.5}"#).unwrap();
        assert!(parsed.top_3.is_empty());
    }
}
