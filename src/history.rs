//! Persisted classification history.
//!
//! Append-only and user-clearable. Records are never mutated once written;
//! at most one classification completes at a time, so a single mutex over
//! the in-memory list is enough.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::classify::Prediction;

/// One finished classification.
///
/// `timestamp` is capture-completion time, not classification-request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub id: Uuid,
    pub genre: String,
    pub confidence: f32,
    pub top_3: Vec<(String, f32)>,
    pub timestamp: DateTime<Utc>,
}

impl ClassificationRecord {
    pub fn new(prediction: Prediction, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            genre: prediction.genre,
            confidence: prediction.confidence,
            top_3: prediction.top_3,
            timestamp,
        }
    }
}

/// File-backed history store (one JSON document).
pub struct HistoryStore {
    path: PathBuf,
    records: Mutex<Vec<ClassificationRecord>>,
}

impl HistoryStore {
    /// Open the store at `path`, loading any existing records. A missing
    /// file is an empty history.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records: Vec<ClassificationRecord> = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read history file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("history file {} is corrupt", path.display()))?
        } else {
            Vec::new()
        };

        info!(
            "history store opened: {} ({} records)",
            path.display(),
            records.len()
        );

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub async fn append(&self, record: ClassificationRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        records.push(record);
        self.persist(&records)
    }

    pub async fn all(&self) -> Vec<ClassificationRecord> {
        self.records.lock().await.clone()
    }

    pub async fn clear(&self) -> Result<()> {
        let mut records = self.records.lock().await;
        records.clear();
        self.persist(&records)
    }

    fn persist(&self, records: &[ClassificationRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("failed to create history directory")?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;

        // Write-then-rename so a crash mid-write cannot truncate the
        // existing history.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("failed to write history file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace history file {}", self.path.display()))
    }
}
