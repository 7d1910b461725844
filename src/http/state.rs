use std::sync::Arc;
use tokio::sync::Mutex;

use crate::capture::CaptureSession;
use crate::classify::ClassifierClient;
use crate::history::HistoryStore;

/// Shared application state for HTTP handlers.
///
/// Sessions are sequential by design: a single slot holds the active
/// capture, and the mutex serializes every lifecycle transition.
#[derive(Clone)]
pub struct AppState {
    pub recorder: Arc<Mutex<Option<CaptureSession>>>,
    pub classifier: Arc<ClassifierClient>,
    pub history: Arc<HistoryStore>,
    pub target_sample_rate: u32,
}

impl AppState {
    pub fn new(
        classifier: ClassifierClient,
        history: HistoryStore,
        target_sample_rate: u32,
    ) -> Self {
        Self {
            recorder: Arc::new(Mutex::new(None)),
            classifier: Arc::new(classifier),
            history: Arc::new(history),
            target_sample_rate,
        }
    }
}
