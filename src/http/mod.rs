//! HTTP control API for the view layer.
//!
//! The UI talks to the core only through these narrow triggers:
//! - POST /capture/start - acquire the microphone
//! - POST /capture/stop - stop, transcode, classify, record to history
//! - POST /capture/cancel - release the device, discard the capture
//! - POST /classify - classify an uploaded file ("file selected")
//! - GET /history, DELETE /history - read or clear past classifications
//! - GET /health - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
