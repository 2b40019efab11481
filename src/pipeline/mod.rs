//! Identify pipeline: capture session → encoder → sender, with shared
//! state for observers.
//!
//! # Architecture
//!
//! ```text
//! PipelineOrchestrator::identify(source, cancel)
//!        │
//!        ├─ session::record_clip     → Recording
//!        ├─ Sender::recognize        → Identifying
//!        └─ RecognitionResult        → Result   (or Error)
//!
//! SharedState (Arc<Mutex<AppState>>) ←─── read by observers
//! ```

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{PipelineError, PipelineOrchestrator};
pub use state::{new_shared_state, AppState, PipelineState, SharedState};
