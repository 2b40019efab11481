//! Pipeline state machine and shared application state.
//!
//! [`PipelineState`] tracks where an identify cycle is; [`AppState`] holds
//! it together with the last answer and error so any observer (the binary's
//! log line, a future UI) reads one snapshot.

use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::sender::RecognitionResult;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// States of one record → identify cycle.
///
/// ```text
/// Idle ──identify──▶ Recording ──clip encoded──▶ Identifying ──answer──▶ Result
/// Recording / Identifying ──error──▶ Error
/// Result / Error ──next cycle──▶ Recording
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing has run yet.
    #[default]
    Idle,

    /// A capture session is accumulating frames.
    Recording,

    /// The encoded clip is with the sender.
    Identifying,

    /// The service answered (match or no match).
    Result,

    /// Capture or send failed; see [`AppState::error_message`].
    Error,
}

impl PipelineState {
    /// Returns `true` while a cycle is in flight.
    ///
    /// ```
    /// use clip_capture::pipeline::PipelineState;
    ///
    /// assert!(!PipelineState::Idle.is_busy());
    /// assert!(PipelineState::Recording.is_busy());
    /// assert!(PipelineState::Identifying.is_busy());
    /// assert!(!PipelineState::Result.is_busy());
    /// assert!(!PipelineState::Error.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, PipelineState::Recording | PipelineState::Identifying)
    }

    /// Short human-readable label for status output.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Recording => "Listening",
            PipelineState::Identifying => "Identifying",
            PipelineState::Result => "Done",
            PipelineState::Error => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Snapshot of the identify pipeline.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: PipelineState,

    /// Answer of the most recent successful cycle.
    pub last_result: Option<RecognitionResult>,

    /// Audio length of the most recent clip, in seconds.
    pub recording_secs: f64,

    pub config: AppConfig,

    /// Set when `pipeline == PipelineState::Error`.
    pub error_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            pipeline: PipelineState::Idle,
            last_result: None,
            recording_secs: 0.0,
            config,
            error_message: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].  Do not hold the lock across
/// `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

pub fn new_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(AppState::new(config)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
