//! Pipeline orchestrator: record a clip, hand it to the sender, publish the
//! answer.
//!
//! ```text
//! identify(source, cancel)
//!   ├─ record_clip(source, capture.duration_secs)   [Recording]
//!   ├─ Sender::recognize(container)                 [Identifying]
//!   └─ store RecognitionResult                      [Result]
//! any failure ──────────────────────────────────────▶ [Error]
//! ```

use std::sync::{Arc, MutexGuard, PoisonError};

use thiserror::Error;

use crate::audio::FrameSource;
use crate::error::CaptureError;
use crate::sender::{RecognitionResult, SendError, Sender};
use crate::session::{record_clip, CancelToken};

use super::state::{AppState, PipelineState, SharedState};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that can end an identify cycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("identification failed: {0}")]
    Send(#[from] SendError),

    /// The session stopped before any audio arrived.
    #[error("no audio captured")]
    EmptyRecording,
}

// ---------------------------------------------------------------------------
// PipelineOrchestrator
// ---------------------------------------------------------------------------

/// Drives record → identify cycles against one [`Sender`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use clip_capture::audio::{FrameSource, MicSource};
/// use clip_capture::config::AppConfig;
/// use clip_capture::pipeline::{new_shared_state, PipelineOrchestrator};
/// use clip_capture::sender::HttpSender;
/// use clip_capture::session::CancelToken;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = AppConfig::default();
/// let sender = Arc::new(HttpSender::from_config(&config.server));
/// let mut mic = MicSource::open(&config.capture)?;
///
/// let orchestrator = PipelineOrchestrator::new(new_shared_state(config), sender);
/// let result = orchestrator.identify(&mut mic, &CancelToken::new()).await?;
/// println!("{:?}", result.title());
/// # Ok(())
/// # }
/// ```
pub struct PipelineOrchestrator {
    state: SharedState,
    sender: Arc<dyn Sender>,
}

impl PipelineOrchestrator {
    pub fn new(state: SharedState, sender: Arc<dyn Sender>) -> Self {
        Self { state, sender }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Run one cycle on `source`, recording for the configured duration.
    ///
    /// The outcome is also written to the shared state.
    pub async fn identify<S: FrameSource>(
        &self,
        source: &mut S,
        cancel: &CancelToken,
    ) -> Result<RecognitionResult, PipelineError> {
        match self.run_cycle(source, cancel).await {
            Ok(result) => {
                let mut st = self.lock();
                st.pipeline = PipelineState::Result;
                st.last_result = Some(result.clone());
                Ok(result)
            }
            Err(e) => {
                self.set_error(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_cycle<S: FrameSource>(
        &self,
        source: &mut S,
        cancel: &CancelToken,
    ) -> Result<RecognitionResult, PipelineError> {
        let duration = {
            let mut st = self.lock();
            st.pipeline = PipelineState::Recording;
            st.error_message = None;
            st.recording_secs = 0.0;
            st.config.capture.duration_secs
        };
        log::debug!("pipeline: Recording for {duration:.2} s");

        let recording = record_clip(source, duration, cancel).await?;
        if recording.container.sample_count() == 0 {
            return Err(PipelineError::EmptyRecording);
        }

        {
            let mut st = self.lock();
            st.recording_secs = recording.container.duration_secs();
            st.pipeline = PipelineState::Identifying;
        }
        log::debug!(
            "pipeline: Identifying {:.2} s clip (stopped: {:?})",
            recording.container.duration_secs(),
            recording.stop_reason
        );

        let result = self.sender.recognize(&recording.container).await?;
        Ok(result)
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_error(&self, message: String) {
        log::error!("pipeline error: {message}");
        let mut st = self.lock();
        st.pipeline = PipelineState::Error;
        st.error_message = Some(message);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
