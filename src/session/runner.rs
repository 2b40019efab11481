//! One-call capture: start → wait → stop → encode.

use std::time::Duration;

use crate::audio::FrameSource;
use crate::encode::{encode, EncodedContainer};
use crate::error::CaptureError;

use super::accumulator::CaptureSession;
use super::cancel::CancelToken;
use super::sink::StopReason;

/// A finished recording ready for a [`Sender`](crate::sender::Sender).
#[derive(Debug, Clone)]
pub struct Recording {
    pub container: EncodedContainer,
    pub stop_reason: StopReason,
    /// Wall-clock length of the session.
    pub elapsed: Duration,
}

/// Record `duration_secs` of audio from `source` and encode it as WAV.
///
/// The source stays owned by the caller and is left `Opened` (stream
/// released) on every exit path.  A cancellation still produces a
/// container from whatever was captured before the cancel.
///
/// # Errors
///
/// Any [`CaptureError`] from starting, waiting or encoding; a mid-stream
/// source failure yields [`CaptureError::SourceFailedMidStream`] and no
/// container.
pub async fn record_clip<S: FrameSource>(
    source: &mut S,
    duration_secs: f64,
    cancel: &CancelToken,
) -> Result<Recording, CaptureError> {
    let mut session = CaptureSession::start(source, duration_secs)?;
    let stop_reason = session.wait(cancel).await?;
    let descriptor = *session.descriptor();
    let elapsed = session.elapsed();
    let buffer = session.into_buffer()?;

    let container = encode(buffer.as_slice(), &descriptor)?;
    log::debug!(
        "session: encoded {} samples into {} bytes",
        buffer.len(),
        container.len()
    );

    Ok(Recording {
        container,
        stop_reason,
        elapsed,
    })
}
