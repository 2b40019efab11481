//! The push side of a capture session.
//!
//! A [`FrameSink`] is handed to the source when a session starts.  Every
//! append and the session's stop latch go through one mutex, so a frame is
//! either fully appended before the stop is latched or rejected after it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::Notify;

use crate::audio::{AudioFrame, SampleBuffer};
use crate::error::CaptureError;

// ---------------------------------------------------------------------------
// StopReason
// ---------------------------------------------------------------------------

/// What ended a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured duration elapsed.
    Elapsed,
    /// An external [`CancelToken`](super::CancelToken) fired.
    Cancelled,
    /// The owner called [`stop`](super::CaptureSession::stop).
    Requested,
}

// ---------------------------------------------------------------------------
// Shared session state
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Phase {
    Active,
    Stopped(StopReason),
    Failed(String),
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    samples: SampleBuffer,
    frames: u64,
}

/// State shared between the session owner and the delivery context.
#[derive(Debug)]
pub(crate) struct SessionShared {
    inner: Mutex<Inner>,
    notify: Notify,
    sample_rate: u32,
    deadline: Instant,
}

impl SessionShared {
    pub(crate) fn new(sample_rate: u32, deadline: Instant) -> Self {
        Self {
            inner: Mutex::new(Inner {
                phase: Phase::Active,
                samples: SampleBuffer::new(),
                frames: 0,
            }),
            notify: Notify::new(),
            sample_rate,
            deadline,
        }
    }

    /// Lock, recovering from poisoning so the audio thread never panics.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_active(&self) -> bool {
        matches!(self.lock().phase, Phase::Active)
    }

    pub(crate) fn frames(&self) -> u64 {
        self.lock().frames
    }

    pub(crate) fn buffered_samples(&self) -> usize {
        self.lock().samples.len()
    }

    /// Latch the stop (if still active) and take the outcome.
    ///
    /// Returns the reason that actually won the latch, or the failure.
    pub(crate) fn finish(
        &self,
        reason: StopReason,
    ) -> Result<(StopReason, SampleBuffer), CaptureError> {
        let outcome = {
            let mut inner = self.lock();
            let won = match &inner.phase {
                Phase::Active => Ok(reason),
                Phase::Stopped(won) => Ok(*won),
                Phase::Failed(cause) => Err(CaptureError::SourceFailedMidStream(cause.clone())),
            };
            won.map(|won| {
                inner.phase = Phase::Stopped(won);
                (won, std::mem::take(&mut inner.samples))
            })
        };
        self.notify.notify_waiters();
        outcome
    }

    /// Resolve once the session is no longer active.
    pub(crate) async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            if !self.is_active() {
                return;
            }
            notified.await;
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSink
// ---------------------------------------------------------------------------

/// Push callback and error channel handed to a [`FrameSource`].
///
/// Cheap to clone; every clone feeds the same session.  All methods are
/// non-blocking apart from a short uncontended lock and are safe to call
/// from a real-time audio thread.
///
/// [`FrameSource`]: crate::audio::FrameSource
#[derive(Debug, Clone)]
pub struct FrameSink {
    shared: Arc<SessionShared>,
}

impl FrameSink {
    pub(crate) fn new(shared: Arc<SessionShared>) -> Self {
        Self { shared }
    }

    /// A sink attached to no session owner, for driving sources directly.
    #[cfg(test)]
    pub(crate) fn detached(sample_rate: u32) -> Self {
        let deadline = Instant::now() + std::time::Duration::from_secs(3_600);
        Self::new(Arc::new(SessionShared::new(sample_rate, deadline)))
    }

    /// Append one block of mono samples.
    ///
    /// Returns `false` when the frame was rejected because the session has
    /// stopped or failed.  A frame delivered at or after the session deadline
    /// latches the stop itself and is rejected.
    pub fn push(&self, frame: &[f32]) -> bool {
        let mut inner = self.shared.lock();
        if !matches!(inner.phase, Phase::Active) {
            return false;
        }
        if Instant::now() >= self.shared.deadline {
            inner.phase = Phase::Stopped(StopReason::Elapsed);
            drop(inner);
            self.shared.notify.notify_waiters();
            return false;
        }
        inner.samples.push_slice(frame);
        inner.frames += 1;
        true
    }

    /// Append an [`AudioFrame`], failing the session if its sample rate
    /// differs from the rate recorded at session start.
    pub fn push_frame(&self, frame: &AudioFrame) -> bool {
        if frame.sample_rate != self.shared.sample_rate {
            self.fail(format!(
                "sample rate changed mid-session: {} Hz → {} Hz",
                self.shared.sample_rate, frame.sample_rate
            ));
            return false;
        }
        self.push(&frame.samples)
    }

    /// Report a device failure.  If the session is still active it becomes
    /// failed and everything accumulated so far is discarded.
    pub fn fail(&self, cause: impl Into<String>) {
        {
            let mut inner = self.shared.lock();
            if !matches!(inner.phase, Phase::Active) {
                return;
            }
            inner.phase = Phase::Failed(cause.into());
            inner.samples = SampleBuffer::new();
        }
        self.shared.notify.notify_waiters();
    }

    /// `true` while the session accepts frames.
    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }

    /// Sample rate the session was started with.
    pub fn sample_rate(&self) -> u32 {
        self.shared.sample_rate
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn shared(deadline_in: Duration) -> Arc<SessionShared> {
        Arc::new(SessionShared::new(8_000, Instant::now() + deadline_in))
    }

    #[test]
    fn sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FrameSink>();
    }

    #[test]
    fn frames_append_in_arrival_order() {
        let shared = shared(Duration::from_secs(60));
        let sink = FrameSink::new(Arc::clone(&shared));

        assert!(sink.push(&[1.0, 2.0]));
        assert!(sink.push(&[3.0, 4.0]));
        assert!(sink.push(&[5.0]));

        let (reason, buf) = shared.finish(StopReason::Requested).unwrap();
        assert_eq!(reason, StopReason::Requested);
        assert_eq!(buf.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(shared.frames(), 3);
    }

    #[test]
    fn push_after_stop_is_rejected() {
        let shared = shared(Duration::from_secs(60));
        let sink = FrameSink::new(Arc::clone(&shared));

        sink.push(&[1.0]);
        let (_, buf) = shared.finish(StopReason::Requested).unwrap();
        assert!(!sink.push(&[2.0]));
        assert_eq!(buf.as_slice(), &[1.0]);
        assert_eq!(shared.buffered_samples(), 0);
    }

    #[test]
    fn push_past_deadline_latches_elapsed() {
        let shared = shared(Duration::ZERO);
        let sink = FrameSink::new(Arc::clone(&shared));

        assert!(!sink.push(&[1.0]));
        assert!(!sink.is_active());

        // A later explicit stop keeps the reason that won the latch.
        let (reason, buf) = shared.finish(StopReason::Requested).unwrap();
        assert_eq!(reason, StopReason::Elapsed);
        assert!(buf.is_empty());
    }

    #[test]
    fn concurrent_stop_keeps_exactly_the_accepted_frames() {
        let shared = shared(Duration::from_secs(60));
        let sink = FrameSink::new(Arc::clone(&shared));

        let pusher = std::thread::spawn(move || {
            let mut accepted = Vec::new();
            for i in 0..200_000u32 {
                let value = i as f32;
                if sink.push(&[value]) {
                    accepted.push(value);
                }
            }
            accepted
        });

        while shared.frames() < 1_000 && !pusher.is_finished() {
            std::thread::yield_now();
        }
        let (_, buf) = shared.finish(StopReason::Requested).unwrap();
        let accepted = pusher.join().unwrap();

        assert!(!accepted.is_empty());
        assert_eq!(buf.as_slice(), accepted.as_slice());
    }

    #[test]
    fn failure_discards_accumulated_samples() {
        let shared = shared(Duration::from_secs(60));
        let sink = FrameSink::new(Arc::clone(&shared));

        sink.push(&[0.1; 16]);
        sink.push(&[0.2; 16]);
        sink.fail("device lost");

        assert_eq!(shared.buffered_samples(), 0);
        assert_eq!(
            shared.finish(StopReason::Requested),
            Err(CaptureError::SourceFailedMidStream("device lost".into()))
        );
    }

    #[test]
    fn failure_after_stop_is_ignored() {
        let shared = shared(Duration::from_secs(60));
        let sink = FrameSink::new(Arc::clone(&shared));

        sink.push(&[0.5]);
        let first = shared.finish(StopReason::Cancelled).unwrap();
        sink.fail("late error");
        assert_eq!(first.0, StopReason::Cancelled);
        // Latched as stopped, not failed.
        assert!(shared.finish(StopReason::Requested).is_ok());
    }

    #[test]
    fn mismatched_frame_rate_fails_session() {
        let shared = shared(Duration::from_secs(60));
        let sink = FrameSink::new(Arc::clone(&shared));

        assert!(sink.push_frame(&AudioFrame::silence(4, 8_000)));
        assert!(!sink.push_frame(&AudioFrame::silence(4, 16_000)));
        assert!(matches!(
            shared.finish(StopReason::Requested),
            Err(CaptureError::SourceFailedMidStream(_))
        ));
    }

    #[tokio::test]
    async fn stopped_resolves_after_failure() {
        let shared = shared(Duration::from_secs(60));
        let sink = FrameSink::new(Arc::clone(&shared));

        let waiter = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move { shared.stopped().await })
        };
        tokio::task::yield_now().await;
        sink.fail("gone");

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("stopped() should resolve")
            .unwrap();
    }
}
