//! Frame accumulator — one bounded capture session against a source.
//!
//! [`CaptureSession`] borrows a caller-owned [`FrameSource`] exclusively,
//! starts it with a [`FrameSink`], and collects every delivered frame into a
//! [`SampleBuffer`] until the session stops.
//!
//! # Stop triggers
//!
//! ```text
//! deadline timer ─┐
//! CancelToken ────┼─▶ latch (first wins) ─▶ source.stop() ─▶ SampleBuffer
//! stop() ─────────┤
//! source error ───┘   (failure discards the buffer → SourceFailedMidStream)
//! ```
//!
//! Finalisation runs exactly once; later calls return the stored outcome.
//! The source is stopped on every exit path, including drop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::audio::{FrameSource, SampleBuffer, SourceState};
use crate::encode::ContainerDescriptor;
use crate::error::CaptureError;

use super::cancel::CancelToken;
use super::sink::{FrameSink, SessionShared, StopReason};

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

/// An in-progress (or finished) capture session.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use clip_capture::audio::{FrameSource, ReplayConfig, ReplaySource};
/// use clip_capture::session::{CancelToken, CaptureSession, StopReason};
///
/// # async fn run() -> Result<(), clip_capture::CaptureError> {
/// let config = ReplayConfig::from_blocks(8_000, vec![vec![0.0; 400]; 10], Duration::from_millis(50));
/// let mut source = ReplaySource::open(&config)?;
///
/// let mut session = CaptureSession::start(&mut source, 0.2)?;
/// assert_eq!(session.wait(&CancelToken::new()).await?, StopReason::Elapsed);
/// let samples = session.into_buffer()?;
/// # Ok(())
/// # }
/// ```
pub struct CaptureSession<'a, S: FrameSource> {
    source: &'a mut S,
    shared: Arc<SessionShared>,
    descriptor: ContainerDescriptor,
    started_at: Instant,
    deadline: Instant,
    /// `Some` once finalised.
    outcome: Option<Result<SampleBuffer, CaptureError>>,
    stop_reason: Option<StopReason>,
    /// Set once the source has been released.
    released: bool,
}

impl<'a, S: FrameSource> CaptureSession<'a, S> {
    /// Start accumulating frames from `source` for `duration_secs` seconds.
    ///
    /// Does not block.  The container descriptor is fixed here from the
    /// source's sample rate.
    ///
    /// # Errors
    ///
    /// * [`CaptureError::SourceBusy`] — the source is already active.
    /// * [`CaptureError::SourceUnavailable`] — the source is closed or
    ///   refused to start.
    /// * [`CaptureError::InvalidDescriptor`] — the source reports a zero
    ///   sample rate, or `duration_secs` is not a positive finite number.
    pub fn start(source: &'a mut S, duration_secs: f64) -> Result<Self, CaptureError> {
        match source.state() {
            SourceState::Opened => {}
            SourceState::Active => return Err(CaptureError::SourceBusy),
            SourceState::Closed => {
                return Err(CaptureError::SourceUnavailable(
                    "source has been closed".into(),
                ))
            }
        }

        let duration = Duration::try_from_secs_f64(duration_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| {
                CaptureError::InvalidDescriptor(format!(
                    "capture duration must be positive, got {duration_secs}"
                ))
            })?;

        let descriptor = ContainerDescriptor::new(source.sample_rate())?;

        let started_at = Instant::now();
        let deadline = started_at + duration;
        let shared = Arc::new(SessionShared::new(descriptor.sample_rate, deadline));

        if let Err(e) = source.start(FrameSink::new(Arc::clone(&shared))) {
            source.stop();
            return Err(e);
        }

        log::info!(
            "session: started ({} Hz, {:.2}s)",
            descriptor.sample_rate,
            duration.as_secs_f64()
        );

        Ok(Self {
            source,
            shared,
            descriptor,
            started_at,
            deadline,
            outcome: None,
            stop_reason: None,
            released: false,
        })
    }

    /// Suspend until the deadline passes, `cancel` fires or the source fails
    /// (whichever comes first), then finalise.
    ///
    /// Returns immediately with the stored outcome if the session has
    /// already finished.
    pub async fn wait(&mut self, cancel: &CancelToken) -> Result<StopReason, CaptureError> {
        let deadline = tokio::time::Instant::from_std(self.deadline);

        let trigger = tokio::select! {
            _ = tokio::time::sleep_until(deadline) => StopReason::Elapsed,
            _ = cancel.cancelled() => StopReason::Cancelled,
            // Latched by the sink (deadline or failure); the latched reason wins.
            _ = self.shared.stopped() => StopReason::Requested,
        };

        self.finalize(trigger)?;
        Ok(self.stop_reason.unwrap_or(trigger))
    }

    /// Stop the session and return the finalised buffer.
    ///
    /// Idempotent: later calls return the same buffer (or the same error)
    /// without touching the source again.
    pub fn stop(&mut self) -> Result<&SampleBuffer, CaptureError> {
        self.finalize(StopReason::Requested)
    }

    /// Stop (if not already stopped) and move the buffer out.
    pub fn into_buffer(mut self) -> Result<SampleBuffer, CaptureError> {
        match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.finish_now(StopReason::Requested),
        }
    }

    /// Descriptor recorded at start; every container from this session uses it.
    pub fn descriptor(&self) -> &ContainerDescriptor {
        &self.descriptor
    }

    /// What ended the session, once it has ended successfully.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// `true` while frames are still being accepted.
    pub fn is_active(&self) -> bool {
        self.outcome.is_none() && self.shared.is_active()
    }

    /// Frames appended so far.
    pub fn frames_received(&self) -> u64 {
        self.shared.frames()
    }

    /// Wall-clock time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    // -----------------------------------------------------------------------
    // Finalisation
    // -----------------------------------------------------------------------

    fn finalize(&mut self, reason: StopReason) -> Result<&SampleBuffer, CaptureError> {
        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.finish_now(reason),
        };
        self.outcome.insert(outcome).as_ref().map_err(Clone::clone)
    }

    /// Latch the stop, release the source and take the outcome.
    fn finish_now(&mut self, reason: StopReason) -> Result<SampleBuffer, CaptureError> {
        let result = self.shared.finish(reason);
        self.release_source();

        match result {
            Ok((won, buffer)) => {
                log::info!(
                    "session: stopped ({won:?}) after {:.2}s with {} samples",
                    self.started_at.elapsed().as_secs_f64(),
                    buffer.len()
                );
                self.stop_reason = Some(won);
                Ok(buffer)
            }
            Err(e) => {
                log::warn!("session: {e}");
                Err(e)
            }
        }
    }

    fn release_source(&mut self) {
        if !self.released {
            self.source.stop();
            self.released = true;
        }
    }
}

impl<S: FrameSource> Drop for CaptureSession<'_, S> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.shared.finish(StopReason::Requested);
            self.release_source();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ReplayConfig, ReplaySource};

    const RATE: u32 = 8_000;

    fn replay(blocks: Vec<Vec<f32>>, interval_ms: u64) -> ReplaySource {
        let config = ReplayConfig::from_blocks(RATE, blocks, Duration::from_millis(interval_ms));
        ReplaySource::open(&config).unwrap()
    }

    /// Source whose `start` always fails, as a device with revoked
    /// permission would.
    struct DeniedSource {
        stops: usize,
    }

    impl FrameSource for DeniedSource {
        type Config = ();

        fn open(_: &()) -> Result<Self, CaptureError> {
            Ok(Self { stops: 0 })
        }
        fn sample_rate(&self) -> u32 {
            RATE
        }
        fn state(&self) -> SourceState {
            SourceState::Opened
        }
        fn start(&mut self, _sink: FrameSink) -> Result<(), CaptureError> {
            Err(CaptureError::SourceUnavailable("permission denied".into()))
        }
        fn stop(&mut self) {
            self.stops += 1;
        }
        fn close(&mut self) {}
    }

    // ---- Ordering ----------------------------------------------------------

    #[tokio::test]
    async fn frames_are_kept_in_order() {
        let mut source = replay(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0]], 5);
        let mut session = CaptureSession::start(&mut source, 10.0).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let buffer = session.stop().unwrap();
        assert_eq!(buffer.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    // ---- Duration-bound stop -----------------------------------------------

    #[tokio::test]
    async fn timer_stops_session_after_duration() {
        let frame = vec![0.25_f32; 400]; // 50 ms @ 8 kHz
        let mut source = replay(vec![frame; 20], 50);

        let mut session = CaptureSession::start(&mut source, 0.2).unwrap();
        let reason = session.wait(&CancelToken::new()).await.unwrap();
        assert_eq!(reason, StopReason::Elapsed);

        let frames = session.into_buffer().unwrap().len() / 400;
        assert!((3..=5).contains(&frames), "expected ~4 frames, got {frames}");
        assert_eq!(source.state(), SourceState::Opened);
    }

    #[tokio::test]
    async fn explicit_stop_preempts_timer() {
        let mut source = replay(vec![vec![0.1; 8]; 100], 5);
        let mut session = CaptureSession::start(&mut source, 30.0).unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        session.stop().unwrap();
        assert_eq!(session.stop_reason(), Some(StopReason::Requested));

        // wait() after stop returns the stored outcome without sleeping 30 s.
        let reason = tokio::time::timeout(
            Duration::from_millis(500),
            session.wait(&CancelToken::new()),
        )
        .await
        .expect("finished session returns immediately")
        .unwrap();
        assert_eq!(reason, StopReason::Requested);
    }

    // ---- Cancellation ------------------------------------------------------

    #[tokio::test]
    async fn cancel_unblocks_wait_before_deadline() {
        let mut source = replay(vec![vec![0.1; 8]; 1_000], 5);
        let mut session = CaptureSession::start(&mut source, 30.0).unwrap();

        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let reason = session.wait(&cancel).await.unwrap();
        assert_eq!(reason, StopReason::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!session.is_active());
    }

    // ---- Idempotent stop ---------------------------------------------------

    #[tokio::test]
    async fn second_stop_returns_same_buffer() {
        let mut source = replay(vec![vec![0.5; 4]; 3], 5);
        let mut session = CaptureSession::start(&mut source, 10.0).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        let first = session.stop().unwrap().clone();
        let second = session.stop().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.len(), 12);
    }

    // ---- Failure -----------------------------------------------------------

    #[tokio::test]
    async fn mid_stream_failure_discards_buffer() {
        let config = ReplayConfig::from_blocks(
            RATE,
            vec![vec![0.3; 16]; 5],
            Duration::from_millis(10),
        )
        .failing_at(2);
        let mut source = ReplaySource::open(&config).unwrap();

        let mut session = CaptureSession::start(&mut source, 10.0).unwrap();
        let err = session.wait(&CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, CaptureError::SourceFailedMidStream(_)));

        // Same failure on every later call; no buffer is ever returned.
        assert!(matches!(
            session.stop(),
            Err(CaptureError::SourceFailedMidStream(_))
        ));
        assert!(session.into_buffer().is_err());
        assert_eq!(source.state(), SourceState::Opened);
    }

    #[test]
    fn refused_start_reports_unavailable_and_releases_source() {
        let mut source = DeniedSource::open(&()).unwrap();
        let result = CaptureSession::start(&mut source, 1.0);
        assert!(matches!(result, Err(CaptureError::SourceUnavailable(_))));
        drop(result);
        assert_eq!(source.stops, 1);
    }

    // ---- Contract violations -----------------------------------------------

    #[test]
    fn starting_on_active_source_fails_fast() {
        let mut source = replay(vec![vec![0.0; 4]; 100], 5);
        source
            .start(FrameSink::detached(RATE))
            .expect("external start");

        assert!(matches!(
            CaptureSession::start(&mut source, 1.0),
            Err(CaptureError::SourceBusy)
        ));
        source.stop();
    }

    #[test]
    fn starting_on_closed_source_is_unavailable() {
        let mut source = replay(vec![], 5);
        source.close();
        assert!(matches!(
            CaptureSession::start(&mut source, 1.0),
            Err(CaptureError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn zero_sample_rate_is_invalid_descriptor() {
        let config = ReplayConfig::from_blocks(0, vec![], Duration::from_millis(5));
        let mut source = ReplaySource::open(&config).unwrap();
        assert!(matches!(
            CaptureSession::start(&mut source, 1.0),
            Err(CaptureError::InvalidDescriptor(_))
        ));
        assert_eq!(source.state(), SourceState::Opened);
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut source = replay(vec![], 5);
            assert!(
                CaptureSession::start(&mut source, bad).is_err(),
                "duration {bad} accepted"
            );
        }
    }

    // ---- Resource release --------------------------------------------------

    #[test]
    fn dropping_unfinished_session_stops_source() {
        let mut source = replay(vec![vec![0.0; 4]; 100], 5);
        {
            let session = CaptureSession::start(&mut source, 10.0).unwrap();
            assert!(session.is_active());
        }
        assert_eq!(source.state(), SourceState::Opened);
    }

    #[tokio::test]
    async fn source_can_be_reused_for_a_second_session() {
        let mut source = replay(vec![vec![1.0; 4]; 2], 5);

        let first = {
            let session = CaptureSession::start(&mut source, 10.0).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.into_buffer().unwrap()
        };
        let second = {
            let session = CaptureSession::start(&mut source, 10.0).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.into_buffer().unwrap()
        };

        assert_eq!(first.len(), 8);
        assert_eq!(second.len(), 8);
    }
}
