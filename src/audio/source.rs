//! Abstract push source of audio frames.
//!
//! A [`FrameSource`] is a caller-owned handle with an explicit lifecycle:
//!
//! ```text
//! open() ──▶ Opened ──start(sink)──▶ Active ──stop()──▶ Opened
//!              │                        │
//!              └────────close()─────────┴──────────────▶ Closed
//! ```
//!
//! While `Active` the source pushes frames into the [`FrameSink`] from its
//! own delivery context (an audio callback thread, a replay thread, …) and
//! reports device failures through [`FrameSink::fail`].  Whether a source is
//! reused across sessions or reopened each time is up to the caller.

use crate::error::CaptureError;
use crate::session::FrameSink;

/// Lifecycle state of a [`FrameSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Device acquired, not delivering frames.
    Opened,
    /// Delivering frames to a sink.
    Active,
    /// Device released; the source cannot be started again.
    Closed,
}

/// A push source of mono `f32` frames at a fixed sample rate.
pub trait FrameSource {
    /// Parameters needed to open the source.
    type Config;

    /// Acquire the underlying device.
    ///
    /// # Errors
    ///
    /// [`CaptureError::SourceUnavailable`] when the device cannot be opened.
    fn open(config: &Self::Config) -> Result<Self, CaptureError>
    where
        Self: Sized;

    /// Sample rate of every frame this source delivers, in Hz.
    fn sample_rate(&self) -> u32;

    /// Current lifecycle state.
    fn state(&self) -> SourceState;

    /// Begin delivering frames to `sink`.  Must not block.
    ///
    /// # Errors
    ///
    /// [`CaptureError::SourceBusy`] when already active,
    /// [`CaptureError::SourceUnavailable`] when closed or when the platform
    /// refuses to start delivery.
    fn start(&mut self, sink: FrameSink) -> Result<(), CaptureError>;

    /// Stop delivering frames and release the stream.  No frame is delivered
    /// after this returns.  A no-op unless `Active`.
    fn stop(&mut self);

    /// Release the device.  Implies [`stop`](Self::stop).
    fn close(&mut self);
}
