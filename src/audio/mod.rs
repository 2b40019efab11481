//! Audio sources and sample storage.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → downmix_to_mono → StreamResampler ─┐
//!                                                                 ├─▶ FrameSink → SampleBuffer
//! ReplaySource thread ────────────────────────────── AudioFrame ─┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use clip_capture::audio::{FrameSource, MicSource};
//! use clip_capture::config::CaptureConfig;
//! use clip_capture::session::{CancelToken, CaptureSession};
//!
//! # async fn run() -> Result<(), clip_capture::CaptureError> {
//! let mut mic = MicSource::open(&CaptureConfig::default())?;
//! let mut session = CaptureSession::start(&mut mic, 5.0)?;
//! session.wait(&CancelToken::new()).await?;
//! let samples = session.into_buffer()?;
//! println!("captured {} samples", samples.len());
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod capture;
pub mod frame;
pub mod replay;
pub mod resample;
pub mod source;

pub use buffer::SampleBuffer;
pub use capture::MicSource;
pub use frame::AudioFrame;
pub use replay::{ReplayConfig, ReplaySource};
pub use resample::{downmix_to_mono, resample, StreamResampler};
pub use source::{FrameSource, SourceState};
