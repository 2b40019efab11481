//! Fixed-length audio clip capture and WAV encoding for song identification.
//!
//! A [`session::CaptureSession`] accumulates mono `f32` frames pushed by an
//! [`audio::FrameSource`] until a duration elapses or it is stopped, then
//! [`encode::encode`] turns the samples into a 16-bit PCM WAV container that
//! a [`sender::Sender`] posts to the recognition service.
//!
//! ```rust,no_run
//! use clip_capture::audio::{FrameSource, MicSource};
//! use clip_capture::config::AppConfig;
//! use clip_capture::session::{record_clip, CancelToken};
//!
//! # async fn example() -> Result<(), clip_capture::CaptureError> {
//! let config = AppConfig::default();
//! let mut mic = MicSource::open(&config.capture)?;
//! let recording = record_clip(&mut mic, 5.0, &CancelToken::new()).await?;
//! assert_eq!(&recording.container.as_bytes()[..4], b"RIFF");
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod encode;
pub mod error;
pub mod pipeline;
pub mod sender;
pub mod session;

pub use error::CaptureError;
