//! Capture sessions — bounded accumulation of frames from a source.
//!
//! # Architecture
//!
//! ```text
//! FrameSource (caller-owned)
//!        │ start(FrameSink)
//!        ▼
//! FrameSink::push ──▶ Mutex<{phase, SampleBuffer}> ◀── CaptureSession::stop / wait
//!        │                                                  │
//!        └── FrameSink::fail (device error)                 ▼
//!                                                encode() → EncodedContainer
//! ```
//!
//! [`record_clip`] bundles the whole flow for the common case.

pub mod accumulator;
pub mod cancel;
pub mod runner;
pub mod sink;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use accumulator::CaptureSession;
pub use cancel::CancelToken;
pub use runner::{record_clip, Recording};
pub use sink::{FrameSink, StopReason};
