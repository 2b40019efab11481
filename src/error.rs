//! Error type shared by the capture session and the container encoder.
//!
//! Every failure inside the core surfaces as a [`CaptureError`]; nothing is
//! retried or swallowed.  The first three variants are the failure kinds a
//! caller is expected to handle; the remaining two are contract violations.

use thiserror::Error;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Typed outcome of a failed capture or encode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The audio source could not be opened or started (permission denied,
    /// device busy, no input device).  No session exists.
    #[error("audio source unavailable: {0}")]
    SourceUnavailable(String),

    /// The source reported an error after the session started.  Audio
    /// accumulated so far has been discarded.
    #[error("audio source failed mid-stream: {0}")]
    SourceFailedMidStream(String),

    /// Container parameters are outside the supported range.
    #[error("invalid container descriptor: {0}")]
    InvalidDescriptor(String),

    /// A session is already active on the source.
    #[error("audio source already has an active session")]
    SourceBusy,

    /// The payload would overflow the container's 32-bit size fields.
    #[error("payload of {samples} samples does not fit in a WAV container")]
    PayloadTooLarge { samples: usize },
}

impl CaptureError {
    /// `true` for the variants produced by the source itself rather than by
    /// the caller's use of the API.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            CaptureError::SourceUnavailable(_) | CaptureError::SourceFailedMidStream(_)
        )
    }
}
