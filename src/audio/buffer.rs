//! Growable, append-only sample buffer for one capture session.
//!
//! Unlike a ring buffer nothing is ever overwritten: the buffer holds every
//! sample delivered during the session, in arrival order, until the session
//! hands it to the encoder.
//!
//! # Example
//!
//! ```rust
//! use clip_capture::audio::SampleBuffer;
//!
//! let mut buf = SampleBuffer::new();
//! buf.push_slice(&[1.0, 2.0]);
//! buf.push_slice(&[3.0, 4.0]);
//! buf.push_slice(&[5.0]);
//! assert_eq!(buf.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
//! ```

// ---------------------------------------------------------------------------
// SampleBuffer
// ---------------------------------------------------------------------------

/// Concatenation of every frame accumulated during one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
}

impl SampleBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty buffer with room for `capacity` samples before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    /// Append `frame` after everything already stored.  Amortised O(1) per
    /// sample.
    pub fn push_slice(&mut self, frame: &[f32]) {
        self.samples.extend_from_slice(frame);
    }

    /// Discard all samples, keeping the allocation.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// The accumulated samples in arrival order.
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// Consume the buffer and return the underlying samples.
    pub fn into_vec(self) -> Vec<f32> {
        self.samples
    }

    /// Number of samples stored.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when the buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Buffered audio length in seconds, assuming `sample_rate` Hz mono.
    pub fn duration_secs(&self, sample_rate: u32) -> f32 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / sample_rate as f32
    }
}

impl From<Vec<f32>> for SampleBuffer {
    fn from(samples: Vec<f32>) -> Self {
        Self { samples }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
