//! A single block of mono audio as delivered by a source.

/// One fixed-size block of consecutive mono samples.
///
/// Samples are nominally in `[-1.0, 1.0]`; out-of-range values are
/// tolerated here and clipped by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Mono PCM samples.
    pub samples: Vec<f32>,
    /// Sample rate of this frame in Hz.
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A frame of `len` zero samples.
    pub fn silence(len: usize, sample_rate: u32) -> Self {
        Self::new(vec![0.0; len], sample_rate)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Frame length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_frame_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AudioFrame>();
    }

    #[test]
    fn silence_has_requested_length() {
        let frame = AudioFrame::silence(4_096, 44_100);
        assert_eq!(frame.len(), 4_096);
        assert!(frame.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn duration_of_frame() {
        let frame = AudioFrame::silence(2_205, 44_100);
        assert!((frame.duration_secs() - 0.05).abs() < 1e-9);
        assert_eq!(AudioFrame::silence(10, 0).duration_secs(), 0.0);
    }
}
