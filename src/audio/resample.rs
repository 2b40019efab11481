//! Channel mixing and sample-rate conversion for device audio.
//!
//! Input devices deliver interleaved audio at their native rate; capture
//! sessions want mono at the configured container rate.  [`MicSource`]
//! applies both steps inside the cpal callback:
//!
//! 1. [`downmix_to_mono`] — average interleaved channels.
//! 2. [`StreamResampler`] — linear interpolation from the device rate to the
//!    target rate, carried across callback buffers (identity when the rates
//!    already match).
//!
//! [`resample`] is the one-shot form for a complete buffer.
//!
//! [`MicSource`]: crate::audio::MicSource

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`; a trailing partial frame
/// is dropped.  `channels == 0` yields an empty vector.
///
/// ```rust
/// use clip_capture::audio::downmix_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = downmix_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample `samples` from `source_rate` to `target_rate` Hz using linear
/// interpolation.
///
/// The output length is `ceil(samples.len() * target_rate / source_rate)`.
/// Equal rates return the input unchanged; a zero rate or empty input
/// returns an empty vector.
///
/// ```rust
/// use clip_capture::audio::resample;
///
/// let hi = vec![0.5_f32; 480]; // 10 ms @ 48 kHz
/// let lo = resample(&hi, 48_000, 44_100);
/// assert_eq!(lo.len(), 441);
/// ```
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }

    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// StreamResampler
// ---------------------------------------------------------------------------

/// Linear resampler for audio that arrives in consecutive pieces.
///
/// Output sample `k` sits at source position `k * source_rate / target_rate`
/// of the whole stream, whatever the piece boundaries are.  Positions that
/// fall between the last sample of one piece and the first of the next are
/// emitted with the next piece, so the output has no seams and its length
/// tracks the true rate ratio instead of rounding up per piece.
///
/// ```rust
/// use clip_capture::audio::StreamResampler;
///
/// let mut rs = StreamResampler::new(48_000, 44_100);
/// let total: usize = (0..100).map(|_| rs.process(&[0.0; 480]).len()).sum();
/// assert!((44_099..=44_101).contains(&total)); // one second
/// ```
#[derive(Debug, Clone)]
pub struct StreamResampler {
    source_rate: u32,
    target_rate: u32,
    /// Source samples consumed by earlier pieces.
    consumed: u64,
    /// Output samples emitted so far.
    emitted: u64,
    /// Last sample of the previous piece.
    prev: f32,
}

impl StreamResampler {
    pub fn new(source_rate: u32, target_rate: u32) -> Self {
        Self {
            source_rate,
            target_rate,
            consumed: 0,
            emitted: 0,
            prev: 0.0,
        }
    }

    /// Resample the next piece of the stream.
    pub fn process(&mut self, piece: &[f32]) -> Vec<f32> {
        if self.source_rate == self.target_rate {
            return piece.to_vec();
        }
        if piece.is_empty() || self.source_rate == 0 || self.target_rate == 0 {
            return Vec::new();
        }

        let step = self.source_rate as f64 / self.target_rate as f64;
        let last = (piece.len() - 1) as f64;
        let mut output = Vec::with_capacity((piece.len() as f64 / step) as usize + 1);

        loop {
            // Position relative to piece[0]; -1 addresses `prev`.
            let pos = self.emitted as f64 * step - self.consumed as f64;
            if pos > last {
                break;
            }
            let base = pos.floor();
            let frac = (pos - base) as f32;
            let idx = base as isize;

            let at = |i: isize| if i < 0 { self.prev } else { piece[i as usize] };
            let a = at(idx);
            let sample = if frac == 0.0 {
                a
            } else {
                a + (at(idx + 1) - a) * frac
            };

            output.push(sample);
            self.emitted += 1;
        }

        self.consumed += piece.len() as u64;
        self.prev = piece[piece.len() - 1];
        output
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
