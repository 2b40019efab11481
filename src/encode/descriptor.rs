//! Fixed container parameters recorded when a capture session starts.

use crate::error::CaptureError;

/// Channel count of every container this crate produces.
pub const CHANNELS: u16 = 1;

/// Bit depth of every container this crate produces.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Bytes occupied by one encoded sample.
pub const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;

// ---------------------------------------------------------------------------
// ContainerDescriptor
// ---------------------------------------------------------------------------

/// Immutable description of the audio held in an encoded container.
///
/// Only the sample rate is a free parameter; channels and bit depth are
/// fixed at mono / 16-bit.  The fields are public for inspection but a
/// descriptor should be built with [`ContainerDescriptor::new`] so the
/// sample rate is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerDescriptor {
    /// Samples per second (Hz).
    pub sample_rate: u32,
    /// Always [`CHANNELS`].
    pub channels: u16,
    /// Always [`BITS_PER_SAMPLE`].
    pub bits_per_sample: u16,
}

impl ContainerDescriptor {
    /// Build a mono 16-bit descriptor for `sample_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidDescriptor`] when `sample_rate == 0`.
    pub fn new(sample_rate: u32) -> Result<Self, CaptureError> {
        let descriptor = Self {
            sample_rate,
            channels: CHANNELS,
            bits_per_sample: BITS_PER_SAMPLE,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check the descriptor against the supported format.
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.sample_rate == 0 {
            return Err(CaptureError::InvalidDescriptor(
                "sample rate must be positive".into(),
            ));
        }
        if self.channels != CHANNELS {
            return Err(CaptureError::InvalidDescriptor(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if self.bits_per_sample != BITS_PER_SAMPLE {
            return Err(CaptureError::InvalidDescriptor(format!(
                "unsupported bit depth: {}",
                self.bits_per_sample
            )));
        }
        // byte_rate is a u32 field in the header.
        if self.sample_rate.checked_mul(self.block_align() as u32).is_none() {
            return Err(CaptureError::InvalidDescriptor(format!(
                "sample rate too high: {}",
                self.sample_rate
            )));
        }
        Ok(())
    }

    /// Bytes per sample frame (`channels * bytes_per_sample`).
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Bytes of payload per second of audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}
