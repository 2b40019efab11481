//! Float samples → 16-bit PCM RIFF/WAVE container.
//!
//! The output is a standard 44-byte header followed by the little-endian
//! sample payload:
//!
//! ```text
//! [0-3]    "RIFF"
//! [4-7]    36 + data_size
//! [8-11]   "WAVE"
//! [12-15]  "fmt "
//! [16-19]  16 (PCM format chunk size)
//! [20-21]  1 (PCM format code)
//! [22-23]  channels
//! [24-27]  sample_rate
//! [28-31]  byte_rate = sample_rate * channels * bytes_per_sample
//! [32-33]  block_align = channels * bytes_per_sample
//! [34-35]  bits_per_sample
//! [36-39]  "data"
//! [40-43]  data_size = sample_count * bytes_per_sample
//! [44-..]  samples (i16 LE)
//! ```

use crate::encode::descriptor::{ContainerDescriptor, BYTES_PER_SAMPLE};
use crate::encode::header::{HeaderError, WavHeader};
use crate::error::CaptureError;

/// Size of the RIFF/WAVE header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Size of the PCM `fmt ` sub-chunk body.
const FMT_CHUNK_SIZE: u32 = 16;

/// WAVE format code for uncompressed linear PCM.
const FORMAT_PCM: u16 = 1;

// ---------------------------------------------------------------------------
// Sample conversion
// ---------------------------------------------------------------------------

/// Convert one float sample to a signed 16-bit PCM value.
///
/// The input is hard-clipped to `[-1.0, 1.0]`.  Negative values scale by
/// 32768 and non-negative values by 32767, so `-1.0` maps to `i16::MIN` and
/// `1.0` to `i16::MAX` without overflow.  The scaled value is rounded to the
/// nearest integer.  `NaN` encodes as silence.
///
/// ```
/// use clip_capture::encode::sample_to_i16;
///
/// assert_eq!(sample_to_i16(1.0), 32767);
/// assert_eq!(sample_to_i16(1.5), 32767);
/// assert_eq!(sample_to_i16(-1.0), -32768);
/// assert_eq!(sample_to_i16(0.0), 0);
/// ```
pub fn sample_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    // f64 holds every f32 × 32767 product exactly, so the rounding below
    // sees the true scaled value.
    let s = f64::from(sample).clamp(-1.0, 1.0);
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled.round() as i16
}

// ---------------------------------------------------------------------------
// EncodedContainer
// ---------------------------------------------------------------------------

/// A finished WAV file held in memory.
///
/// Produced once by [`encode`] and never mutated afterwards.  Hand it to a
/// [`Sender`](crate::sender::Sender) with
/// [`CONTENT_TYPE`](Self::CONTENT_TYPE), or take the raw bytes with
/// [`into_bytes`](Self::into_bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContainer {
    bytes: Vec<u8>,
    descriptor: ContainerDescriptor,
}

impl EncodedContainer {
    /// MIME type of the container, sent as the upload `Content-Type`.
    pub const CONTENT_TYPE: &'static str = "audio/wav";

    /// The complete container: header followed by payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the container and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Total size in bytes, header included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`: even an empty clip carries a header.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The descriptor the container was encoded with.
    pub fn descriptor(&self) -> &ContainerDescriptor {
        &self.descriptor
    }

    /// The encoded samples, without the header.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[WAV_HEADER_SIZE..]
    }

    /// Number of samples in the payload.
    pub fn sample_count(&self) -> usize {
        self.payload().len() / BYTES_PER_SAMPLE as usize
    }

    /// Clip length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.sample_count() as f64 / self.descriptor.sample_rate as f64
    }

    /// Decode the header back out of the byte stream.
    pub fn header(&self) -> Result<WavHeader, HeaderError> {
        WavHeader::parse(&self.bytes)
    }
}

// ---------------------------------------------------------------------------
// encode
// ---------------------------------------------------------------------------

/// Encode `samples` as a mono 16-bit PCM WAV container.
///
/// Pure and deterministic: the same inputs always produce byte-identical
/// output.  An empty slice yields a valid header-only container.
///
/// # Errors
///
/// * [`CaptureError::InvalidDescriptor`] — `descriptor` fails validation;
///   checked before any encoding work.
/// * [`CaptureError::PayloadTooLarge`] — the payload size does not fit the
///   header's 32-bit size fields.
pub fn encode(
    samples: &[f32],
    descriptor: &ContainerDescriptor,
) -> Result<EncodedContainer, CaptureError> {
    descriptor.validate()?;

    let data_size = samples
        .len()
        .checked_mul(descriptor.block_align() as usize)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| n.checked_add(36).is_some())
        .ok_or(CaptureError::PayloadTooLarge {
            samples: samples.len(),
        })?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_SIZE + data_size as usize);
    bytes.extend_from_slice(&wav_header(descriptor, data_size));
    for &sample in samples {
        bytes.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }

    Ok(EncodedContainer {
        bytes,
        descriptor: *descriptor,
    })
}

/// Build the 44-byte header for a payload of `data_size` bytes.
fn wav_header(descriptor: &ContainerDescriptor, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
    header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
    header[22..24].copy_from_slice(&descriptor.channels.to_le_bytes());
    header[24..28].copy_from_slice(&descriptor.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&descriptor.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&descriptor.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&descriptor.bits_per_sample.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn descriptor() -> ContainerDescriptor {
        ContainerDescriptor::new(44_100).unwrap()
    }

    // ---- Sample conversion -------------------------------------------------

    #[test]
    fn full_scale_maps_asymmetrically() {
        assert_eq!(sample_to_i16(1.0), i16::MAX);
        assert_eq!(sample_to_i16(-1.0), i16::MIN);
    }

    #[test]
    fn out_of_range_is_clipped_not_wrapped() {
        assert_eq!(sample_to_i16(1.5), sample_to_i16(1.0));
        assert_eq!(sample_to_i16(-1.5), sample_to_i16(-1.0));
        assert_eq!(sample_to_i16(f32::INFINITY), 32767);
        assert_eq!(sample_to_i16(f32::NEG_INFINITY), -32768);
    }

    #[test]
    fn half_scale_rounds_to_nearest() {
        // 0.5 * 32767 = 16383.5, -0.5 * 32768 = -16384
        assert_eq!(sample_to_i16(0.5), 16384);
        assert_eq!(sample_to_i16(-0.5), -16384);
        // 0.25 * 32767 = 8191.75
        assert_eq!(sample_to_i16(0.25), 8192);
    }

    #[test]
    fn product_just_below_half_rounds_down() {
        // 0.000_106_814_78 * 32767 = 3.4999999967…, which an f32 multiply
        // rounds up to exactly 3.5.
        assert_eq!(sample_to_i16(0.000_106_814_78), 3);
    }

    #[test]
    fn conversion_is_within_half_a_step_of_exact_product() {
        let mut bits = 0.000_1_f32.to_bits();
        while f32::from_bits(bits) <= 1.0 {
            let s = f32::from_bits(bits);
            for sample in [s, -s] {
                let scale = if sample < 0.0 { 32768.0 } else { 32767.0 };
                let exact = f64::from(sample) * scale;
                let got = f64::from(sample_to_i16(sample));
                assert!(
                    (got - exact).abs() <= 0.5,
                    "{sample} encoded as {got}, exact {exact}"
                );
            }
            bits += 997;
        }
    }

    #[test]
    fn nan_encodes_as_silence() {
        assert_eq!(sample_to_i16(f32::NAN), 0);
    }

    // ---- Header ------------------------------------------------------------

    #[test]
    fn header_layout_is_byte_exact() {
        let wav = encode(&[0.0, 0.5, -0.5], &descriptor()).unwrap();
        let b = wav.as_bytes();

        assert_eq!(&b[0..4], b"RIFF");
        assert_eq!(u32_at(b, 4), 36 + 6);
        assert_eq!(&b[8..12], b"WAVE");
        assert_eq!(&b[12..16], b"fmt ");
        assert_eq!(u32_at(b, 16), 16);
        assert_eq!(u16_at(b, 20), 1);
        assert_eq!(u16_at(b, 22), 1);
        assert_eq!(u32_at(b, 24), 44_100);
        assert_eq!(u32_at(b, 28), 88_200);
        assert_eq!(u16_at(b, 32), 2);
        assert_eq!(u16_at(b, 34), 16);
        assert_eq!(&b[36..40], b"data");
        assert_eq!(u32_at(b, 40), 6);
        assert_eq!(b.len(), 44 + 6);
    }

    #[test]
    fn payload_follows_header_little_endian() {
        let wav = encode(&[1.0, -1.0, 0.0], &descriptor()).unwrap();
        assert_eq!(wav.payload(), &[0xFF, 0x7F, 0x00, 0x80, 0x00, 0x00]);
    }

    #[test]
    fn clipped_samples_encode_identically() {
        let a = encode(&[1.5, -1.5], &descriptor()).unwrap();
        let b = encode(&[1.0, -1.0], &descriptor()).unwrap();
        assert_eq!(a.payload(), b.payload());
    }

    #[test]
    fn empty_buffer_yields_header_only_container() {
        let wav = encode(&[], &descriptor()).unwrap();
        let b = wav.as_bytes();
        assert_eq!(b.len(), WAV_HEADER_SIZE);
        assert_eq!(u32_at(b, 4), 36);
        assert_eq!(u32_at(b, 40), 0);
        assert!(!wav.is_empty());
        assert_eq!(wav.sample_count(), 0);
    }

    #[test]
    fn payload_size_is_two_bytes_per_sample() {
        for n in [0usize, 1, 7, 4096] {
            let wav = encode(&vec![0.1; n], &descriptor()).unwrap();
            assert_eq!(u32_at(wav.as_bytes(), 40) as usize, n * 2);
            assert_eq!(wav.sample_count(), n);
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.01).sin()).collect();
        let a = encode(&samples, &descriptor()).unwrap();
        let b = encode(&samples, &descriptor()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn invalid_descriptor_is_rejected_before_encoding() {
        let bad = ContainerDescriptor {
            sample_rate: 0,
            channels: 1,
            bits_per_sample: 16,
        };
        assert!(matches!(
            encode(&[0.0], &bad),
            Err(CaptureError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn duration_uses_descriptor_rate() {
        let d = ContainerDescriptor::new(8_000).unwrap();
        let wav = encode(&vec![0.0; 4_000], &d).unwrap();
        assert!((wav.duration_secs() - 0.5).abs() < 1e-9);
    }
}
