//! Parsing of the 44-byte canonical WAV header.

use thiserror::Error;

use crate::encode::wav::WAV_HEADER_SIZE;

/// Reason a byte slice is not a canonical PCM WAV header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header truncated: {0} bytes (need 44)")]
    Truncated(usize),

    #[error("bad chunk tag at offset {offset}: expected {expected:?}")]
    BadTag { offset: usize, expected: &'static str },

    #[error("unsupported format code {0} (expected 1 = PCM)")]
    NotPcm(u16),

    #[error("inconsistent header field: {0}")]
    Inconsistent(&'static str),
}

/// Header fields decoded from a canonical PCM WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_size: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Decode the header at the start of `bytes`.
    ///
    /// Only the canonical layout is accepted: `fmt ` immediately followed by
    /// `data`, no extension chunks.
    pub fn parse(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(HeaderError::Truncated(bytes.len()));
        }

        expect_tag(bytes, 0, "RIFF")?;
        expect_tag(bytes, 8, "WAVE")?;
        expect_tag(bytes, 12, "fmt ")?;
        expect_tag(bytes, 36, "data")?;

        if read_u32(bytes, 16) != 16 {
            return Err(HeaderError::Inconsistent("fmt chunk size"));
        }
        let format = read_u16(bytes, 20);
        if format != 1 {
            return Err(HeaderError::NotPcm(format));
        }

        let header = Self {
            riff_size: read_u32(bytes, 4),
            channels: read_u16(bytes, 22),
            sample_rate: read_u32(bytes, 24),
            byte_rate: read_u32(bytes, 28),
            block_align: read_u16(bytes, 32),
            bits_per_sample: read_u16(bytes, 34),
            data_size: read_u32(bytes, 40),
        };

        let expected_align = header.channels as u32 * header.bits_per_sample as u32 / 8;
        if header.block_align as u32 != expected_align {
            return Err(HeaderError::Inconsistent("block align"));
        }
        if header.byte_rate as u64 != header.sample_rate as u64 * expected_align as u64 {
            return Err(HeaderError::Inconsistent("byte rate"));
        }
        if header.riff_size as u64 != 36 + header.data_size as u64 {
            return Err(HeaderError::Inconsistent("RIFF size"));
        }

        Ok(header)
    }

    /// Number of sample frames the payload holds.
    pub fn sample_count(&self) -> u32 {
        match self.block_align {
            0 => 0,
            align => self.data_size / align as u32,
        }
    }
}

fn expect_tag(bytes: &[u8], offset: usize, expected: &'static str) -> Result<(), HeaderError> {
    if &bytes[offset..offset + 4] == expected.as_bytes() {
        Ok(())
    } else {
        Err(HeaderError::BadTag { offset, expected })
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
