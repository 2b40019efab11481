//! Container encoder — float samples → byte-exact mono 16-bit PCM WAV.
//!
//! ```text
//! SampleBuffer (&[f32]) + ContainerDescriptor ──encode()──▶ EncodedContainer
//! ```
//!
//! # Example
//!
//! ```rust
//! use clip_capture::encode::{encode, ContainerDescriptor};
//!
//! let descriptor = ContainerDescriptor::new(44_100).unwrap();
//! let wav = encode(&[0.0, 0.5, -0.5], &descriptor).unwrap();
//!
//! assert_eq!(wav.len(), 44 + 3 * 2);
//! assert_eq!(wav.header().unwrap().sample_rate, 44_100);
//! ```

pub mod descriptor;
pub mod header;
pub mod wav;

pub use descriptor::{ContainerDescriptor, BITS_PER_SAMPLE, BYTES_PER_SAMPLE, CHANNELS};
pub use header::{HeaderError, WavHeader};
pub use wav::{encode, sample_to_i16, EncodedContainer, WAV_HEADER_SIZE};
