//! Hand-off of encoded recordings to the recognition service.
//!
//! * [`Sender`] — async trait implemented by every backend.
//! * [`HttpSender`] — reqwest client for `POST /recognize` and `POST /upload`.
//! * [`RecognitionResult`] / [`Candidate`] — the service's JSON answer.
//! * [`SendError`] — transport, status and server-side failures.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use clip_capture::config::AppConfig;
//! use clip_capture::encode::{encode, ContainerDescriptor};
//! use clip_capture::sender::{HttpSender, Sender};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let sender = HttpSender::from_config(&config.server);
//!
//!     let descriptor = ContainerDescriptor::new(44_100).unwrap();
//!     let container = encode(&vec![0.0; 44_100], &descriptor).unwrap();
//!
//!     let result = sender.recognize(&container).await.unwrap();
//!     println!("{:?}", result.title());
//! }
//! ```

pub mod client;
pub mod response;

pub use client::{HttpSender, SendError, Sender};
pub use response::{Candidate, RecognitionResult, UploadResult};
