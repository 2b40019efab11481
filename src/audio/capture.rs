//! Microphone capture via `cpal`.
//!
//! [`MicSource`] wraps the cpal host/device/stream lifecycle behind the
//! [`FrameSource`] trait.  The device is acquired on
//! [`open`](FrameSource::open); each [`start`](FrameSource::start) builds a
//! fresh input stream and [`stop`](FrameSource::stop) drops it, which stops
//! the underlying hardware stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio::resample::{downmix_to_mono, StreamResampler};
use crate::audio::source::{FrameSource, SourceState};
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::session::FrameSink;

// ---------------------------------------------------------------------------
// MicSource
// ---------------------------------------------------------------------------

/// Microphone input built on top of `cpal`.
///
/// Frames are delivered as mono at the configured sample rate regardless of
/// the device's native channel count and rate.
///
/// # Example
///
/// ```rust,no_run
/// use clip_capture::audio::{FrameSource, MicSource};
/// use clip_capture::config::CaptureConfig;
///
/// let mic = MicSource::open(&CaptureConfig::default()).unwrap();
/// println!("capturing at {} Hz", mic.sample_rate());
/// ```
pub struct MicSource {
    /// `None` once the source has been closed.
    device: Option<cpal::Device>,
    config: cpal::StreamConfig,
    /// Native sample rate reported by the device (Hz).
    native_rate: u32,
    /// Number of interleaved channels reported by the device.
    channels: u16,
    /// Rate frames are resampled to before delivery.
    target_rate: u32,
    /// Live stream while `Active`.
    stream: Option<cpal::Stream>,
}

impl MicSource {
    /// Native sample rate of the input device in Hz.
    pub fn native_rate(&self) -> u32 {
        self.native_rate
    }

    /// Number of interleaved channels the device delivers before downmix.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    fn find_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device, CaptureError> {
        let Some(name) = name else {
            return host.default_input_device().ok_or_else(|| {
                CaptureError::SourceUnavailable(
                    "no input device found on the default audio host".into(),
                )
            });
        };

        let mut devices = host
            .input_devices()
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;

        devices
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| CaptureError::SourceUnavailable(format!("input device {name:?} not found")))
    }
}

impl FrameSource for MicSource {
    type Config = CaptureConfig;

    /// Open the configured input device (or the system default).
    ///
    /// Queries the device's preferred stream configuration so no manual
    /// buffer sizing is required.
    fn open(config: &CaptureConfig) -> Result<Self, CaptureError> {
        if config.sample_rate == 0 {
            return Err(CaptureError::InvalidDescriptor(
                "sample rate must be positive".into(),
            ));
        }

        let host = cpal::default_host();
        let device = Self::find_device(&host, config.device.as_deref())?;

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;

        let channels = supported.channels();
        let native_rate = supported.sample_rate().0;
        let stream_config: cpal::StreamConfig = supported.into();

        log::info!(
            "mic: opened {:?} ({} Hz, {} ch) → {} Hz mono",
            device.name().unwrap_or_else(|_| "unknown".into()),
            native_rate,
            channels,
            config.sample_rate
        );

        Ok(Self {
            device: Some(device),
            config: stream_config,
            native_rate,
            channels,
            target_rate: config.sample_rate,
            stream: None,
        })
    }

    fn sample_rate(&self) -> u32 {
        self.target_rate
    }

    fn state(&self) -> SourceState {
        match (&self.device, &self.stream) {
            (None, _) => SourceState::Closed,
            (Some(_), Some(_)) => SourceState::Active,
            (Some(_), None) => SourceState::Opened,
        }
    }

    /// Build and play an input stream pushing into `sink`.
    ///
    /// The cpal callback runs on a dedicated audio thread; each buffer is
    /// downmixed, resampled and appended.  The resampler lives in the
    /// callback, so interpolation continues across buffers.  Stream errors are forwarded to
    /// [`FrameSink::fail`].
    fn start(&mut self, sink: FrameSink) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            return Err(CaptureError::SourceBusy);
        }
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| CaptureError::SourceUnavailable("microphone has been closed".into()))?;

        let channels = self.channels;
        let mut resampler = StreamResampler::new(self.native_rate, self.target_rate);
        let err_sink = sink.clone();

        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mono = downmix_to_mono(data, channels);
                    sink.push(&resampler.process(&mono));
                },
                move |err: cpal::StreamError| {
                    log::warn!("mic: cpal stream error: {err}");
                    err_sink.fail(err.to_string());
                },
                None, // no timeout
            )
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;

        self.stream = Some(stream);
        log::debug!("mic: stream started");
        Ok(())
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("mic: stream stopped");
        }
    }

    fn close(&mut self) {
        self.stop();
        if self.device.take().is_some() {
            log::info!("mic: device released");
        }
    }
}

impl Drop for MicSource {
    fn drop(&mut self) {
        self.close();
    }
}
