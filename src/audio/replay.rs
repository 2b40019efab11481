//! Paced replay of preloaded frames.
//!
//! [`ReplaySource`] behaves like a live device: once started it pushes one
//! frame per `interval` from a background thread, the way an audio callback
//! would.  It can also be told to raise an error after a number of frames,
//! which makes it the workhorse for exercising capture sessions without a
//! microphone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::frame::AudioFrame;
use crate::audio::source::{FrameSource, SourceState};
use crate::error::CaptureError;
use crate::session::FrameSink;

/// Parameters for [`ReplaySource::open`].
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Rate reported by the source; frames should match it.
    pub sample_rate: u32,
    /// Frames delivered in order, one per `interval`.
    pub frames: Vec<AudioFrame>,
    /// Delay before each frame.
    pub interval: Duration,
    /// Raise a source error instead of delivering frame `n` (0-based).
    pub fail_at: Option<usize>,
}

impl ReplayConfig {
    /// Build a config from raw mono blocks at `sample_rate`.
    pub fn from_blocks(sample_rate: u32, blocks: Vec<Vec<f32>>, interval: Duration) -> Self {
        Self {
            sample_rate,
            frames: blocks
                .into_iter()
                .map(|b| AudioFrame::new(b, sample_rate))
                .collect(),
            interval,
            fail_at: None,
        }
    }

    /// Fail with a device error in place of frame `index`.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

/// A [`FrameSource`] that replays a fixed list of frames in real time.
pub struct ReplaySource {
    config: ReplayConfig,
    worker: Option<Worker>,
    closed: bool,
}

impl ReplaySource {
    /// Total number of samples the source will deliver if left running.
    pub fn total_samples(&self) -> usize {
        self.config.frames.iter().map(AudioFrame::len).sum()
    }
}

impl FrameSource for ReplaySource {
    type Config = ReplayConfig;

    fn open(config: &ReplayConfig) -> Result<Self, CaptureError> {
        Ok(Self {
            config: config.clone(),
            worker: None,
            closed: false,
        })
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    fn state(&self) -> SourceState {
        if self.closed {
            SourceState::Closed
        } else if self.worker.is_some() {
            SourceState::Active
        } else {
            SourceState::Opened
        }
    }

    fn start(&mut self, sink: FrameSink) -> Result<(), CaptureError> {
        match self.state() {
            SourceState::Active => return Err(CaptureError::SourceBusy),
            SourceState::Closed => {
                return Err(CaptureError::SourceUnavailable(
                    "replay source has been closed".into(),
                ))
            }
            SourceState::Opened => {}
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let frames = self.config.frames.clone();
        let interval = self.config.interval;
        let fail_at = self.config.fail_at;

        let handle = thread::Builder::new()
            .name("replay-source".into())
            .spawn(move || {
                for (index, frame) in frames.iter().enumerate() {
                    let due = Instant::now() + interval;
                    while !stop_flag.load(Ordering::SeqCst) {
                        let now = Instant::now();
                        if now >= due {
                            break;
                        }
                        thread::park_timeout(due - now);
                    }
                    if stop_flag.load(Ordering::SeqCst) {
                        return;
                    }
                    if fail_at == Some(index) {
                        sink.fail(format!("replay device error at frame {index}"));
                        return;
                    }
                    sink.push_frame(frame);
                }
            })
            .map_err(|e| CaptureError::SourceUnavailable(e.to_string()))?;

        self.worker = Some(Worker { stop, handle });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::SeqCst);
            worker.handle.thread().unpark();
            if worker.handle.join().is_err() {
                log::warn!("replay: worker thread panicked");
            }
        }
    }

    fn close(&mut self) {
        self.stop();
        self.closed = true;
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}
