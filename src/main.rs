//! Application entry point: record one clip and identify it.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Open the microphone ([`MicSource`]).
//! 4. Wire Ctrl-C to a [`CancelToken`] so an interrupted recording is still
//!    sent with whatever was captured.
//! 5. Either identify the clip (`clip-capture`) or register it as a
//!    reference track (`clip-capture upload <name>`).

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clip_capture::{
    audio::{FrameSource, MicSource},
    config::AppConfig,
    pipeline::{new_shared_state, PipelineOrchestrator},
    sender::{HttpSender, RecognitionResult},
    session::{record_clip, CancelToken},
};

/// Alternatives listed under a match.
const MAX_ALTERNATIVES: usize = 3;

enum Command {
    Identify,
    Upload(String),
}

fn parse_args() -> Result<Command> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("identify") => Ok(Command::Identify),
        Some("upload") => match args.next() {
            Some(name) if !name.trim().is_empty() => Ok(Command::Upload(name)),
            _ => bail!("usage: clip-capture upload <name>"),
        },
        Some(other) => bail!("unknown command {other:?}; expected `identify` or `upload <name>`"),
    }
}

fn report(result: &RecognitionResult) {
    match result.title() {
        Some(title) => {
            log::info!("Match: {title} (score {})", result.score);
            if let Some(url) = result.url.as_deref().filter(|u| !u.is_empty()) {
                log::info!("  {url}");
            }
        }
        None => log::info!("No match found"),
    }

    for (rank, candidate) in result.best_alternatives(MAX_ALTERNATIVES).enumerate() {
        let name = candidate
            .name
            .clone()
            .unwrap_or_else(|| format!("#{}", candidate.song_id));
        log::info!("  {}. {name} (score {})", rank + 1, candidate.score);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let command = parse_args()?;

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.capture.validate()?;

    // 3. Microphone
    let mut mic = MicSource::open(&config.capture).context("opening microphone")?;

    // 4. Ctrl-C → cancel
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Interrupted; stopping early");
                cancel.cancel();
            }
        });
    }

    let sender = Arc::new(HttpSender::from_config(&config.server));
    let duration = config.capture.duration_secs;

    // 5. Run
    match command {
        Command::Identify => {
            log::info!("Listening for {duration:.1} s…");
            let orchestrator = PipelineOrchestrator::new(new_shared_state(config), sender);
            let result = orchestrator.identify(&mut mic, &cancel).await?;
            report(&result);
        }
        Command::Upload(name) => {
            log::info!("Recording {duration:.1} s for {name:?}…");
            let recording = record_clip(&mut mic, duration, &cancel).await?;
            let uploaded = sender.upload(&name, &recording.container).await?;
            log::info!("Uploaded {:?}", uploaded.name);
        }
    }

    mic.close();
    Ok(())
}
