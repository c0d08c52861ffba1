//! rodio audio sink — plays utterances on the default output device.
//!
//! rodio's `OutputStream` is not `Send`, so each play call builds the
//! stream inside its own blocking task and keeps it alive for the duration
//! of the utterance. Cancellation is polled every 20 ms against the sink's
//! drain state; at typical sample rates that keeps cancellation latency
//! well under 100 ms.

use std::time::Duration;

use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use tokio_util::sync::CancellationToken;

use crate::error::SpeakError;
use crate::sink::{AudioSink, PlaybackOutcome};

/// Poll interval for the cancel flag while the device drains.
const CANCEL_POLL: Duration = Duration::from_millis(20);

/// Default-output-device sink backed by rodio.
pub struct RodioSink;

impl RodioSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioSink for RodioSink {
    async fn play(
        &self,
        samples: Vec<f32>,
        sample_rate: u32,
        cancel: CancellationToken,
    ) -> Result<PlaybackOutcome, SpeakError> {
        tokio::task::spawn_blocking(move || {
            // Stream must outlive the sink; dropping it tears the device down.
            let (_stream, handle) = OutputStream::try_default()
                .map_err(|e| SpeakError::PlaybackFailed(e.to_string()))?;
            let sink = Sink::try_new(&handle)
                .map_err(|e| SpeakError::PlaybackFailed(e.to_string()))?;

            tracing::debug!(samples = samples.len(), sample_rate, "playback started");
            sink.append(SamplesBuffer::new(1, sample_rate, samples));

            loop {
                if cancel.is_cancelled() {
                    sink.stop();
                    tracing::debug!("playback cancelled");
                    return Ok(PlaybackOutcome::Cancelled);
                }
                if sink.empty() {
                    tracing::debug!("playback finished");
                    return Ok(PlaybackOutcome::Completed);
                }
                std::thread::sleep(CANCEL_POLL);
            }
        })
        .await
        .map_err(|e| SpeakError::PlaybackFailed(format!("playback task failed: {e}")))?
    }
}
