//! Audio sink contract — where synthesized PCM goes.
//!
//! The queue worker hands each utterance's samples to an [`AudioSink`] and
//! blocks until playback completes or the utterance's cancel flag fires.
//! [`SilentSink`] consumes real time without touching hardware; the rodio
//! adapter (feature `playback`) drives the default output device.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SpeakError;

#[cfg(feature = "playback")]
pub mod rodio;

/// How a playback call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// All samples were played.
    Completed,

    /// The cancel flag fired before the samples drained.
    Cancelled,
}

/// Plays one utterance's PCM to completion, observing cancellation.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play mono `samples` at `sample_rate`. Returns when playback finishes
    /// or within the sink's cancellation latency after `cancel` fires.
    async fn play(
        &self,
        samples: Vec<f32>,
        sample_rate: u32,
        cancel: CancellationToken,
    ) -> Result<PlaybackOutcome, SpeakError>;
}

/// Sink that plays nothing but takes as long as the audio would.
///
/// Keeps the queue's timing semantics (serial playback, preemption windows)
/// observable on hosts with no audio device. Cancellation latency is the
/// select wake-up, well under the sub-100ms bound real sinks target.
pub struct SilentSink;

#[async_trait]
impl AudioSink for SilentSink {
    async fn play(
        &self,
        samples: Vec<f32>,
        sample_rate: u32,
        cancel: CancellationToken,
    ) -> Result<PlaybackOutcome, SpeakError> {
        let duration = Duration::from_secs_f64(samples.len() as f64 / f64::from(sample_rate.max(1)));
        tokio::select! {
            _ = cancel.cancelled() => Ok(PlaybackOutcome::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(PlaybackOutcome::Completed),
        }
    }
}
