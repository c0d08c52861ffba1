//! Native TTS engine contract.
//!
//! The synthesizer pool drives the engine through these two traits: a
//! [`SpeechEngine`] loads one [`EngineHandle`] per voice, and a handle turns
//! text into PCM. Handles are not required to be `Sync` — the pool wraps
//! each one in its own mutex and never calls `generate` concurrently on the
//! same handle.

use crate::catalog::Voice;
use crate::error::SpeakError;

#[cfg(feature = "sherpa")]
pub mod sherpa;

/// Mono PCM produced by one synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// Samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,

    /// Sample rate of `samples`.
    pub sample_rate: u32,
}

/// A loaded per-voice synthesis object.
///
/// `generate` is CPU-bound and may take hundreds of milliseconds; callers
/// run it on a blocking thread.
pub trait EngineHandle: Send {
    /// Synthesize `text` at the given speed multiplier (1.0 = normal).
    fn generate(&mut self, text: &str, speed: f32) -> Result<SynthesizedAudio, SpeakError>;
}

impl std::fmt::Debug for dyn EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn EngineHandle")
    }
}

/// Factory for engine handles. Loading a model is expensive (hundreds of
/// milliseconds to seconds); the pool calls this at most once per voice.
pub trait SpeechEngine: Send + Sync {
    /// Load the synthesis object for one voice.
    fn load(&self, voice: &Voice) -> Result<Box<dyn EngineHandle>, SpeakError>;
}

/// Engine wired when the binary is built without a real TTS backend.
///
/// Every load fails with a message pointing at the `sherpa` feature, so a
/// headless build still admits and schedules requests but logs a clear
/// per-request failure instead of producing audio.
pub struct DisabledEngine;

impl SpeechEngine for DisabledEngine {
    fn load(&self, voice: &Voice) -> Result<Box<dyn EngineHandle>, SpeakError> {
        Err(SpeakError::SynthesisFailed(format!(
            "no TTS engine compiled in (voice '{}'); rebuild with the `sherpa` feature",
            voice.id
        )))
    }
}
