//! Sherpa-ONNX VITS engine adapter — implements [`SpeechEngine`] via `sherpa-rs`.
//!
//! Piper voices are VITS models under sherpa-onnx. The voice's `.onnx` holds
//! the synthesis metadata sherpa reads at init time (`sample_rate`,
//! `n_speakers`, espeak frontend settings); models exported for sherpa also
//! ship a `tokens.txt` and an `espeak-ng-data/` directory next to the model,
//! which this adapter picks up when present.
//!
//! Inference is CPU-bound; the pool runs [`EngineHandle::generate`] on a
//! blocking thread, so this adapter stays synchronous.

use sherpa_rs::tts::{VitsTts, VitsTtsConfig};

use crate::catalog::Voice;
use crate::engine::{EngineHandle, SpeechEngine, SynthesizedAudio};
use crate::error::SpeakError;

/// sherpa-onnx VITS/Piper engine.
pub struct SherpaEngine;

impl SherpaEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SherpaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for SherpaEngine {
    fn load(&self, voice: &Voice) -> Result<Box<dyn EngineHandle>, SpeakError> {
        let model_dir = voice
            .model_path
            .parent()
            .ok_or_else(|| SpeakError::SynthesisFailed("voice model has no parent dir".into()))?;

        let tokens = model_dir.join("tokens.txt");
        let data_dir = model_dir.join("espeak-ng-data");

        tracing::info!(
            voice = %voice.id,
            model = %voice.model_path.display(),
            "loading sherpa VITS model"
        );

        let config = VitsTtsConfig {
            model: voice.model_path.display().to_string(),
            tokens: if tokens.is_file() {
                tokens.display().to_string()
            } else {
                String::new()
            },
            data_dir: if data_dir.is_dir() {
                data_dir.display().to_string()
            } else {
                String::new()
            },
            length_scale: 1.0,
            ..Default::default()
        };

        let tts = VitsTts::new(config);
        tracing::info!(voice = %voice.id, "sherpa VITS model loaded");

        Ok(Box::new(SherpaHandle {
            tts,
            voice_id: voice.id.clone(),
        }))
    }
}

/// One loaded VITS voice.
pub struct SherpaHandle {
    tts: VitsTts,
    voice_id: String,
}

impl EngineHandle for SherpaHandle {
    fn generate(&mut self, text: &str, speed: f32) -> Result<SynthesizedAudio, SpeakError> {
        tracing::debug!(voice = %self.voice_id, text_len = text.len(), "synthesizing");

        let audio = self
            .tts
            .create(text, 0, speed)
            .map_err(|e| SpeakError::SynthesisFailed(format!("{e}")))?;

        tracing::debug!(
            voice = %self.voice_id,
            samples = audio.samples.len(),
            sample_rate = audio.sample_rate,
            "synthesis complete"
        );

        Ok(SynthesizedAudio {
            samples: audio.samples,
            sample_rate: audio.sample_rate,
        })
    }
}
