//! Synthesizer pool — lazy per-voice engine handles with per-handle
//! serialization.
//!
//! The first request for a voice pays the model load; the handle is then
//! retained for process lifetime. Each handle lives behind its own mutex
//! because the underlying engine is not safe for concurrent use on one
//! handle. The mutex is taken inside `spawn_blocking`, so a slow load or a
//! long synthesis never stalls the async executor, and different voices
//! synthesize concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::catalog::VoiceCatalog;
use crate::engine::{EngineHandle, SpeechEngine, SynthesizedAudio};
use crate::error::SpeakError;

/// Lazily populated, per-voice serialized synthesis front-end.
///
/// `None` in a slot means the handle has not been created yet; the slot's
/// mutex also serializes creation, so two concurrent first requests for the
/// same voice load the model exactly once.
type HandleSlot = Arc<Mutex<Option<Box<dyn EngineHandle>>>>;

pub struct SynthesizerPool {
    catalog: VoiceCatalog,
    engine: Arc<dyn SpeechEngine>,
    handles: Mutex<HashMap<String, HandleSlot>>,
}

impl SynthesizerPool {
    pub fn new(catalog: VoiceCatalog, engine: Arc<dyn SpeechEngine>) -> Self {
        Self {
            catalog,
            engine,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Synthesize `text` with the given voice.
    ///
    /// Fails with [`SpeakError::TextRejected`] for empty or whitespace-only
    /// text, [`SpeakError::VoiceUnavailable`] when the voice is not in the
    /// catalog, and [`SpeakError::SynthesisFailed`] for engine errors.
    pub async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        speed: f32,
    ) -> Result<SynthesizedAudio, SpeakError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeakError::TextRejected);
        }

        let voice = self
            .catalog
            .get(voice_id)
            .ok_or_else(|| SpeakError::VoiceUnavailable(voice_id.to_owned()))?;

        // Map lock only for get-or-insert of the slot; constant time.
        let slot: HandleSlot = {
            let mut handles = self.handles.lock().expect("pool lock poisoned");
            Arc::clone(
                handles
                    .entry(voice.id.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(None))),
            )
        };

        let engine = Arc::clone(&self.engine);
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || {
            let mut handle = slot.lock().expect("handle lock poisoned");
            if handle.is_none() {
                *handle = Some(engine.load(&voice)?);
            }
            handle
                .as_mut()
                .expect("handle populated above")
                .generate(&text, speed)
        })
        .await
        .map_err(|e| SpeakError::SynthesisFailed(format!("synthesis task failed: {e}")))?
    }

    /// Number of voices with a loaded engine handle.
    pub fn handle_count(&self) -> usize {
        let handles = self.handles.lock().expect("pool lock poisoned");
        handles
            .values()
            // A slot busy synthesizing is necessarily loaded.
            .filter(|slot| slot.try_lock().map_or(true, |h| h.is_some()))
            .count()
    }

    /// Drop every handle. Subsequent synthesis would reload lazily.
    pub fn shutdown(&self) {
        self.handles.lock().expect("pool lock poisoned").clear();
    }
}
