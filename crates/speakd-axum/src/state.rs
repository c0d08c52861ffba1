//! Shared application state type.

use std::sync::Arc;

use speakd_core::{SelectionCapture, SourceRouter, SpeechQueue, SynthesizerPool, VoiceCatalog};

/// Everything the handlers need, wired once at bootstrap.
pub struct ServiceContext {
    pub catalog: VoiceCatalog,
    pub pool: Arc<SynthesizerPool>,
    pub queue: SpeechQueue,
    pub router: SourceRouter,
    pub capture: SelectionCapture,
}

/// Application state shared across all handlers.
pub type AppState = Arc<ServiceContext>;
