//! Daemon composition root — the only place infrastructure is wired.

use std::sync::Arc;

use speakd_axum::state::{AppState, ServiceContext};
use speakd_core::config::AppConfig;
use speakd_core::engine::SpeechEngine;
use speakd_core::error::SpeakError;
use speakd_core::queue::{QueueSettings, SpeechQueue};
use speakd_core::router::SourceRouter;
use speakd_core::sink::AudioSink;
use speakd_core::synth::SynthesizerPool;
use speakd_core::{SelectionCapture, VoiceCatalog};

/// Build the full pipeline from configuration.
pub async fn bootstrap(config: AppConfig) -> Result<AppState, SpeakError> {
    let catalog = VoiceCatalog::open(&config.service.voices_dir, &config.service.default_voice)?;
    let pool = Arc::new(SynthesizerPool::new(catalog.clone(), default_engine()));

    let queue = SpeechQueue::start(
        QueueSettings {
            max_depth: config.service.max_queue_depth,
            interrupt_on_higher_priority: config.service.interrupt_on_higher_priority,
        },
        Arc::clone(&pool),
        default_sink(),
    );
    let router = SourceRouter::new(&config.sources, catalog.clone(), queue.clone());

    Ok(Arc::new(ServiceContext {
        catalog,
        pool,
        queue,
        router,
        capture: SelectionCapture::new(),
    }))
}

fn default_engine() -> Arc<dyn SpeechEngine> {
    #[cfg(feature = "sherpa")]
    {
        Arc::new(speakd_core::engine::sherpa::SherpaEngine::new())
    }
    #[cfg(not(feature = "sherpa"))]
    {
        tracing::warn!(
            "built without the `sherpa` feature; synthesis requests will fail until rebuilt"
        );
        Arc::new(speakd_core::DisabledEngine)
    }
}

fn default_sink() -> Arc<dyn AudioSink> {
    #[cfg(feature = "playback")]
    {
        Arc::new(speakd_core::sink::rodio::RodioSink::new())
    }
    #[cfg(not(feature = "playback"))]
    {
        tracing::warn!("built without the `playback` feature; playback is silent");
        Arc::new(speakd_core::SilentSink)
    }
}
