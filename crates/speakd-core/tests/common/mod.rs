//! Shared test doubles: a recording engine, a test-controlled audio sink,
//! and a harness that wires a full pipeline over a temp voices directory.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

use speakd_core::catalog::{Voice, VoiceCatalog};
use speakd_core::engine::{EngineHandle, SpeechEngine, SynthesizedAudio};
use speakd_core::error::SpeakError;
use speakd_core::queue::{QueueSettings, SpeechQueue, UtteranceSpec};
use speakd_core::sink::{AudioSink, PlaybackOutcome};
use speakd_core::synth::SynthesizerPool;

/// Engine that records which voices were loaded and, per synthesis call,
/// which (voice, text) pair ran — in order.
pub struct RecordingEngine {
    pub loads: Arc<Mutex<Vec<String>>>,
    pub spoken: Arc<Mutex<Vec<(String, String)>>>,
}

struct RecordingHandle {
    voice_id: String,
    spoken: Arc<Mutex<Vec<(String, String)>>>,
}

impl SpeechEngine for RecordingEngine {
    fn load(&self, voice: &Voice) -> Result<Box<dyn EngineHandle>, SpeakError> {
        self.loads.lock().unwrap().push(voice.id.clone());
        Ok(Box::new(RecordingHandle {
            voice_id: voice.id.clone(),
            spoken: Arc::clone(&self.spoken),
        }))
    }
}

impl EngineHandle for RecordingHandle {
    fn generate(&mut self, text: &str, _speed: f32) -> Result<SynthesizedAudio, SpeakError> {
        self.spoken
            .lock()
            .unwrap()
            .push((self.voice_id.clone(), text.to_owned()));
        Ok(SynthesizedAudio {
            // 10 ms of silence; real duration is irrelevant with ControlSink.
            samples: vec![0.0; 160],
            sample_rate: 16_000,
        })
    }
}

/// Sink the test drives by hand: reports each playback start on a channel
/// and holds playback open until `release` is notified or the utterance is
/// cancelled.
pub struct ControlSink {
    started: mpsc::UnboundedSender<()>,
    release: Arc<Notify>,
}

#[async_trait]
impl AudioSink for ControlSink {
    async fn play(
        &self,
        _samples: Vec<f32>,
        _sample_rate: u32,
        cancel: CancellationToken,
    ) -> Result<PlaybackOutcome, SpeakError> {
        let _ = self.started.send(());
        tokio::select! {
            _ = cancel.cancelled() => Ok(PlaybackOutcome::Cancelled),
            _ = self.release.notified() => Ok(PlaybackOutcome::Completed),
        }
    }
}

/// A fully wired pipeline over a temp voices directory.
pub struct Harness {
    pub queue: SpeechQueue,
    pub catalog: VoiceCatalog,
    pub pool: Arc<SynthesizerPool>,
    pub loads: Arc<Mutex<Vec<String>>>,
    pub spoken: Arc<Mutex<Vec<(String, String)>>>,
    pub started: mpsc::UnboundedReceiver<()>,
    pub release: Arc<Notify>,
    _voices_dir: tempfile::TempDir,
}

/// Install a `<id>.onnx` + `<id>.onnx.json` pair.
pub fn install_voice(dir: &Path, id: &str) {
    std::fs::write(dir.join(format!("{id}.onnx")), b"onnx").unwrap();
    std::fs::write(
        dir.join(format!("{id}.onnx.json")),
        r#"{"audio":{"sample_rate":16000}}"#,
    )
    .unwrap();
}

impl Harness {
    /// Build a pipeline with the given queue settings and the voices
    /// `unit-voice` (the default) and `alt-voice` installed.
    pub fn start(settings: QueueSettings) -> Self {
        let voices_dir = tempfile::tempdir().unwrap();
        install_voice(voices_dir.path(), "unit-voice");
        install_voice(voices_dir.path(), "alt-voice");

        let catalog = VoiceCatalog::open(voices_dir.path(), "unit-voice").unwrap();

        let loads = Arc::new(Mutex::new(Vec::new()));
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let pool = Arc::new(SynthesizerPool::new(
            catalog.clone(),
            Arc::new(RecordingEngine {
                loads: Arc::clone(&loads),
                spoken: Arc::clone(&spoken),
            }),
        ));

        let (started_tx, started_rx) = mpsc::unbounded_channel();
        let release = Arc::new(Notify::new());
        let sink = Arc::new(ControlSink {
            started: started_tx,
            release: Arc::clone(&release),
        });

        let queue = SpeechQueue::start(settings, Arc::clone(&pool), sink);

        Self {
            queue,
            catalog,
            pool,
            loads,
            spoken,
            started: started_rx,
            release,
            _voices_dir: voices_dir,
        }
    }

    /// Enqueue with the default voice and a throwaway source name.
    pub fn enqueue(&self, text: &str, priority: i32) -> String {
        self.queue.enqueue(UtteranceSpec {
            text: text.to_owned(),
            voice_id: "unit-voice".to_owned(),
            priority,
            source: "test".to_owned(),
        })
    }

    /// Wait until the sink reports the next playback start.
    pub async fn wait_playback_start(&mut self) {
        tokio::time::timeout(std::time::Duration::from_secs(2), self.started.recv())
            .await
            .expect("timed out waiting for playback to start")
            .expect("sink channel closed");
    }

    /// Assert no playback starts within a settle window.
    pub async fn assert_no_playback_start(&mut self) {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(
            self.started.try_recv().is_err(),
            "unexpected playback start"
        );
    }

    /// Finish the utterance the sink is currently holding open.
    pub fn release_playback(&self) {
        self.release.notify_one();
    }

    /// Texts synthesized so far, in order.
    pub fn synthesized_texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// (voice, text) pairs synthesized so far, in order.
    pub fn spoken_pairs(&self) -> Vec<(String, String)> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn loaded_voices(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }
}
