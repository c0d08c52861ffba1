//! Voice catalog — scans the voices directory and hot-reloads on change.
//!
//! A voice is a `<id>.onnx` model with a sibling `<id>.onnx.json` config.
//! The catalog builds an index from a directory scan and publishes it
//! atomically: readers clone an `Arc` snapshot and are never exposed to a
//! half-built index. A filesystem watcher schedules a rescan 100 ms after
//! the last relevant event, so a burst of copies collapses into one scan.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SpeakError;

/// Sample rate assumed when the voice config does not declare one.
pub const FALLBACK_SAMPLE_RATE: u32 = 22_050;

/// Quiet period after the last filesystem event before rescanning.
const RESCAN_DEBOUNCE: Duration = Duration::from_millis(100);

/// One installed voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Model basename without the `.onnx` extension.
    pub id: String,

    /// Display name; initially the id.
    pub name: String,

    /// Absolute path to the `.onnx` model.
    pub model_path: PathBuf,

    /// Absolute path to the `.onnx.json` config.
    pub config_path: PathBuf,

    /// Output sample rate, from `audio.sample_rate` in the config.
    pub sample_rate: u32,
}

/// The fields of the voice config the catalog cares about.
#[derive(Debug, Default, Deserialize)]
struct VoiceModelConfig {
    #[serde(default)]
    audio: AudioSection,
}

#[derive(Debug, Default, Deserialize)]
struct AudioSection {
    sample_rate: Option<i64>,
}

/// Thread-safe, hot-reloading voice index.
///
/// Cheap to clone; clones share the index, watcher, and shutdown signal.
#[derive(Clone)]
pub struct VoiceCatalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    dir: PathBuf,
    default_voice: String,
    /// Published snapshot, sorted by id. Swapped whole on each scan.
    index: RwLock<Arc<Vec<Voice>>>,
    shutdown: CancellationToken,
    /// Held so the OS watch stays registered; dropped on shutdown.
    watcher: std::sync::Mutex<Option<notify::RecommendedWatcher>>,
}

impl VoiceCatalog {
    /// Open the catalog: create the directory if needed, run the initial
    /// scan, and start the hot-reload watcher.
    pub fn open(dir: &Path, default_voice: &str) -> Result<Self, SpeakError> {
        if !dir.exists()
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot create voices directory");
        }

        let initial = match scan_voices(dir) {
            Ok(voices) => voices,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "initial voice scan failed");
                Vec::new()
            }
        };
        tracing::info!(dir = %dir.display(), voices = initial.len(), "voice catalog loaded");

        let inner = Arc::new(CatalogInner {
            dir: dir.to_path_buf(),
            default_voice: default_voice.to_owned(),
            index: RwLock::new(Arc::new(initial)),
            shutdown: CancellationToken::new(),
            watcher: std::sync::Mutex::new(None),
        });

        let catalog = Self { inner };
        catalog.start_watcher();
        Ok(catalog)
    }

    /// Snapshot of the current index, ordered by id.
    pub fn list(&self) -> Vec<Voice> {
        self.snapshot().as_ref().clone()
    }

    /// Cheap reference to the current index.
    pub fn snapshot(&self) -> Arc<Vec<Voice>> {
        Arc::clone(&self.inner.index.read().expect("catalog lock poisoned"))
    }

    /// Look up a voice by id.
    pub fn get(&self, id: &str) -> Option<Voice> {
        self.snapshot().iter().find(|v| v.id == id).cloned()
    }

    /// Resolve a requested voice id to an effective one.
    ///
    /// Returns `requested` if it names a present voice; otherwise the
    /// configured default. The default is returned even when it is itself
    /// absent — synthesis will then fail with `VoiceUnavailable`, which is
    /// the caller's signal that the installation is broken.
    pub fn resolve(&self, requested: Option<&str>) -> String {
        if let Some(id) = requested
            && !id.is_empty()
        {
            if self.get(id).is_some() {
                return id.to_owned();
            }
            tracing::warn!(
                requested = id,
                fallback = %self.inner.default_voice,
                "requested voice not in catalog, falling back to default"
            );
        }
        self.inner.default_voice.clone()
    }

    /// Stop the watcher and release its resources. Lookups keep working
    /// against the last published snapshot.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.watcher.lock().expect("watcher lock poisoned").take();
    }

    fn publish(&self, voices: Vec<Voice>) {
        tracing::info!(voices = voices.len(), "voice catalog rescanned");
        *self.inner.index.write().expect("catalog lock poisoned") = Arc::new(voices);
    }

    /// Register the filesystem watch and spawn the debounce task.
    ///
    /// Best-effort: if the watcher cannot be created the catalog still
    /// works, it just never reloads.
    fn start_watcher(&self) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut watcher = match notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if touches_voice_files(&event) => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "voices watcher error"),
            }
        }) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(error = %e, "cannot create voices watcher, hot reload disabled");
                return;
            }
        };

        if let Err(e) = watcher.watch(&self.inner.dir, RecursiveMode::NonRecursive) {
            tracing::warn!(
                dir = %self.inner.dir.display(),
                error = %e,
                "cannot watch voices directory, hot reload disabled"
            );
            return;
        }
        *self.inner.watcher.lock().expect("watcher lock poisoned") = Some(watcher);

        let catalog = self.clone();
        tokio::spawn(async move { catalog.run_debounce(event_rx).await });
    }

    /// Collapse event bursts: each event (re)arms a 100 ms timer; the scan
    /// runs when the timer expires with no newer event.
    async fn run_debounce(&self, mut events: mpsc::UnboundedReceiver<()>) {
        loop {
            tokio::select! {
                _ = self.inner.shutdown.cancelled() => return,
                event = events.recv() => {
                    if event.is_none() {
                        return;
                    }
                }
            }

            loop {
                tokio::select! {
                    _ = self.inner.shutdown.cancelled() => return,
                    event = events.recv() => {
                        if event.is_none() {
                            return;
                        }
                        // Newer event: restart the quiet period.
                    }
                    _ = tokio::time::sleep(RESCAN_DEBOUNCE) => break,
                }
            }

            match scan_voices(&self.inner.dir) {
                Ok(voices) => self.publish(voices),
                Err(e) => {
                    tracing::warn!(error = %e, "voice rescan failed, keeping previous index");
                }
            }
        }
    }
}

/// Whether a filesystem event concerns a voice model or its config.
fn touches_voice_files(event: &notify::Event) -> bool {
    event.paths.iter().any(|p| {
        let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
        name.ends_with(".onnx") || name.ends_with(".onnx.json")
    })
}

/// Enumerate `<id>.onnx` + `<id>.onnx.json` pairs into a sorted index.
///
/// A model without a config, or with a config that does not parse, is
/// excluded and logged; it never aborts the scan.
fn scan_voices(dir: &Path) -> std::io::Result<Vec<Voice>> {
    let mut voices = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let model_path = entry.path();
        if !entry.file_type()?.is_file() || model_path.extension().is_none_or(|e| e != "onnx") {
            continue;
        }
        let Some(id) = model_path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let config_path = model_path.with_extension("onnx.json");
        if !config_path.is_file() {
            tracing::warn!(model = %model_path.display(), "voice model has no config, skipping");
            continue;
        }

        let sample_rate = match read_sample_rate(&config_path) {
            Ok(rate) => rate,
            Err(e) => {
                tracing::warn!(config = %config_path.display(), error = %e, "unreadable voice config, skipping");
                continue;
            }
        };

        voices.push(Voice {
            id: id.to_owned(),
            name: id.to_owned(),
            model_path: absolute(&model_path),
            config_path: absolute(&config_path),
            sample_rate,
        });
    }

    voices.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(voices)
}

fn read_sample_rate(config_path: &Path) -> Result<u32, SpeakError> {
    let raw = std::fs::read_to_string(config_path)?;
    let config: VoiceModelConfig = serde_json::from_str(&raw)
        .map_err(|e| SpeakError::Config(e.to_string()))?;
    match config.audio.sample_rate {
        Some(rate) if rate > 0 => Ok(rate as u32),
        Some(rate) => {
            tracing::warn!(config = %config_path.display(), rate, "non-positive sample rate, using fallback");
            Ok(FALLBACK_SAMPLE_RATE)
        }
        None => Ok(FALLBACK_SAMPLE_RATE),
    }
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
