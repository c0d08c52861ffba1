//! Service configuration — the on-disk JSON blob.
//!
//! One file holds three sections: `service` (port, voices directory, queue
//! tuning), `sources` (named routing buckets consumed by the source router),
//! and `hotkeys` (bindings for the external keyboard-hook collaborator; the
//! core parses but does not interpret them).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SpeakError;

/// Name of the source used for routing, when the caller names none.
pub const DEFAULT_SOURCE: &str = "default";

/// Default priority for sources that do not set one. Lower is more urgent.
pub const DEFAULT_PRIORITY: i32 = 3;

/// Top-level configuration blob.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Daemon-level settings.
    pub service: ServiceConfig,

    /// Named routing buckets. The `default` key is the fallback source.
    pub sources: HashMap<String, SourceConfig>,

    /// Hotkey bindings, handed verbatim to the keyboard-hook collaborator.
    pub hotkeys: Vec<HotkeyConfig>,
}

/// Daemon-level settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    /// HTTP port, loopback only.
    pub port: u16,

    /// Directory scanned for `<id>.onnx` + `<id>.onnx.json` voice pairs.
    pub voices_dir: PathBuf,

    /// Voice id used when neither the request nor the source names one.
    pub default_voice: String,

    /// Upper bound on {queued items} ∪ {playing item}. Must be ≥ 1.
    pub max_queue_depth: usize,

    /// Whether a more urgent arrival cancels the in-flight utterance.
    pub interrupt_on_higher_priority: bool,
}

/// One named routing bucket.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceConfig {
    /// Voice for utterances routed through this source. Unset falls back
    /// to the catalog default.
    pub voice: Option<String>,

    /// Admission patterns. Unset or empty means "admit all"; otherwise an
    /// utterance is admitted iff any pattern matches (case-insensitive).
    pub filters: Option<Vec<String>>,

    /// Queue priority; lower is more urgent.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

/// One hotkey binding for the external hook.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotkeyConfig {
    /// Key chord, e.g. `"Ctrl+Shift+S"`.
    pub keys: String,

    /// Source to route the captured selection through.
    #[serde(default)]
    pub source: Option<String>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            voice: None,
            filters: None,
            priority: DEFAULT_PRIORITY,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 8573,
            voices_dir: PathBuf::from("voices"),
            default_voice: "en_US-amy-medium".to_owned(),
            max_queue_depth: 8,
            interrupt_on_higher_priority: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut sources = HashMap::new();
        sources.insert(DEFAULT_SOURCE.to_owned(), SourceConfig::default());
        Self {
            service: ServiceConfig::default(),
            sources,
            hotkeys: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the built-in defaults; a present but malformed
    /// file is an error — a half-read config silently dropping sources
    /// would change routing behavior.
    pub fn load(path: &Path) -> Result<Self, SpeakError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| SpeakError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SpeakError> {
        if self.service.max_queue_depth == 0 {
            return Err(SpeakError::Config(
                "service.maxQueueDepth must be at least 1".to_owned(),
            ));
        }
        if !self.sources.contains_key(DEFAULT_SOURCE) {
            tracing::warn!("no 'default' source configured; unmatched submissions will be rejected");
        }
        for (name, source) in &self.sources {
            if source.priority < 0 {
                return Err(SpeakError::Config(format!(
                    "source '{name}': priority must be non-negative"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speakd.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(json.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.service.port, 8573);
        assert_eq!(config.service.max_queue_depth, 8);
        assert!(config.sources.contains_key(DEFAULT_SOURCE));
    }

    #[test]
    fn parses_full_config() {
        let (_dir, path) = write_config(
            r#"{
                "service": {
                    "port": 9000,
                    "voicesDir": "/opt/voices",
                    "defaultVoice": "en_GB-alba-medium",
                    "maxQueueDepth": 4,
                    "interruptOnHigherPriority": false
                },
                "sources": {
                    "default": { "priority": 3 },
                    "t-tracker": {
                        "voice": "en_US-amy-medium",
                        "filters": ["approaching", "arrived"],
                        "priority": 1
                    }
                },
                "hotkeys": [ { "keys": "Ctrl+Shift+S" } ]
            }"#,
        );
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.service.port, 9000);
        assert_eq!(config.service.voices_dir, PathBuf::from("/opt/voices"));
        assert!(!config.service.interrupt_on_higher_priority);
        let tracker = &config.sources["t-tracker"];
        assert_eq!(tracker.priority, 1);
        assert_eq!(tracker.filters.as_ref().unwrap().len(), 2);
        assert_eq!(config.hotkeys.len(), 1);
    }

    #[test]
    fn source_priority_defaults_to_three() {
        let (_dir, path) =
            write_config(r#"{ "sources": { "default": {}, "chat": { "voice": "v" } } }"#);
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.sources["chat"].priority, DEFAULT_PRIORITY);
        assert!(config.sources["chat"].filters.is_none());
    }

    #[test]
    fn zero_depth_is_rejected() {
        let (_dir, path) = write_config(r#"{ "service": { "maxQueueDepth": 0 } }"#);
        assert!(matches!(
            AppConfig::load(&path),
            Err(SpeakError::Config(_))
        ));
    }

    #[test]
    fn negative_priority_is_rejected() {
        let (_dir, path) =
            write_config(r#"{ "sources": { "default": { "priority": -1 } } }"#);
        assert!(matches!(
            AppConfig::load(&path),
            Err(SpeakError::Config(_))
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let (_dir, path) = write_config("{ not json");
        assert!(matches!(
            AppConfig::load(&path),
            Err(SpeakError::Config(_))
        ));
    }
}
