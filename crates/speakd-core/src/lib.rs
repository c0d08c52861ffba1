//! # speakd-core
//!
//! The speech pipeline behind the `speakd` daemon: a hot-reloading voice
//! catalog, a lazily populated synthesizer pool, a source router with regex
//! admission filters, a bounded priority speech queue with preemption, and
//! a clipboard-preserving selection capture protocol.
//!
//! The two hardware-facing collaborators are traits with swappable
//! adapters: [`engine::SpeechEngine`] (sherpa-onnx behind the `sherpa`
//! feature) and [`sink::AudioSink`] (rodio behind the `playback` feature,
//! [`sink::SilentSink`] otherwise).

#![deny(unused_crate_dependencies)]

pub mod capture;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod queue;
pub mod router;
pub mod sink;
pub mod synth;

// Re-export the types most callers wire together.
pub use capture::SelectionCapture;
pub use catalog::{Voice, VoiceCatalog};
pub use config::{AppConfig, ServiceConfig, SourceConfig};
pub use engine::{DisabledEngine, EngineHandle, SpeechEngine, SynthesizedAudio};
pub use error::SpeakError;
pub use queue::{QueueSettings, SpeechQueue, UtteranceSpec};
pub use router::{SourceRouter, Submission};
pub use sink::{AudioSink, PlaybackOutcome, SilentSink};
pub use synth::SynthesizerPool;
