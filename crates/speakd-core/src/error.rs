//! Speech pipeline error types.

/// Errors that can occur in the speech pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SpeakError {
    /// Text was empty or whitespace-only after trimming.
    #[error("Text is empty after trimming")]
    TextRejected,

    /// Requested voice is not in the catalog.
    #[error("Voice '{0}' is not available")]
    VoiceUnavailable(String),

    /// The TTS engine failed to load a voice or synthesize.
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    /// The audio sink failed to play synthesized samples.
    #[error("Audio playback failed: {0}")]
    PlaybackFailed(String),

    /// The request's cancel flag fired.
    #[error("Speech request cancelled")]
    Cancelled,

    /// Selection capture is not available on this host.
    #[error("Selection capture is not available: {0}")]
    CaptureUnavailable(String),

    /// Configuration file problem (unreadable, unparseable, invalid).
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (voices directory, config file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
