use thiserror::Error;

use super::audio_models::AudioSessionId;

/// Errors raised by the visualizer tap and by platform backends.
///
/// Per-attempt failures (`UnsupportedCaptureSize`, `ListenerRejected`, ...)
/// are contained inside the capture-size probe. Only
/// `NoSupportedCaptureSize` escapes a failed attach.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VisualizerError {
    #[error("invalid audio session {0}")]
    InvalidSession(AudioSessionId),

    #[error("a capture resource already exists for session {0}")]
    ResourceBusy(AudioSessionId),

    #[error("unsupported capture size {size} (supported range {min}..={max})")]
    UnsupportedCaptureSize { size: usize, min: usize, max: usize },

    #[error("listener registration rejected: {0}")]
    ListenerRejected(String),

    #[error("enable failed: {0}")]
    EnableFailed(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("could not initialize visualizer with any capture size (tried {attempted:?})")]
    NoSupportedCaptureSize { attempted: Vec<usize> },

    #[error("storage error: {0}")]
    StorageError(String),
}
