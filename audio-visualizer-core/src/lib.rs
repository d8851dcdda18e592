//! # audio-visualizer-core
//!
//! Platform-agnostic visualizer tap for live audio output sessions.
//!
//! Attaches an analysis tap to an output session, probing capture sizes until
//! the platform accepts one, and streams waveform and FFT bytes to a consumer
//! tagged with the owning player's id. Platform backends implement
//! `VisualizerPlatform` / `CaptureResource` and plug into `CaptureController`.
//!
//! ## Architecture
//!
//! ```text
//! audio-visualizer-core (this crate)
//! ├── traits/    ← VisualizerPlatform, CaptureResource, DataCaptureListener, VisualizerCallback
//! ├── models/    ← VisualizerError, ControllerState, VisualizerConfig, AttachReport, etc.
//! ├── session/   ← CaptureController (size probing + lifecycle)
//! └── storage/   ← JSON config files
//! ```

pub mod models;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::attach_report::{AttachReport, ProbeAttempt, ProbeStage};
pub use models::audio_models::{AudioSessionId, CaptureDiagnostics, CaptureSizeRange, SampleKind};
pub use models::config::{CandidateSizes, VisualizerConfig, DEFAULT_FALLBACK_CAPTURE_SIZES};
pub use models::error::VisualizerError;
pub use models::state::ControllerState;
pub use session::controller::CaptureController;
pub use storage::config_file::{read_config, write_config};
pub use traits::visualizer_callback::VisualizerCallback;
pub use traits::visualizer_platform::{
    CaptureResource, DataCaptureListener, ListenerRegistration, SampleHandler, VisualizerPlatform,
};
