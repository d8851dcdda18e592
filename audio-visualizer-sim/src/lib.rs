//! # audio-visualizer-sim
//!
//! In-process software backend for audio-visualizer-core.
//!
//! Provides:
//! - `SoftwareVisualizer` — `VisualizerPlatform` with per-session exclusivity and size limits
//! - `SoftwareCaptureResource` — capture resource ticking on its own thread
//! - `ToneSource`, `PcmFeed` — audio behind a registered session
//! - `encoding` — 8-bit waveform and packed FFT byte formats
//!
//! ## Usage
//! ```ignore
//! use audio_visualizer_core::{AudioSessionId, CaptureController, VisualizerConfig};
//! use audio_visualizer_sim::{PcmFeed, SimSettings, SoftwareVisualizer};
//!
//! let platform = SoftwareVisualizer::new(SimSettings::default());
//! let feed = PcmFeed::new(48_000);
//! platform.register_session(AudioSessionId(7), feed.clone());
//! let controller = CaptureController::open(&platform, "player-1", AudioSessionId(7), callback, &VisualizerConfig::default())?;
//! ```

pub mod encoding;
pub mod platform;
pub mod resource;
pub mod source;

pub use platform::{SimSettings, SoftwareVisualizer};
pub use resource::SoftwareCaptureResource;
pub use source::{PcmFeed, SampleSource, ToneSource};
