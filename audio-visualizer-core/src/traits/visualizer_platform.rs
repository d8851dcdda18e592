use std::fmt;
use std::sync::Arc;

use crate::models::audio_models::{AudioSessionId, CaptureSizeRange};
use crate::models::error::VisualizerError;

/// Handler for one stream of capture data.
///
/// Receives the raw bytes of a single tick. Called on the platform's
/// capture thread.
pub type SampleHandler = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Listener with independent waveform and FFT handlers.
///
/// Platforms call [`on_waveform_capture`](Self::on_waveform_capture) and
/// [`on_fft_capture`](Self::on_fft_capture) once per tick. Missing or empty
/// payloads are dropped here so handlers only ever see data.
#[derive(Clone)]
pub struct DataCaptureListener {
    waveform: SampleHandler,
    fft: SampleHandler,
}

impl DataCaptureListener {
    pub fn new(waveform: SampleHandler, fft: SampleHandler) -> Self {
        Self { waveform, fft }
    }

    pub fn on_waveform_capture(&self, waveform: Option<&[u8]>) {
        if let Some(data) = waveform.filter(|d| !d.is_empty()) {
            (self.waveform)(data);
        }
    }

    pub fn on_fft_capture(&self, fft: Option<&[u8]>) {
        if let Some(data) = fft.filter(|d| !d.is_empty()) {
            (self.fft)(data);
        }
    }
}

impl fmt::Debug for DataCaptureListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataCaptureListener").finish_non_exhaustive()
    }
}

/// Listener plus the rate and streams it should be driven with.
#[derive(Debug, Clone)]
pub struct ListenerRegistration {
    pub listener: DataCaptureListener,
    /// Tick rate in millihertz.
    pub rate_mhz: u32,
    pub waveform: bool,
    pub fft: bool,
}

/// Platform audio-effects subsystem that can tap an output session.
///
/// Implemented by:
/// - `SoftwareVisualizer` (`audio-visualizer-sim`)
/// - Future: an Android `Visualizer` bridge
pub trait VisualizerPlatform {
    type Resource: CaptureResource;

    /// Create a capture resource bound to `session`.
    ///
    /// Fails if the session is unknown or already has a live resource.
    fn acquire(&self, session: AudioSessionId) -> Result<Self::Resource, VisualizerError>;

    /// Capture sizes this platform supports.
    fn capture_size_range(&self) -> CaptureSizeRange;

    /// Fastest tick rate in millihertz.
    fn max_capture_rate(&self) -> u32;
}

/// A platform-held analysis tap on one session.
pub trait CaptureResource: Send {
    /// Set the capture size. Only valid while disabled.
    fn set_capture_size(&mut self, size: usize) -> Result<(), VisualizerError>;

    fn capture_size(&self) -> usize;

    fn set_data_capture_listener(&mut self, registration: ListenerRegistration) -> Result<(), VisualizerError>;

    /// Start or stop periodic capture.
    fn set_enabled(&mut self, enabled: bool) -> Result<(), VisualizerError>;

    fn is_enabled(&self) -> bool;

    /// Free all platform state held for this resource.
    fn release(self);
}
