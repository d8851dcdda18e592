//! In-process visualizer platform.
//!
//! Mirrors the constraints of a mobile audio-effects visualizer: one live
//! capture resource per session, power-of-two capture sizes within a fixed
//! range, and a bounded tick rate. Individual sizes, listener registration or
//! enabling can be refused to exercise fallback paths.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use audio_visualizer_core::models::audio_models::{AudioSessionId, CaptureSizeRange};
use audio_visualizer_core::models::error::VisualizerError;
use audio_visualizer_core::traits::visualizer_platform::VisualizerPlatform;

use crate::resource::SoftwareCaptureResource;
use crate::source::SampleSource;

/// Smallest capture size the software platform accepts, whatever the range says.
pub const MIN_CAPTURE_SIZE: usize = 2;

/// Limits and injected failures of a [`SoftwareVisualizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimSettings {
    /// Supported capture sizes (default: 128..=1024).
    pub capture_size_range: CaptureSizeRange,

    /// Fastest tick rate in millihertz (default: 20000, i.e. 20 Hz).
    pub max_capture_rate_mhz: u32,

    /// Sizes refused even though they are in range.
    pub rejected_sizes: Vec<usize>,

    /// Refuse every listener registration.
    pub reject_listener: bool,

    /// Refuse every enable request.
    pub reject_enable: bool,
}

impl SimSettings {
    pub(crate) fn check_capture_size(&self, size: usize) -> Result<(), VisualizerError> {
        let range = self.capture_size_range;
        // The packed FFT layout needs at least the DC and Nyquist slots.
        if size < MIN_CAPTURE_SIZE
            || !size.is_power_of_two()
            || !range.contains(size)
            || self.rejected_sizes.contains(&size)
        {
            return Err(VisualizerError::UnsupportedCaptureSize {
                size,
                min: range.min,
                max: range.max,
            });
        }
        Ok(())
    }
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            capture_size_range: CaptureSizeRange::new(128, 1024),
            max_capture_rate_mhz: 20000,
            rejected_sizes: Vec::new(),
            reject_listener: false,
            reject_enable: false,
        }
    }
}

pub(crate) type SharedSource = Arc<Mutex<Box<dyn SampleSource>>>;

struct SessionSlot {
    source: SharedSource,
    attached: bool,
}

/// State shared between the platform handle and its resources.
pub(crate) struct PlatformShared {
    pub(crate) settings: SimSettings,
    sessions: Mutex<HashMap<AudioSessionId, SessionSlot>>,
}

impl PlatformShared {
    /// Free the session's resource slot. No-op for unknown sessions.
    pub(crate) fn detach(&self, session: AudioSessionId) {
        if let Some(slot) = self.sessions.lock().get_mut(&session) {
            slot.attached = false;
        }
    }
}

/// Software visualizer platform. Cloning shares the same sessions.
#[derive(Clone)]
pub struct SoftwareVisualizer {
    shared: Arc<PlatformShared>,
}

impl SoftwareVisualizer {
    pub fn new(settings: SimSettings) -> Self {
        Self {
            shared: Arc::new(PlatformShared {
                settings,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Make `session` tappable, sampling from `source`.
    ///
    /// Replaces any previous source; a live resource keeps sampling the old one.
    pub fn register_session(&self, session: AudioSessionId, source: impl SampleSource + 'static) {
        let source: Box<dyn SampleSource> = Box::new(source);
        let mut sessions = self.shared.sessions.lock();
        let attached = sessions.get(&session).is_some_and(|s| s.attached);
        sessions.insert(
            session,
            SessionSlot {
                source: Arc::new(Mutex::new(source)),
                attached,
            },
        );
    }

    /// Forget `session`. Returns whether it was registered.
    pub fn unregister_session(&self, session: AudioSessionId) -> bool {
        self.shared.sessions.lock().remove(&session).is_some()
    }

    /// Whether a capture resource currently holds `session`.
    pub fn has_live_resource(&self, session: AudioSessionId) -> bool {
        self.shared.sessions.lock().get(&session).is_some_and(|s| s.attached)
    }
}

impl VisualizerPlatform for SoftwareVisualizer {
    type Resource = SoftwareCaptureResource;

    fn acquire(&self, session: AudioSessionId) -> Result<SoftwareCaptureResource, VisualizerError> {
        let source = {
            let mut sessions = self.shared.sessions.lock();
            let slot = sessions
                .get_mut(&session)
                .ok_or(VisualizerError::InvalidSession(session))?;
            if slot.attached {
                return Err(VisualizerError::ResourceBusy(session));
            }
            slot.attached = true;
            Arc::clone(&slot.source)
        };

        log::debug!("Acquired software visualizer for session {}", session);
        Ok(SoftwareCaptureResource::new(session, source, Arc::clone(&self.shared)))
    }

    fn capture_size_range(&self) -> CaptureSizeRange {
        self.shared.settings.capture_size_range
    }

    fn max_capture_rate(&self) -> u32 {
        self.shared.settings.max_capture_rate_mhz
    }
}
