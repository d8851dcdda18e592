use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, warn};

use crate::models::attach_report::{AttachReport, ProbeAttempt, ProbeStage};
use crate::models::audio_models::{AudioSessionId, CaptureDiagnostics, SampleKind};
use crate::models::config::{CandidateSizes, VisualizerConfig};
use crate::models::error::VisualizerError;
use crate::models::state::ControllerState;
use crate::traits::visualizer_callback::VisualizerCallback;
use crate::traits::visualizer_platform::{
    CaptureResource, DataCaptureListener, ListenerRegistration, SampleHandler, VisualizerPlatform,
};

/// Delivery counters shared with the listener handlers.
#[derive(Debug, Default)]
struct DeliveryCounters {
    waveform_frames: AtomicU64,
    fft_frames: AtomicU64,
    waveform_bytes: AtomicU64,
    fft_bytes: AtomicU64,
}

impl DeliveryCounters {
    fn record(&self, kind: SampleKind, len: usize) {
        let (frames, bytes) = match kind {
            SampleKind::Waveform => (&self.waveform_frames, &self.waveform_bytes),
            SampleKind::Fft => (&self.fft_frames, &self.fft_bytes),
        };
        frames.fetch_add(1, Ordering::Relaxed);
        bytes.fetch_add(len as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CaptureDiagnostics {
        CaptureDiagnostics {
            waveform_frames: self.waveform_frames.load(Ordering::Relaxed),
            fft_frames: self.fft_frames.load(Ordering::Relaxed),
            waveform_bytes: self.waveform_bytes.load(Ordering::Relaxed),
            fft_bytes: self.fft_bytes.load(Ordering::Relaxed),
        }
    }
}

/// Why a single candidate size was rejected.
#[derive(Debug)]
struct AttemptFailure {
    stage: ProbeStage,
    error: VisualizerError,
}

impl AttemptFailure {
    fn at(stage: ProbeStage) -> impl FnOnce(VisualizerError) -> Self {
        move |error| Self { stage, error }
    }
}

/// Owns one visualizer tap bound to one audio session.
///
/// Attaching probes candidate capture sizes in order. Each attempt acquires a
/// resource, sets the size, registers the waveform/FFT listener and enables
/// it; a failure at any step releases that attempt's resource before the next
/// size is tried. Exactly one enabled resource is held afterwards, or none.
///
/// ```text
/// [Platform tick] → [DataCaptureListener] ─┬→ on_waveform_data(player_id, bytes)
///                                          └→ on_fft_data(player_id, bytes)
/// ```
pub struct CaptureController<R: CaptureResource> {
    player_id: Arc<str>,
    session_id: AudioSessionId,
    callback: Arc<dyn VisualizerCallback>,
    state: ControllerState,
    resource: Option<R>,
    report: Option<AttachReport>,
    counters: Arc<DeliveryCounters>,
}

impl<R: CaptureResource> CaptureController<R> {
    /// Create an unattached controller. Fails if `player_id` is empty.
    pub fn new(
        player_id: impl Into<String>,
        session_id: AudioSessionId,
        callback: Arc<dyn VisualizerCallback>,
    ) -> Result<Self, VisualizerError> {
        let player_id = player_id.into();
        if player_id.is_empty() {
            return Err(VisualizerError::ConfigurationFailed(
                "player id must not be empty".into(),
            ));
        }

        Ok(Self {
            player_id: Arc::from(player_id),
            session_id,
            callback,
            state: ControllerState::Uninitialized,
            resource: None,
            report: None,
            counters: Arc::new(DeliveryCounters::default()),
        })
    }

    /// Create a controller and attach it in one step.
    pub fn open<P>(
        platform: &P,
        player_id: impl Into<String>,
        session_id: AudioSessionId,
        callback: Arc<dyn VisualizerCallback>,
        config: &VisualizerConfig,
    ) -> Result<Self, VisualizerError>
    where
        P: VisualizerPlatform<Resource = R>,
    {
        let mut controller = Self::new(player_id, session_id, callback)?;
        controller.attach(platform, config)?;
        Ok(controller)
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn session_id(&self) -> AudioSessionId {
        self.session_id
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Capture size of the held resource, if any.
    pub fn capture_size(&self) -> Option<usize> {
        self.resource.as_ref().map(|r| r.capture_size())
    }

    /// Report from the successful attach, kept after release.
    pub fn report(&self) -> Option<&AttachReport> {
        self.report.as_ref()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.counters.snapshot()
    }

    /// Probe the platform maximum followed by the configured fallbacks.
    pub fn attach<P>(&mut self, platform: &P, config: &VisualizerConfig) -> Result<&AttachReport, VisualizerError>
    where
        P: VisualizerPlatform<Resource = R>,
    {
        self.ensure_uninitialized()?;
        config.validate().map_err(VisualizerError::ConfigurationFailed)?;
        let candidates = CandidateSizes::for_platform(platform.capture_size_range(), config)?;
        self.attach_with_sizes(platform, &candidates, config)
    }

    /// Probe `candidates` in order. Transitions: uninitialized → probing → active/failed.
    pub fn attach_with_sizes<P>(
        &mut self,
        platform: &P,
        candidates: &CandidateSizes,
        config: &VisualizerConfig,
    ) -> Result<&AttachReport, VisualizerError>
    where
        P: VisualizerPlatform<Resource = R>,
    {
        self.ensure_uninitialized()?;
        config.validate().map_err(VisualizerError::ConfigurationFailed)?;

        self.set_state(ControllerState::Probing);

        let rate_mhz = config.capture_rate(platform.max_capture_rate());
        let listener = self.build_listener();
        let mut attempts = Vec::new();

        for capture_size in candidates.iter() {
            let registration = ListenerRegistration {
                listener: listener.clone(),
                rate_mhz,
                waveform: config.waveform_enabled,
                fft: config.fft_enabled,
            };

            match Self::try_attach(platform, self.session_id, capture_size, registration) {
                Ok(resource) => {
                    debug!(
                        "Visualizer attached to session {} for player {} with capture size {}",
                        self.session_id, self.player_id, capture_size
                    );
                    let report = AttachReport::new(
                        &self.player_id,
                        self.session_id,
                        capture_size,
                        rate_mhz,
                        (config.waveform_enabled, config.fft_enabled),
                        attempts,
                    );
                    self.resource = Some(resource);
                    self.set_state(ControllerState::Active { capture_size });
                    return Ok(&*self.report.insert(report));
                }
                Err(failure) => {
                    warn!(
                        "Visualizer failed with capture size {} at {}: {}",
                        capture_size, failure.stage, failure.error
                    );
                    attempts.push(ProbeAttempt {
                        capture_size,
                        failed_stage: failure.stage,
                        reason: failure.error.to_string(),
                    });
                }
            }
        }

        let err = VisualizerError::NoSupportedCaptureSize {
            attempted: candidates.as_slice().to_vec(),
        };
        error!(
            "Error attaching visualizer to session {} for player {}: {}",
            self.session_id, self.player_id, err
        );
        self.set_state(ControllerState::Failed(err.clone()));
        Err(err)
    }

    /// Disable and release the held resource. Safe to call repeatedly.
    ///
    /// Platform errors while disabling are logged and dropped.
    pub fn release(&mut self) {
        let Some(mut resource) = self.resource.take() else {
            return;
        };

        if let Err(e) = resource.set_enabled(false) {
            warn!("Failed to disable visualizer for player {}: {}", self.player_id, e);
        }
        resource.release();

        self.set_state(ControllerState::Released);
        debug!("Visualizer released for player {}", self.player_id);
    }

    // --- Internal helpers ---

    fn ensure_uninitialized(&self) -> Result<(), VisualizerError> {
        match self.state {
            ControllerState::Uninitialized => Ok(()),
            ref other => Err(VisualizerError::InvalidState(format!(
                "can only attach from uninitialized state (currently {:?})",
                other
            ))),
        }
    }

    fn set_state(&mut self, new_state: ControllerState) {
        self.callback.on_state_changed(&self.player_id, &new_state);
        self.state = new_state;
    }

    /// One candidate: acquire, then configure; the resource is released on any
    /// configure failure.
    fn try_attach<P>(
        platform: &P,
        session_id: AudioSessionId,
        capture_size: usize,
        registration: ListenerRegistration,
    ) -> Result<R, AttemptFailure>
    where
        P: VisualizerPlatform<Resource = R>,
    {
        let mut resource = platform
            .acquire(session_id)
            .map_err(AttemptFailure::at(ProbeStage::Acquire))?;

        match Self::configure(&mut resource, capture_size, registration) {
            Ok(()) => Ok(resource),
            Err(failure) => {
                resource.release();
                Err(failure)
            }
        }
    }

    fn configure(
        resource: &mut R,
        capture_size: usize,
        registration: ListenerRegistration,
    ) -> Result<(), AttemptFailure> {
        resource
            .set_capture_size(capture_size)
            .map_err(AttemptFailure::at(ProbeStage::SetCaptureSize))?;
        resource
            .set_data_capture_listener(registration)
            .map_err(AttemptFailure::at(ProbeStage::SetListener))?;
        resource
            .set_enabled(true)
            .map_err(AttemptFailure::at(ProbeStage::Enable))?;
        Ok(())
    }

    fn build_listener(&self) -> DataCaptureListener {
        DataCaptureListener::new(
            self.stream_handler(SampleKind::Waveform),
            self.stream_handler(SampleKind::Fft),
        )
    }

    fn stream_handler(&self, kind: SampleKind) -> SampleHandler {
        let player_id = Arc::clone(&self.player_id);
        let callback = Arc::clone(&self.callback);
        let counters = Arc::clone(&self.counters);

        Arc::new(move |data: &[u8]| {
            counters.record(kind, data.len());
            match kind {
                SampleKind::Waveform => callback.on_waveform_data(&player_id, data),
                SampleKind::Fft => callback.on_fft_data(&player_id, data),
            }
        })
    }
}

impl<R: CaptureResource> Drop for CaptureController<R> {
    fn drop(&mut self) {
        self.release();
    }
}
