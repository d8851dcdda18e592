//! Capture resource of the software visualizer.
//!
//! Enabling spawns a dedicated capture thread that ticks at the registered
//! rate. Each tick reads `capture_size` frames from the session source and
//! delivers waveform and FFT bytes to the listener. If the source is short,
//! the tick carries no data.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use audio_visualizer_core::models::audio_models::AudioSessionId;
use audio_visualizer_core::models::error::VisualizerError;
use audio_visualizer_core::traits::visualizer_platform::{CaptureResource, ListenerRegistration};

use crate::encoding::{waveform_bytes, FftEncoder};
use crate::platform::{PlatformShared, SharedSource};

/// A software analysis tap on one session.
pub struct SoftwareCaptureResource {
    session: AudioSessionId,
    source: SharedSource,
    shared: Arc<PlatformShared>,
    capture_size: usize,
    registration: Option<ListenerRegistration>,
    enabled: bool,
    running: Arc<AtomicBool>,
    capture_handle: Option<thread::JoinHandle<()>>,
    released: bool,
}

impl SoftwareCaptureResource {
    pub(crate) fn new(session: AudioSessionId, source: SharedSource, shared: Arc<PlatformShared>) -> Self {
        let capture_size = shared.settings.capture_size_range.max;
        Self {
            session,
            source,
            shared,
            capture_size,
            registration: None,
            enabled: false,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: None,
            released: false,
        }
    }

    fn start_capture(&mut self) -> Result<(), VisualizerError> {
        let Some(registration) = self.registration.clone() else {
            return Ok(());
        };

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let source = Arc::clone(&self.source);
        let capture_size = self.capture_size;
        let session = self.session;

        let handle = thread::Builder::new()
            .name(format!("visualizer-capture-{}", session))
            .spawn(move || {
                log::debug!("Visualizer capture started for session {}", session);
                capture_loop(&running, &source, &registration, capture_size);
                log::debug!("Visualizer capture stopped for session {}", session);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                VisualizerError::EnableFailed(format!("failed to spawn capture thread: {}", e))
            })?;

        self.capture_handle = Some(handle);
        Ok(())
    }

    fn stop_capture(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.take() {
            handle.thread().unpark();
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                log::warn!("Visualizer capture thread for session {} panicked", self.session);
            }
        }
    }

    fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.stop_capture();
        self.enabled = false;
        self.registration = None;
        self.shared.detach(self.session);
        self.released = true;
        log::debug!("Released software visualizer for session {}", self.session);
    }
}

impl CaptureResource for SoftwareCaptureResource {
    fn set_capture_size(&mut self, size: usize) -> Result<(), VisualizerError> {
        if self.enabled {
            return Err(VisualizerError::InvalidState(
                "capture size can only be set while disabled".into(),
            ));
        }
        self.shared.settings.check_capture_size(size)?;
        self.capture_size = size;
        Ok(())
    }

    fn capture_size(&self) -> usize {
        self.capture_size
    }

    fn set_data_capture_listener(&mut self, registration: ListenerRegistration) -> Result<(), VisualizerError> {
        let settings = &self.shared.settings;
        if self.enabled {
            return Err(VisualizerError::InvalidState(
                "listener can only be set while disabled".into(),
            ));
        }
        if settings.reject_listener {
            return Err(VisualizerError::ListenerRejected("listener registration refused".into()));
        }
        if registration.rate_mhz == 0 || registration.rate_mhz > settings.max_capture_rate_mhz {
            return Err(VisualizerError::ListenerRejected(format!(
                "capture rate {} mHz outside 1..={}",
                registration.rate_mhz, settings.max_capture_rate_mhz
            )));
        }
        self.registration = Some(registration);
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), VisualizerError> {
        if self.released {
            return Err(VisualizerError::InvalidState("resource already released".into()));
        }
        if enabled == self.enabled {
            return Ok(());
        }

        if enabled {
            if self.shared.settings.reject_enable {
                return Err(VisualizerError::EnableFailed("enable refused".into()));
            }
            self.start_capture()?;
        } else {
            self.stop_capture();
        }
        self.enabled = enabled;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn release(mut self) {
        self.shutdown();
    }
}

impl Drop for SoftwareCaptureResource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Tick until `running` is cleared. Period is `1e9 / rate_mhz` microseconds.
fn capture_loop(
    running: &AtomicBool,
    source: &SharedSource,
    registration: &ListenerRegistration,
    capture_size: usize,
) {
    let period = Duration::from_micros(1_000_000_000 / u64::from(registration.rate_mhz.max(1)));
    let mut encoder = registration.fft.then(|| FftEncoder::new(capture_size));
    let mut next_tick = Instant::now() + period;

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now < next_tick {
            thread::park_timeout(next_tick - now);
            continue;
        }
        next_tick = next_deadline(next_tick, now, period);

        let frames = source.lock().read_frames(capture_size);
        let waveform = frames.map(|f| waveform_bytes(&f));
        let fft = match (&waveform, encoder.as_mut()) {
            (Some(w), Some(encoder)) => Some(encoder.encode(w)),
            _ => None,
        };

        if registration.waveform {
            registration.listener.on_waveform_capture(waveform.as_deref());
        }
        registration.listener.on_fft_capture(fft.as_deref());
    }
}

/// Deadline after the tick due at `due`, observed at `now`.
///
/// A stall longer than one period drops the missed ticks instead of
/// replaying them back to back.
fn next_deadline(due: Instant, now: Instant, period: Duration) -> Instant {
    let next = due + period;
    if now >= next {
        now + period
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{SimSettings, SoftwareVisualizer};
    use crate::source::PcmFeed;
    use audio_visualizer_core::models::audio_models::CaptureSizeRange;
    use audio_visualizer_core::traits::visualizer_platform::{DataCaptureListener, VisualizerPlatform};
    use std::sync::mpsc;

    fn fast_settings() -> SimSettings {
        SimSettings {
            max_capture_rate_mhz: 200_000, // 200 Hz
            ..Default::default()
        }
    }

    fn registration(rate_mhz: u32, tx: mpsc::Sender<(&'static str, usize)>) -> ListenerRegistration {
        let fft_tx = tx.clone();
        ListenerRegistration {
            listener: DataCaptureListener::new(
                Arc::new(move |data: &[u8]| {
                    let _ = tx.send(("waveform", data.len()));
                }),
                Arc::new(move |data: &[u8]| {
                    let _ = fft_tx.send(("fft", data.len()));
                }),
            ),
            rate_mhz,
            waveform: true,
            fft: true,
        }
    }

    #[test]
    fn listener_rate_must_be_within_platform_max() {
        let platform = SoftwareVisualizer::new(fast_settings());
        platform.register_session(AudioSessionId(1), PcmFeed::new(16));
        let mut resource = platform.acquire(AudioSessionId(1)).unwrap();
        let (tx, _rx) = mpsc::channel();

        let err = resource.set_data_capture_listener(registration(200_001, tx.clone())).unwrap_err();
        assert!(matches!(err, VisualizerError::ListenerRejected(_)));

        let err = resource.set_data_capture_listener(registration(0, tx.clone())).unwrap_err();
        assert!(matches!(err, VisualizerError::ListenerRejected(_)));

        assert!(resource.set_data_capture_listener(registration(100_000, tx)).is_ok());
    }

    #[test]
    fn refused_enable_leaves_resource_disabled() {
        let platform = SoftwareVisualizer::new(SimSettings {
            reject_enable: true,
            ..fast_settings()
        });
        platform.register_session(AudioSessionId(1), PcmFeed::new(16));
        let mut resource = platform.acquire(AudioSessionId(1)).unwrap();

        assert!(matches!(resource.set_enabled(true), Err(VisualizerError::EnableFailed(_))));
        assert!(!resource.is_enabled());
    }

    #[test]
    fn enabled_resource_delivers_both_streams() {
        let platform = SoftwareVisualizer::new(fast_settings());
        let feed = PcmFeed::new(4096);
        platform.register_session(AudioSessionId(1), feed.clone());
        let mut resource = platform.acquire(AudioSessionId(1)).unwrap();
        let (tx, rx) = mpsc::channel();

        resource.set_capture_size(128).unwrap();
        resource.set_data_capture_listener(registration(200_000, tx)).unwrap();
        resource.set_enabled(true).unwrap();
        feed.push(&[0.25; 128]);

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first, ("waveform", 128));
        assert_eq!(second, ("fft", 128));

        assert!(matches!(
            resource.set_capture_size(256),
            Err(VisualizerError::InvalidState(_))
        ));

        resource.set_enabled(false).unwrap();
        assert!(!resource.is_enabled());
        resource.release();
        assert!(!platform.has_live_resource(AudioSessionId(1)));
    }

    #[test]
    fn on_time_ticks_keep_a_fixed_cadence() {
        let start = Instant::now();
        let period = Duration::from_millis(10);

        let late = start + Duration::from_millis(3);
        assert_eq!(next_deadline(start, late, period), start + period);
    }

    #[test]
    fn stalled_ticks_are_skipped_not_replayed() {
        let start = Instant::now();
        let period = Duration::from_millis(10);

        let stalled = start + Duration::from_millis(55);
        assert_eq!(next_deadline(start, stalled, period), stalled + period);

        let exactly_one_late = start + period;
        assert_eq!(next_deadline(start, exactly_one_late, period), exactly_one_late + period);
    }

    #[test]
    fn two_frame_capture_delivers_both_streams() {
        let platform = SoftwareVisualizer::new(SimSettings {
            capture_size_range: CaptureSizeRange::new(1, 1024),
            ..fast_settings()
        });
        let feed = PcmFeed::new(64);
        platform.register_session(AudioSessionId(1), feed.clone());
        let mut resource = platform.acquire(AudioSessionId(1)).unwrap();
        let (tx, rx) = mpsc::channel();

        assert!(resource.set_capture_size(1).is_err());
        resource.set_capture_size(2).unwrap();
        resource.set_data_capture_listener(registration(200_000, tx)).unwrap();
        resource.set_enabled(true).unwrap();
        feed.push(&[1.0, -1.0]);

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), ("waveform", 2));
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), ("fft", 2));

        resource.release();
        assert!(!platform.has_live_resource(AudioSessionId(1)));
    }

    #[test]
    fn short_source_delivers_nothing() {
        let platform = SoftwareVisualizer::new(fast_settings());
        platform.register_session(AudioSessionId(1), PcmFeed::new(4096));
        let mut resource = platform.acquire(AudioSessionId(1)).unwrap();
        let (tx, rx) = mpsc::channel();

        resource.set_capture_size(128).unwrap();
        resource.set_data_capture_listener(registration(200_000, tx)).unwrap();
        resource.set_enabled(true).unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        resource.release();
    }
}
