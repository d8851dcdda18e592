use crate::models::state::ControllerState;

/// Consumer of captured visualizer data.
///
/// Data methods are called from the platform's capture thread, not the
/// thread that attached the tap. Implementations should hand the bytes off
/// quickly; blocking here stalls the capture cadence.
pub trait VisualizerCallback: Send + Sync {
    /// Called once per tick with time-domain waveform bytes.
    fn on_waveform_data(&self, player_id: &str, data: &[u8]);

    /// Called once per tick with FFT magnitude bytes.
    fn on_fft_data(&self, player_id: &str, data: &[u8]);

    /// Called on the attaching thread when the controller changes state.
    fn on_state_changed(&self, _player_id: &str, _state: &ControllerState) {}
}
