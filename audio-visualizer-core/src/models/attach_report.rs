use std::fmt;

use serde::{Deserialize, Serialize};

use super::audio_models::AudioSessionId;

/// Step of a capture-size attempt that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStage {
    Acquire,
    SetCaptureSize,
    SetListener,
    Enable,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Acquire => "acquire",
            Self::SetCaptureSize => "set capture size",
            Self::SetListener => "set listener",
            Self::Enable => "enable",
        };
        f.write_str(name)
    }
}

/// A rejected candidate size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeAttempt {
    pub capture_size: usize,
    pub failed_stage: ProbeStage,
    pub reason: String,
}

/// Outcome of a successful attach.
///
/// Serializable so hosts can forward it to whatever owns the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachReport {
    pub player_id: String,
    pub session_id: AudioSessionId,
    pub capture_size: usize,
    pub capture_rate_mhz: u32,
    pub waveform_enabled: bool,
    pub fft_enabled: bool,
    /// Candidates rejected before `capture_size`, in probe order.
    pub attempts: Vec<ProbeAttempt>,
    pub attached_at: String,
}

impl AttachReport {
    pub fn new(
        player_id: &str,
        session_id: AudioSessionId,
        capture_size: usize,
        capture_rate_mhz: u32,
        streams: (bool, bool),
        attempts: Vec<ProbeAttempt>,
    ) -> Self {
        Self {
            player_id: player_id.to_string(),
            session_id,
            capture_size,
            capture_rate_mhz,
            waveform_enabled: streams.0,
            fft_enabled: streams.1,
            attempts,
            attached_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Number of partially built resources released before success.
    pub fn fallback_count(&self) -> usize {
        self.attempts.len()
    }
}
