use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle of the audio output pipeline being tapped.
///
/// Owned by whoever created the output session; the tap only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioSessionId(pub i32);

impl fmt::Display for AudioSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for AudioSessionId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Inclusive range of capture sizes a platform accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSizeRange {
    pub min: usize,
    pub max: usize,
}

impl CaptureSizeRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, size: usize) -> bool {
        (self.min..=self.max).contains(&size)
    }
}

/// The two streams a capture tick can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    Waveform,
    Fft,
}

/// Counters for data delivered to the consumer callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub waveform_frames: u64,
    pub fft_frames: u64,
    pub waveform_bytes: u64,
    pub fft_bytes: u64,
}
