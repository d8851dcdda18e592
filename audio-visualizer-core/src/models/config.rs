use serde::{Deserialize, Serialize};

use super::audio_models::CaptureSizeRange;
use super::error::VisualizerError;

/// Capture sizes tried after the platform maximum, most preferred first.
pub const DEFAULT_FALLBACK_CAPTURE_SIZES: [usize; 2] = [1024, 512];

/// Configuration for attaching a visualizer tap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Try the platform's maximum capture size before the fallbacks (default: true).
    pub probe_maximum_size: bool,

    /// Fixed capture sizes tried after the maximum (default: 1024, 512).
    pub fallback_capture_sizes: Vec<usize>,

    /// Listener rate is the platform's maximum capture rate divided by this (default: 2).
    pub capture_rate_divisor: u32,

    /// Request time-domain waveform data (default: true).
    pub waveform_enabled: bool,

    /// Request FFT magnitude data (default: true).
    pub fft_enabled: bool,
}

impl VisualizerConfig {
    /// Only the platform maximum is tried; no fallback sizes.
    pub fn maximum_only() -> Self {
        Self {
            fallback_capture_sizes: Vec::new(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.capture_rate_divisor == 0 {
            return Err("capture rate divisor must be positive".into());
        }
        if self.fallback_capture_sizes.contains(&0) {
            return Err("capture sizes must be positive".into());
        }
        if !self.probe_maximum_size && self.fallback_capture_sizes.is_empty() {
            return Err("no capture sizes to probe".into());
        }
        if !self.waveform_enabled && !self.fft_enabled {
            return Err("at least one of waveform or fft capture must be enabled".into());
        }
        Ok(())
    }

    /// Listener rate in millihertz for a platform whose maximum is `max_rate_mhz`.
    pub fn capture_rate(&self, max_rate_mhz: u32) -> u32 {
        (max_rate_mhz / self.capture_rate_divisor.max(1)).max(1)
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            probe_maximum_size: true,
            fallback_capture_sizes: DEFAULT_FALLBACK_CAPTURE_SIZES.to_vec(),
            capture_rate_divisor: 2,
            waveform_enabled: true,
            fft_enabled: true,
        }
    }
}

/// Ordered, non-empty list of capture sizes to probe. First success wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSizes(Vec<usize>);

impl CandidateSizes {
    /// Use `sizes` exactly as given.
    pub fn new(sizes: Vec<usize>) -> Result<Self, VisualizerError> {
        if sizes.is_empty() {
            return Err(VisualizerError::ConfigurationFailed(
                "candidate size list is empty".into(),
            ));
        }
        if sizes.contains(&0) {
            return Err(VisualizerError::ConfigurationFailed(
                "capture sizes must be positive".into(),
            ));
        }
        Ok(Self(sizes))
    }

    /// `[range.max, fallbacks...]`, keeping the first occurrence of each size.
    pub fn for_platform(range: CaptureSizeRange, config: &VisualizerConfig) -> Result<Self, VisualizerError> {
        let mut sizes = Vec::with_capacity(config.fallback_capture_sizes.len() + 1);
        if config.probe_maximum_size {
            sizes.push(range.max);
        }
        for &size in &config.fallback_capture_sizes {
            if !sizes.contains(&size) {
                sizes.push(size);
            }
        }
        Self::new(sizes)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = VisualizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fallback_capture_sizes, vec![1024, 512]);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let zero_divisor = VisualizerConfig {
            capture_rate_divisor: 0,
            ..Default::default()
        };
        assert!(zero_divisor.validate().is_err());

        let nothing_to_probe = VisualizerConfig {
            probe_maximum_size: false,
            fallback_capture_sizes: Vec::new(),
            ..Default::default()
        };
        assert!(nothing_to_probe.validate().is_err());

        let no_streams = VisualizerConfig {
            waveform_enabled: false,
            fft_enabled: false,
            ..Default::default()
        };
        assert!(no_streams.validate().is_err());

        let zero_size = VisualizerConfig {
            fallback_capture_sizes: vec![1024, 0],
            ..Default::default()
        };
        assert!(zero_size.validate().is_err());
    }

    #[test]
    fn capture_rate_is_half_of_max_by_default() {
        let config = VisualizerConfig::default();
        assert_eq!(config.capture_rate(20000), 10000);
        assert_eq!(config.capture_rate(1), 1); // never zero
    }

    #[test]
    fn candidates_put_platform_max_first() {
        let range = CaptureSizeRange::new(128, 2048);
        let candidates = CandidateSizes::for_platform(range, &VisualizerConfig::default()).unwrap();
        assert_eq!(candidates.as_slice(), &[2048, 1024, 512]);
    }

    #[test]
    fn candidates_drop_duplicate_sizes() {
        let range = CaptureSizeRange::new(128, 1024);
        let candidates = CandidateSizes::for_platform(range, &VisualizerConfig::default()).unwrap();
        assert_eq!(candidates.as_slice(), &[1024, 512]);
    }

    #[test]
    fn maximum_only_probes_a_single_size() {
        let range = CaptureSizeRange::new(128, 1024);
        let candidates = CandidateSizes::for_platform(range, &VisualizerConfig::maximum_only()).unwrap();
        assert_eq!(candidates.as_slice(), &[1024]);
    }

    #[test]
    fn explicit_candidates_must_be_non_empty_and_positive() {
        assert!(CandidateSizes::new(Vec::new()).is_err());
        assert!(CandidateSizes::new(vec![512, 0]).is_err());
        assert_eq!(CandidateSizes::new(vec![4096, 1024, 512]).unwrap().len(), 3);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: VisualizerConfig = serde_json::from_str(r#"{"capture_rate_divisor": 4}"#).unwrap();
        assert_eq!(config.capture_rate_divisor, 4);
        assert!(config.probe_maximum_size);
        assert_eq!(config.fallback_capture_sizes, vec![1024, 512]);
    }
}
