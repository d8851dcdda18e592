use std::fs;
use std::path::Path;

use crate::models::config::VisualizerConfig;
use crate::models::error::VisualizerError;

/// Write a visualizer configuration as pretty-printed JSON.
pub fn write_config(config: &VisualizerConfig, path: &Path) -> Result<(), VisualizerError> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| VisualizerError::StorageError(format!("failed to serialize config: {}", e)))?;
    fs::write(path, json).map_err(|e| VisualizerError::StorageError(format!("failed to write config: {}", e)))?;
    Ok(())
}

/// Read and validate a visualizer configuration. Missing fields take their defaults.
pub fn read_config(path: &Path) -> Result<VisualizerConfig, VisualizerError> {
    let json = fs::read_to_string(path)
        .map_err(|e| VisualizerError::StorageError(format!("failed to read config: {}", e)))?;
    let config: VisualizerConfig = serde_json::from_str(&json)
        .map_err(|e| VisualizerError::StorageError(format!("failed to parse config: {}", e)))?;
    config.validate().map_err(VisualizerError::ConfigurationFailed)?;
    Ok(config)
}
