pub mod attach_report;
pub mod audio_models;
pub mod config;
pub mod error;
pub mod state;
