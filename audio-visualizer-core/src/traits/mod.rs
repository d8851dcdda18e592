pub mod visualizer_callback;
pub mod visualizer_platform;
