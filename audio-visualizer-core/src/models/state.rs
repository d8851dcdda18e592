use super::error::VisualizerError;

/// Capture controller state machine.
///
/// State transitions:
/// ```text
/// uninitialized → probing → active → released
///                       ↘ failed
/// ```
/// `Failed` and `Released` are terminal; a new controller is needed to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Probing,
    Active { capture_size: usize },
    Failed(VisualizerError),
    Released,
}

impl ControllerState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Released)
    }

    /// The bound capture size while active.
    pub fn capture_size(&self) -> Option<usize> {
        match self {
            Self::Active { capture_size } => Some(*capture_size),
            _ => None,
        }
    }
}
