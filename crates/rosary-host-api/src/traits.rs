//! Host collaborator traits

use rosary_api::{AnimationInputs, Frame};
use thiserror::Error;

/// Errors from host collaborators
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// Device haptics bridge.
///
/// Calls are fire-and-forget: the core ignores errors.
pub trait HapticNotifier: Send + Sync {
    /// Short, light impact
    fn light_impact(&self) -> HostResult<()>;

    fn is_available(&self) -> bool {
        true
    }
}

/// Haptics for hosts without a vibration device
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHaptics;

impl HapticNotifier for NoopHaptics {
    fn light_impact(&self) -> HostResult<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Paints the current frame
pub trait Renderer: Send + Sync {
    fn render(&self, frame: &Frame) -> HostResult<()>;
}

/// Drives the ambient animation from read-only inputs
pub trait AnimationDriver: Send + Sync {
    fn update(&self, inputs: &AnimationInputs) -> HostResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_haptics_is_unavailable_but_succeeds() {
        let haptics = NoopHaptics;
        assert!(!haptics.is_available());
        assert!(haptics.light_impact().is_ok());
    }
}
