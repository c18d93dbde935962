//! Recording collaborators for unit/integration testing

use rosary_api::{AnimationInputs, Frame};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::{AnimationDriver, HapticNotifier, HostError, HostResult, Renderer};

/// Haptics that count impacts and can be told to fail
#[derive(Debug, Default)]
pub struct MockHaptics {
    impacts: AtomicUsize,

    /// Configure light_impact to fail
    pub fail: AtomicBool,
}

impl MockHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Impacts requested so far, including failed ones
    pub fn impacts(&self) -> usize {
        self.impacts.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl HapticNotifier for MockHaptics {
    fn light_impact(&self) -> HostResult<()> {
        self.impacts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable("Mock haptics failure".into()));
        }
        Ok(())
    }
}

/// Renderer that keeps every frame and animation update it receives
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    frames: Mutex<Vec<Frame>>,
    animation: Mutex<Vec<AnimationInputs>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.frames.lock().unwrap().last().cloned()
    }

    pub fn animation_updates(&self) -> Vec<AnimationInputs> {
        self.animation.lock().unwrap().clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, frame: &Frame) -> HostResult<()> {
        self.frames.lock().unwrap().push(frame.clone());
        Ok(())
    }
}

impl AnimationDriver for RecordingRenderer {
    fn update(&self, inputs: &AnimationInputs) -> HostResult<()> {
        self.animation.lock().unwrap().push(*inputs);
        Ok(())
    }
}
