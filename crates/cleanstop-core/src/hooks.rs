//! Host-facing step hook traits and a reference run controller

use crate::Result;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Stop-request capability exposed by a host training loop
///
/// `request_stop` must be idempotent: hooks may call it after every step
/// once they want the loop to end.
pub trait RunContext {
    /// Ask the host not to begin another step after the current one
    fn request_stop(&self) -> Result<()>;

    /// Whether a stop has been requested so far
    fn stop_requested(&self) -> bool;
}

/// Callbacks a host invokes around every training step
pub trait StepHook {
    /// Called immediately before a step executes
    fn before_step(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called immediately after a step executes
    fn after_step(&mut self, _ctx: &dyn RunContext) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    stop: AtomicBool,
    requests: AtomicU64,
}

/// Cloneable, thread-safe run controller
///
/// Clones share state, so a host can keep one handle for its loop condition
/// and hand another to hooks.
#[derive(Debug, Clone, Default)]
pub struct RunController {
    state: Arc<ControllerState>,
}

impl RunController {
    /// Create a controller with no stop requested
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the loop should end after the current step
    pub fn should_stop(&self) -> bool {
        self.state.stop.load(Ordering::SeqCst)
    }

    /// Number of times `request_stop` has been called
    pub fn stop_requests(&self) -> u64 {
        self.state.requests.load(Ordering::SeqCst)
    }
}

impl RunContext for RunController {
    fn request_stop(&self) -> Result<()> {
        let count = self.state.requests.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.state.stop.swap(true, Ordering::SeqCst) {
            info!("Stop requested; loop will end after the current step");
        } else {
            debug!(requests = count, "Repeated stop request");
        }
        Ok(())
    }

    fn stop_requested(&self) -> bool {
        self.should_stop()
    }
}
