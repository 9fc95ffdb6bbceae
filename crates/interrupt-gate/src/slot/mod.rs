//! The process-wide interrupt slot and its implementations
//!
//! A slot is the single place where an interrupt gate reads and writes the
//! interrupt disposition. The gate never touches the disposition directly.

#[cfg(unix)]
mod posix;
mod manual;

#[cfg(unix)]
pub use posix::PosixSlot;
pub use manual::{Delivery, ManualSlot};

use cleanstop_core::Result;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Monotonic stop flag shared between a gate and its signal path
///
/// Raising the flag is a single lock-free atomic write, so it is safe from
/// inside a signal handler.
#[derive(Debug, Default)]
pub struct StopFlag {
    raised: AtomicBool,
}

impl StopFlag {
    /// Create a lowered flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag, returning true if this call raised it
    pub fn raise(&self) -> bool {
        !self.raised.swap(true, Ordering::SeqCst)
    }

    /// Whether the flag has been raised
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// Who currently handles the interrupt signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
    /// Platform default action (terminate the process for SIGINT)
    Default,

    /// Signal is ignored
    Ignore,

    /// An interrupt gate handler
    Gate,

    /// Some other handler, identified by an opaque token
    Foreign(usize),
}

/// Exclusive access to the interrupt disposition of the process
pub trait InterruptSlot: Send + Sync {
    /// Name of the intercepted signal, for logs and errors
    fn signal_name(&self) -> &'static str;

    /// Route interrupts to `flag`, capturing the displaced handler.
    ///
    /// The slot restores the displaced handler itself the first time an
    /// interrupt arrives.
    fn arm(&self, flag: std::sync::Arc<StopFlag>) -> Result<()>;

    /// Release the slot. Restores the displaced handler if no interrupt has
    /// done so already and reports whether this call restored it.
    fn disarm(&self) -> Result<bool>;

    /// Report the currently active disposition
    fn disposition(&self) -> Result<Disposition>;

    /// Leave the gate handler installed after its owner goes away
    fn abandon(&self) {}
}
